use std::collections::BTreeSet;

use ::proptest::prelude::*;
use pawmatch_client::types::{Sort, SortDirection, SortField};

pub fn sort_field() -> impl Strategy<Value = SortField> {
    prop_oneof![
        Just(SortField::Breed),
        Just(SortField::Name),
        Just(SortField::Age),
    ]
}

pub fn sort_direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

pub fn sort() -> impl Strategy<Value = Sort> {
    (sort_field(), sort_direction()).prop_map(|(field, direction)| Sort { field, direction })
}

/// A valid `(min, max)` age pair within `0..=20`.
pub fn age_range() -> impl Strategy<Value = (u8, u8)> {
    (0u8..=20, 0u8..=20).prop_map(|(a, b)| (a.min(b), a.max(b)))
}

pub fn breed() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Beagle".to_string()),
        Just("Boxer".to_string()),
        Just("Poodle".to_string()),
        Just("Pug".to_string()),
    ]
}

pub fn breeds() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(breed(), 0..4)
}

pub fn zip_codes() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[0-9]{5}", 0..4)
}
