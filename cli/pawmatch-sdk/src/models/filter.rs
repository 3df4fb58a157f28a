//! Search criteria and the edits the user can make to them.

use std::collections::BTreeSet;

use pawmatch_client::types::{DogSearchQuery, PAGE_SIZE, Sort, SortDirection, SortField};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oldest age (in years) a search can ask for.
pub const MAX_AGE: u8 = 20;

/// Last page whose result offset still fits the query.
pub const MAX_PAGE: u32 = u32::MAX / PAGE_SIZE + 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("age {0} is out of range, ages go from 0 to {MAX_AGE}")]
    AgeOutOfRange(u8),
    #[error("minimum age {min} is greater than maximum age {max}")]
    InvertedAgeRange { min: u8, max: u8 },
    #[error("pages start at 1")]
    InvalidPage,
    #[error("page {0} is out of range, the last possible page is {MAX_PAGE}")]
    PageOutOfRange(u32),
}

fn check_page(page: u32) -> Result<(), FilterError> {
    match page {
        0 => Err(FilterError::InvalidPage),
        page if page > MAX_PAGE => Err(FilterError::PageOutOfRange(page)),
        _ => Ok(()),
    }
}

fn check_age_range(min: u8, max: u8) -> Result<(), FilterError> {
    for age in [min, max] {
        if age > MAX_AGE {
            return Err(FilterError::AgeOutOfRange(age));
        }
    }
    if min > max {
        return Err(FilterError::InvertedAgeRange { min, max });
    }
    Ok(())
}

/// A single user intent that modifies [FilterCriteria].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    SetBreeds(BTreeSet<String>),
    AddBreed(String),
    RemoveBreed(String),
    SetAgeRange { min: u8, max: u8 },
    SetZipCodes(BTreeSet<String>),
    SetSortField(SortField),
    SetSortDirection(SortDirection),
    SetPage(u32),
    /// Restore the default criteria.
    Reset,
}

/// The current search criteria.
///
/// Invariants, upheld by [FilterCriteria::apply]:
/// - `0 <= age_min <= age_max <= MAX_AGE`
/// - `1 <= page <= MAX_PAGE`
/// - `page` is reset to 1 whenever any other field changes
///
/// Deserializing checks the same bounds,
/// so restored criteria always produce a valid query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCriteria")]
pub struct FilterCriteria {
    breeds: BTreeSet<String>,
    age_min: u8,
    age_max: u8,
    zip_codes: BTreeSet<String>,
    sort: Sort,
    page: u32,
}

/// [FilterCriteria] as read from disk, before validation.
#[derive(Deserialize)]
struct StoredCriteria {
    breeds: BTreeSet<String>,
    age_min: u8,
    age_max: u8,
    zip_codes: BTreeSet<String>,
    sort: Sort,
    page: u32,
}

impl TryFrom<StoredCriteria> for FilterCriteria {
    type Error = FilterError;

    fn try_from(stored: StoredCriteria) -> Result<Self, Self::Error> {
        check_age_range(stored.age_min, stored.age_max)?;
        check_page(stored.page)?;
        Ok(FilterCriteria {
            breeds: stored.breeds,
            age_min: stored.age_min,
            age_max: stored.age_max,
            zip_codes: stored.zip_codes,
            sort: stored.sort,
            page: stored.page,
        })
    }
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            breeds: BTreeSet::new(),
            age_min: 0,
            age_max: MAX_AGE,
            zip_codes: BTreeSet::new(),
            sort: Sort::default(),
            page: 1,
        }
    }
}

impl FilterCriteria {
    pub fn breeds(&self) -> &BTreeSet<String> {
        &self.breeds
    }

    pub fn age_range(&self) -> (u8, u8) {
        (self.age_min, self.age_max)
    }

    pub fn zip_codes(&self) -> &BTreeSet<String> {
        &self.zip_codes
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Apply `edit`, returning whether the criteria changed.
    ///
    /// An invalid edit leaves the criteria untouched.
    pub fn apply(&mut self, edit: FilterEdit) -> Result<bool, FilterError> {
        let mut next = self.clone();
        match edit {
            FilterEdit::SetPage(page) => {
                check_page(page)?;
                next.page = page;
            },
            FilterEdit::SetBreeds(breeds) => next.breeds = breeds,
            FilterEdit::AddBreed(breed) => {
                next.breeds.insert(breed);
            },
            FilterEdit::RemoveBreed(breed) => {
                next.breeds.remove(&breed);
            },
            FilterEdit::SetAgeRange { min, max } => {
                check_age_range(min, max)?;
                next.age_min = min;
                next.age_max = max;
            },
            FilterEdit::SetZipCodes(zip_codes) => next.zip_codes = zip_codes,
            FilterEdit::SetSortField(field) => next.sort.field = field,
            FilterEdit::SetSortDirection(direction) => next.sort.direction = direction,
            FilterEdit::Reset => next = FilterCriteria::default(),
        }
        Ok(self.commit(next))
    }

    /// Apply `edits` in order, all or nothing.
    pub fn apply_all(
        &mut self,
        edits: impl IntoIterator<Item = FilterEdit>,
    ) -> Result<bool, FilterError> {
        let mut next = self.clone();
        for edit in edits {
            next.apply(edit)?;
        }
        let changed = next != *self;
        *self = next;
        Ok(changed)
    }

    /// Replace the ZIP-code filter, returning whether it changed.
    pub fn set_zip_codes(&mut self, zip_codes: BTreeSet<String>) -> bool {
        let next = FilterCriteria {
            zip_codes,
            ..self.clone()
        };
        self.commit(next)
    }

    /// Restore the defaults, returning whether anything changed.
    pub fn reset(&mut self) -> bool {
        self.commit(FilterCriteria::default())
    }

    fn commit(&mut self, mut next: FilterCriteria) -> bool {
        if next.page == self.page && next != *self {
            next.page = 1;
        }
        let changed = next != *self;
        *self = next;
        changed
    }

    /// The dog search for the current page.
    pub fn to_query(&self) -> DogSearchQuery {
        DogSearchQuery {
            breeds: self.breeds.clone(),
            zip_codes: self.zip_codes.clone(),
            age_min: self.age_min,
            age_max: self.age_max,
            size: PAGE_SIZE,
            from: (self.page - 1) * PAGE_SIZE,
            sort: self.sort,
        }
    }
}

/// Number of pages needed to show `total` results; never less than one.
pub fn page_count(total: u64) -> u64 {
    total.max(1).div_ceil(u64::from(PAGE_SIZE))
}
