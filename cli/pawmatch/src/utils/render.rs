//! Rendering of dog cards, pages and the match result.
//!
//! Human readable output goes to stdout, `--json` output replaces it.

use std::fmt::{self, Display};

use anyhow::Result;
use pawmatch_client::types::Dog;
use pawmatch_sdk::models::favorites::FavoriteSet;
use pawmatch_sdk::models::filter::FilterCriteria;
use pawmatch_sdk::models::search::{CycleOutcome, SearchPage};
use serde::Serialize;
use tracing::debug;

use crate::utils::errors::AlreadyReported;
use crate::utils::message;

const FAVORITE: char = '★';
const NOT_FAVORITE: char = '☆';

pub struct DisplayDog<'a> {
    dog: &'a Dog,
    favorite: bool,
}

impl<'a> DisplayDog<'a> {
    pub fn new(dog: &'a Dog, favorite: bool) -> Self {
        Self { dog, favorite }
    }
}

impl Display for DisplayDog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Dog {
            id,
            name,
            age,
            zip_code,
            breed,
            ..
        } = self.dog;
        let marker = if self.favorite { FAVORITE } else { NOT_FAVORITE };
        let years = if *age == 1 { "year" } else { "years" };
        write!(
            f,
            "{marker} {name:<16} {breed:<24} {age:>2} {years:<5}  ZIP {zip_code}  [{id}]"
        )
    }
}

pub struct DisplayPage<'a> {
    page: &'a SearchPage,
    favorites: &'a FavoriteSet,
}

impl<'a> DisplayPage<'a> {
    pub fn new(page: &'a SearchPage, favorites: &'a FavoriteSet) -> Self {
        Self { page, favorites }
    }
}

impl Display for DisplayPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.page.dogs.is_empty() {
            return write!(f, "No dogs found.");
        }

        for dog in &self.page.dogs {
            writeln!(f, "{}", DisplayDog::new(dog, self.favorites.contains(&dog.id)))?;
        }
        write!(
            f,
            "\nPage {} of {} ({} dogs)",
            self.page.page,
            self.page.page_count(),
            self.page.total
        )
    }
}

pub struct DisplayCriteria<'a>(pub &'a FilterCriteria);

impl Display for DisplayCriteria<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let criteria = self.0;
        let join = |items: &std::collections::BTreeSet<String>| {
            if items.is_empty() {
                "any".to_string()
            } else {
                items.iter().cloned().collect::<Vec<_>>().join(", ")
            }
        };
        let (age_min, age_max) = criteria.age_range();

        writeln!(f, "Breeds:    {}", join(criteria.breeds()))?;
        writeln!(f, "Ages:      {age_min} to {age_max}")?;
        writeln!(f, "ZIP codes: {}", join(criteria.zip_codes()))?;
        writeln!(f, "Sort:      {}", criteria.sort())?;
        write!(f, "Page:      {}", criteria.page())
    }
}

#[derive(Serialize)]
struct JsonDog<'a> {
    #[serde(flatten)]
    dog: &'a Dog,
    favorite: bool,
}

#[derive(Serialize)]
struct JsonPage<'a> {
    dogs: Vec<JsonDog<'a>>,
    total: u64,
    page: u32,
    pages: u64,
}

pub fn render_page(page: &SearchPage, favorites: &FavoriteSet, json: bool) -> Result<()> {
    if json {
        let dogs = page
            .dogs
            .iter()
            .map(|dog| JsonDog {
                dog,
                favorite: favorites.contains(&dog.id),
            })
            .collect();
        let json_page = JsonPage {
            dogs,
            total: page.total,
            page: page.page,
            pages: page.page_count(),
        };
        println!("{}", serde_json::to_string_pretty(&json_page)?);
    } else {
        println!("{}", DisplayPage::new(page, favorites));
    }
    Ok(())
}

/// Render the result of a search cycle.
///
/// A failed search shows the empty state before the error is returned.
pub fn render_cycle(outcome: CycleOutcome, favorites: &FavoriteSet, json: bool) -> Result<()> {
    match outcome {
        CycleOutcome::Ready(page) => render_page(&page, favorites, json),
        CycleOutcome::Failed(e) => {
            if !json {
                message::plain("No dogs found.");
            }
            Err(e.into())
        },
        CycleOutcome::Unchanged | CycleOutcome::Stale => {
            debug!(?outcome, "nothing to render");
            Ok(())
        },
    }
}

pub fn render_match(dog: &Dog, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(dog)?);
    } else {
        println!("Your match:\n{}\nPhoto: {}", DisplayDog::new(dog, true), dog.img);
    }
    Ok(())
}

/// Turn a failure that was shown through a notification into an exit status.
pub fn reported<T>(result: Result<T, impl std::error::Error>) -> Result<T> {
    result.map_err(|e| {
        debug!(error = %e, "failure was already reported");
        AlreadyReported.into()
    })
}
