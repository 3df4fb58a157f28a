use anyhow::Result;
use bpaf::Bpaf;
use pawmatch_client::types::Dog;
use pawmatch_sdk::models::favorites::FavoriteSet;
use pawmatch_sdk::models::filter::FilterCriteria;
use pawmatch_sdk::pawmatch::Pawmatch;
use serde::Serialize;
use tracing::instrument;

use super::open_browse;
use crate::utils::message;
use crate::utils::render::{DisplayCriteria, DisplayDog};

/// Show the current filters, favorites and match; nothing is sent to the backend
#[derive(Debug, Bpaf, Clone)]
pub struct Status {
    /// Print the status as JSON
    #[bpaf(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    logged_in: bool,
    criteria: FilterCriteria,
    favorites: FavoriteSet,
    match_result: Option<Dog>,
}

impl Status {
    #[instrument(name = "status", skip_all)]
    pub fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        let browse = open_browse(&pawmatch)?;
        let report = StatusReport {
            logged_in: pawmatch.session.is_authenticated(),
            criteria: browse.criteria(),
            favorites: browse.favorites(),
            match_result: browse.match_result(),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        if !report.logged_in {
            message::warning("Not logged in");
        }
        println!("{}", DisplayCriteria(&report.criteria));

        // favorites are only known by ID unless they are on the last shown page
        let shown = browse.current_page().map(|page| page.dogs).unwrap_or_default();
        if report.favorites.is_empty() {
            println!("Favorites: none");
        } else {
            println!("Favorites:");
            for id in report.favorites.iter() {
                match shown.iter().find(|dog| &dog.id == id) {
                    Some(dog) => println!("  {}", DisplayDog::new(dog, true)),
                    None => println!("  [{id}]"),
                }
            }
        }

        match &report.match_result {
            Some(dog) => println!("Match:\n  {}", DisplayDog::new(dog, true)),
            None => println!("Match: none"),
        }
        Ok(())
    }
}
