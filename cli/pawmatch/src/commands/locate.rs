use anyhow::Result;
use bpaf::Bpaf;
use pawmatch_sdk::models::browse::LocateOutcome;
use pawmatch_sdk::models::location::{BoundingBox, LocationQuery};
use pawmatch_sdk::pawmatch::Pawmatch;
use tracing::instrument;

use super::{ensure_logged_in, open_browse, search_or_refresh};
use crate::utils::message;
use crate::utils::render::{render_cycle, reported};

/// Only show dogs near a city, in some states or within an area.
///
/// The ZIP codes of the matching locations replace the location filter.
/// If nothing matches, the filter is left as it was.
#[derive(Debug, Bpaf, Clone, Default)]
pub struct Locate {
    /// Name of a city
    #[bpaf(long, argument("city"))]
    city: Option<String>,

    /// Two letter state code, can be repeated
    #[bpaf(long("state"), argument("state"), many)]
    states: Vec<String>,

    /// Area given by its edges in degrees
    #[bpaf(long("bbox"), argument("top,left,bottom,right"))]
    bounding_box: Option<BoundingBox>,

    /// Print the page as JSON
    #[bpaf(long)]
    json: bool,
}

impl Locate {
    #[instrument(name = "locate", skip_all)]
    pub async fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        ensure_logged_in(&pawmatch)?;

        let browse = open_browse(&pawmatch)?;
        let query = LocationQuery {
            city: self.city,
            states: self.states.into_iter().collect(),
            bounding_box: self.bounding_box,
        };

        // failures are shown by the browse session's notifier
        match reported(browse.search_location(query).await)? {
            LocateOutcome::NoLocations => Ok(()),
            LocateOutcome::Searched { zip_codes, outcome } => {
                message::updated(format!("Showing dogs in {zip_codes} ZIP codes"));
                let outcome = search_or_refresh(&browse, outcome).await;
                pawmatch.save_browse(&browse)?;
                render_cycle(outcome, &browse.favorites(), self.json)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pawmatch_sdk::models::browse::BrowseSnapshot;
    use pawmatch_sdk::providers::mock::Endpoint;
    use pawmatch_test_utils::{nashua, new_york};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::commands::test_helpers::{mock_client, pawmatch_instance, share};
    use crate::utils::errors::AlreadyReported;
    use crate::utils::message::history::History;

    fn with_locations(pawmatch: &Pawmatch) {
        mock_client(pawmatch)
            .catalog
            .lock()
            .unwrap()
            .locations = vec![nashua(), new_york()];
    }

    #[tokio::test]
    async fn city_sets_zip_filter() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        with_locations(&pawmatch);

        Locate {
            city: Some("nashua".to_string()),
            ..Default::default()
        }
        .handle(share(&pawmatch))
        .await
        .unwrap();

        let snapshot = BrowseSnapshot::read(pawmatch.browse_path()).unwrap().unwrap();
        assert_eq!(
            snapshot.criteria.zip_codes(),
            &BTreeSet::from(["03060".to_string()])
        );
        let ids = snapshot.page.unwrap().ids();
        assert_eq!(ids, ["1", "2", "5"]);
    }

    #[tokio::test]
    async fn invalid_bounding_box_is_not_sent() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        let history = History::global();
        history.clear();

        let err = Locate {
            bounding_box: Some("10,0,20,5".parse().unwrap()),
            ..Default::default()
        }
        .handle(share(&pawmatch))
        .await
        .unwrap_err();

        assert!(err.is::<AlreadyReported>());
        assert_eq!(mock_client(&pawmatch).calls(Endpoint::Locations), 0);
        assert_eq!(history.messages().len(), 1);
        assert!(history.messages()[0].starts_with("❌ ERROR: "));
    }

    #[tokio::test]
    async fn no_locations_keeps_filter() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        with_locations(&pawmatch);

        Locate {
            states: vec!["ak".to_string()],
            ..Default::default()
        }
        .handle(share(&pawmatch))
        .await
        .unwrap();

        assert_eq!(mock_client(&pawmatch).calls(Endpoint::Search), 0);
        assert!(!pawmatch.browse_path().exists());
    }
}
