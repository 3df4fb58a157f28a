use anyhow::{Result, bail};
use bpaf::Bpaf;
use pawmatch_client::types::{SortDirection, SortField};
use pawmatch_sdk::models::filter::{FilterCriteria, FilterEdit};
use pawmatch_sdk::pawmatch::Pawmatch;
use tracing::{debug, instrument};

use super::{ensure_logged_in, open_browse, search_or_refresh};
use crate::utils::render::render_cycle;

#[derive(Debug, Clone, Copy, Bpaf)]
pub enum Direction {
    /// Sort in ascending order
    #[bpaf(long("asc"))]
    Asc,
    /// Sort in descending order
    #[bpaf(long("desc"))]
    Desc,
}

impl From<Direction> for SortDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => SortDirection::Asc,
            Direction::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, Bpaf)]
pub enum Navigation {
    Page(
        /// Go to a page of the results
        #[bpaf(long("page"), argument("page"))]
        u32,
    ),
    /// Go to the next page
    #[bpaf(long("next"))]
    Next,
    /// Go to the previous page
    #[bpaf(long("prev"))]
    Prev,
}

/// Change filters, sorting or page, then show the current page of dogs.
///
/// Filters not mentioned are kept from the previous search.
/// Any change other than the page starts over at page 1.
#[derive(Debug, Bpaf, Clone, Default)]
pub struct Search {
    /// Show dogs of this breed, can be repeated
    #[bpaf(long("breed"), argument("breed"), many)]
    breeds: Vec<String>,

    /// Stop showing dogs of this breed, can be repeated
    #[bpaf(long("remove-breed"), argument("breed"), many)]
    remove_breeds: Vec<String>,

    /// Show dogs of every breed
    #[bpaf(long("any-breed"))]
    any_breed: bool,

    /// Youngest age in years
    #[bpaf(long("age-min"), argument("years"))]
    age_min: Option<u8>,

    /// Oldest age in years
    #[bpaf(long("age-max"), argument("years"))]
    age_max: Option<u8>,

    /// Sort by breed, name or age
    #[bpaf(long("sort-by"), argument("field"))]
    sort_by: Option<SortField>,

    #[bpaf(external(direction), optional)]
    direction: Option<Direction>,

    #[bpaf(external(navigation), optional)]
    navigation: Option<Navigation>,

    /// Print the page as JSON
    #[bpaf(long)]
    json: bool,
}

impl Search {
    #[cfg(test)]
    pub(crate) fn parse_for_test(args: &[&str]) -> Self {
        use bpaf::Parser;
        search().to_options().run_inner(args).unwrap()
    }

    #[instrument(name = "search", skip_all)]
    pub async fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        ensure_logged_in(&pawmatch)?;

        let browse = open_browse(&pawmatch)?;
        let page_count = browse.current_page().map(|page| page.page_count());
        let edits = self.edits(&browse.criteria(), page_count)?;
        debug!(?edits, "applying search edits");

        let outcome = browse.apply_all(edits).await?;
        let outcome = search_or_refresh(&browse, outcome).await;
        pawmatch.save_browse(&browse)?;

        render_cycle(outcome, &browse.favorites(), self.json)
    }

    /// Translate the arguments into edits of `criteria`.
    ///
    /// Page navigation comes last so an explicit page survives filter changes.
    fn edits(&self, criteria: &FilterCriteria, page_count: Option<u64>) -> Result<Vec<FilterEdit>> {
        let mut edits = Vec::new();

        if self.any_breed {
            edits.push(FilterEdit::SetBreeds(Default::default()));
        }
        edits.extend(
            self.breeds
                .iter()
                .map(|breed| breed.trim())
                .filter(|breed| !breed.is_empty())
                .map(|breed| FilterEdit::AddBreed(breed.to_string())),
        );
        edits.extend(
            self.remove_breeds
                .iter()
                .map(|breed| FilterEdit::RemoveBreed(breed.trim().to_string())),
        );

        if self.age_min.is_some() || self.age_max.is_some() {
            let (min, max) = criteria.age_range();
            edits.push(FilterEdit::SetAgeRange {
                min: self.age_min.unwrap_or(min),
                max: self.age_max.unwrap_or(max),
            });
        }

        if let Some(field) = self.sort_by {
            edits.push(FilterEdit::SetSortField(field));
        }
        if let Some(direction) = self.direction {
            edits.push(FilterEdit::SetSortDirection(direction.into()));
        }

        match self.navigation {
            None => {},
            Some(Navigation::Page(page)) => edits.push(FilterEdit::SetPage(page)),
            Some(Navigation::Next) => {
                let page = criteria.page();
                let at_end = page_count.is_some_and(|count| u64::from(page) >= count);
                let Some(next) = page.checked_add(1).filter(|_| !at_end) else {
                    bail!("already on the last page");
                };
                edits.push(FilterEdit::SetPage(next));
            },
            Some(Navigation::Prev) => {
                let page = criteria.page();
                if page <= 1 {
                    bail!("already on the first page");
                }
                edits.push(FilterEdit::SetPage(page - 1));
            },
        }

        Ok(edits)
    }
}

#[cfg(test)]
mod tests {
    use pawmatch_client::types::Dog;
    use pawmatch_client::{ClientError, StatusCode};
    use pawmatch_sdk::models::browse::BrowseSnapshot;
    use pawmatch_sdk::models::filter::{FilterError, MAX_PAGE};
    use pawmatch_sdk::providers::mock::{Endpoint, MockClient};
    use pawmatch_test_utils::poodles;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::commands::test_helpers::{mock_client, pawmatch_instance, share};
    use crate::utils::errors::NotLoggedIn;
    use crate::utils::message::history::History;

    fn shown_names(pawmatch: &Pawmatch) -> Vec<String> {
        let snapshot = BrowseSnapshot::read(pawmatch.browse_path()).unwrap().unwrap();
        snapshot
            .page
            .unwrap()
            .dogs
            .into_iter()
            .map(|Dog { name, .. }| name)
            .collect()
    }

    async fn run(pawmatch: &Pawmatch, search: Search) -> Result<()> {
        search.handle(share(pawmatch)).await
    }

    #[tokio::test]
    async fn breed_filter() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        run(&pawmatch, Search {
            breeds: vec!["Pug".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(shown_names(&pawmatch), ["Mochi", "Ziggy"]);
    }

    #[tokio::test]
    async fn filters_accumulate_across_searches() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        run(&pawmatch, Search {
            age_max: Some(4),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(shown_names(&pawmatch), ["Biscuit", "Mochi", "Ziggy"]);

        run(&pawmatch, Search {
            breeds: vec!["Beagle".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(shown_names(&pawmatch), ["Biscuit"]);

        run(&pawmatch, Search {
            any_breed: true,
            age_max: Some(20),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(shown_names(&pawmatch).len(), 5);
    }

    #[tokio::test]
    async fn sort_by_age_descending() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        run(&pawmatch, Search {
            sort_by: Some(SortField::Age),
            direction: Some(Direction::Desc),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(shown_names(&pawmatch), ["Nala", "Rex", "Mochi", "Biscuit", "Ziggy"]);
    }

    #[tokio::test]
    async fn invalid_age_range_changes_nothing() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        let err = run(&pawmatch, Search {
            age_min: Some(9),
            age_max: Some(3),
            ..Default::default()
        })
        .await
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<FilterError>(),
            Some(&FilterError::InvertedAgeRange { min: 9, max: 3 })
        );
        assert_eq!(mock_client(&pawmatch).calls(Endpoint::Search), 0);
        assert!(!pawmatch.browse_path().exists());
    }

    #[tokio::test]
    async fn out_of_range_page_changes_nothing() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        let err = run(&pawmatch, Search {
            navigation: Some(Navigation::Page(u32::MAX)),
            ..Default::default()
        })
        .await
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<FilterError>(),
            Some(&FilterError::PageOutOfRange(u32::MAX))
        );
        assert_eq!(mock_client(&pawmatch).calls(Endpoint::Search), 0);
        assert!(!pawmatch.browse_path().exists());
    }

    #[tokio::test]
    async fn paging_through_results() {
        let (mut pawmatch, _dir) = pawmatch_instance(true);
        pawmatch.client = std::sync::Arc::new(MockClient::with_dogs(poodles(15)).into());

        run(&pawmatch, Search::default()).await.unwrap();
        assert_eq!(shown_names(&pawmatch).len(), 12);

        run(&pawmatch, Search {
            navigation: Some(Navigation::Next),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(shown_names(&pawmatch).len(), 3);

        let err = run(&pawmatch, Search {
            navigation: Some(Navigation::Next),
            ..Default::default()
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "already on the last page");

        run(&pawmatch, Search {
            navigation: Some(Navigation::Prev),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(shown_names(&pawmatch).len(), 12);
    }

    #[tokio::test]
    async fn failed_search_shows_empty_state() {
        let (pawmatch, _dir) = pawmatch_instance(true);
        mock_client(&pawmatch).push_failure(Endpoint::Search, StatusCode::SERVICE_UNAVAILABLE);
        let history = History::global();
        history.clear();

        let err = run(&pawmatch, Search::default()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::Server(_))
        ));
        assert_eq!(history.messages(), ["No dogs found."]);
    }

    #[tokio::test]
    async fn search_requires_login() {
        let (pawmatch, _dir) = pawmatch_instance(false);
        let err = run(&pawmatch, Search::default()).await.unwrap_err();
        assert!(err.is::<NotLoggedIn>());
        assert_eq!(mock_client(&pawmatch).calls(Endpoint::Search), 0);
    }

    #[test]
    fn parses_arguments() {
        let search = Search::parse_for_test(&[
            "--breed",
            "Pug",
            "--breed",
            "Beagle",
            "--age-min",
            "2",
            "--sort-by",
            "age",
            "--desc",
            "--page",
            "3",
        ]);
        assert_eq!(search.breeds, ["Pug", "Beagle"]);
        assert_eq!(search.age_min, Some(2));
        assert_eq!(search.sort_by, Some(SortField::Age));
        assert!(matches!(search.direction, Some(Direction::Desc)));
        assert!(matches!(search.navigation, Some(Navigation::Page(3))));
    }

    #[test]
    fn unknown_sort_field_is_a_parse_error() {
        use bpaf::Parser;
        let result = search()
            .to_options()
            .run_inner(["--sort-by", "weight"].as_slice());
        assert!(result.is_err());
    }

    #[test]
    fn only_max_age_keeps_current_min() {
        let mut criteria = FilterCriteria::default();
        criteria
            .apply(FilterEdit::SetAgeRange { min: 3, max: 10 })
            .unwrap();

        let edits = Search {
            age_max: Some(6),
            ..Default::default()
        }
        .edits(&criteria, None)
        .unwrap();
        assert_eq!(edits, [FilterEdit::SetAgeRange { min: 3, max: 6 }]);
    }

    #[test]
    fn no_previous_page_before_first() {
        let err = Search {
            navigation: Some(Navigation::Prev),
            ..Default::default()
        }
        .edits(&FilterCriteria::default(), None)
        .unwrap_err();
        assert_eq!(err.to_string(), "already on the first page");
    }

    #[test]
    fn next_page_stops_at_last_possible_page() {
        let mut criteria = FilterCriteria::default();
        criteria.apply(FilterEdit::SetPage(MAX_PAGE)).unwrap();

        let edits = Search {
            navigation: Some(Navigation::Next),
            ..Default::default()
        }
        .edits(&criteria, None)
        .unwrap();
        assert_eq!(
            criteria.apply_all(edits),
            Err(FilterError::PageOutOfRange(MAX_PAGE + 1))
        );
        assert_eq!(criteria.page(), MAX_PAGE);
    }
}
