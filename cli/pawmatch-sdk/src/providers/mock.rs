//! An in-memory implementation of [ClientTrait].
//!
//! The mock serves a fixture catalog of dogs and locations and implements
//! the search, paging and sorting semantics of the real backend.
//! Tests can additionally delay or fail individual calls per endpoint
//! and count how often each endpoint was hit.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::{fs, io};

use chrono::Utc;
use pawmatch_client::types::{
    Dog,
    DogId,
    DogSearchQuery,
    DogSearchResult,
    Location,
    LocationSearchRequest,
    LocationSearchResult,
    MAX_FETCH_BATCH,
    SessionToken,
    SortDirection,
    SortField,
};
use pawmatch_client::{ClientError, LoginError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::catalog::ClientTrait;

// Arc allows pushing delays and failures from outside the client,
// Mutex allows sharing across tasks
type MockField<T> = Arc<Mutex<T>>;

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the file pointed at by `_PAWMATCH_MOCK_DATA`
    #[error("failed to read mock catalog")]
    Read(#[source] io::Error),
    #[error("failed to parse mock catalog")]
    Parse(#[source] serde_json::Error),
}

/// Fixture data served by [MockClient].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockCatalog {
    #[serde(default)]
    pub dogs: Vec<Dog>,
    #[serde(default)]
    pub locations: Vec<Location>,
    /// The dog picked by a match request.
    ///
    /// A match only succeeds if this dog is among the submitted IDs.
    /// If unset the first submitted ID is picked.
    #[serde(default)]
    pub matched: Option<DogId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Endpoint {
    Breeds,
    Search,
    Fetch,
    Locations,
    Match,
    Login,
}

#[derive(Debug, Clone, Default)]
pub struct MockClient {
    pub catalog: MockField<MockCatalog>,
    delays: MockField<BTreeMap<Endpoint, VecDeque<Duration>>>,
    failures: MockField<BTreeMap<Endpoint, VecDeque<StatusCode>>>,
    calls: MockField<BTreeMap<Endpoint, usize>>,
}

impl MockClient {
    pub fn new(catalog: MockCatalog) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            ..Default::default()
        }
    }

    pub fn with_dogs(dogs: Vec<Dog>) -> Self {
        Self::new(MockCatalog {
            dogs,
            ..Default::default()
        })
    }

    /// Read a [MockCatalog] from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let contents = fs::read_to_string(path).map_err(MockDataError::Read)?;
        let catalog = serde_json::from_str(&contents).map_err(MockDataError::Parse)?;
        Ok(Self::new(catalog))
    }

    pub fn set_match(&self, matched: Option<DogId>) {
        self.catalog.lock().expect("couldn't acquire mock lock").matched = matched;
    }

    /// Delay the next call to `endpoint` by `delay`.
    pub fn push_delay(&self, endpoint: Endpoint, delay: Duration) {
        self.delays
            .lock()
            .expect("couldn't acquire mock lock")
            .entry(endpoint)
            .or_default()
            .push_back(delay);
    }

    /// Fail the next call to `endpoint` as if the backend responded with `status`.
    pub fn push_failure(&self, endpoint: Endpoint, status: StatusCode) {
        self.failures
            .lock()
            .expect("couldn't acquire mock lock")
            .entry(endpoint)
            .or_default()
            .push_back(status);
    }

    /// Number of calls made to `endpoint` so far.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .expect("couldn't acquire mock lock")
            .get(&endpoint)
            .copied()
            .unwrap_or_default()
    }

    /// Record a call, apply any pending delay and
    /// return the pending failure status, if any.
    async fn enter(&self, endpoint: Endpoint) -> Option<StatusCode> {
        *self
            .calls
            .lock()
            .expect("couldn't acquire mock lock")
            .entry(endpoint)
            .or_default() += 1;

        let delay = self
            .delays
            .lock()
            .expect("couldn't acquire mock lock")
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.failures
            .lock()
            .expect("couldn't acquire mock lock")
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
    }

    async fn enter_or_fail(&self, endpoint: Endpoint) -> Result<(), ClientError> {
        match self.enter(endpoint).await {
            Some(status) => Err(ClientError::from_status(status)),
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> MockCatalog {
        self.catalog.lock().expect("couldn't acquire mock lock").clone()
    }
}

fn compare_dogs(field: SortField, a: &Dog, b: &Dog) -> std::cmp::Ordering {
    let primary = match field {
        SortField::Breed => a.breed.cmp(&b.breed),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Age => a.age.cmp(&b.age),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn in_bounding_box(location: &Location, request: &LocationSearchRequest) -> bool {
    let Some(bbox) = &request.geo_bounding_box else {
        return true;
    };
    (bbox.bottom..=bbox.top).contains(&location.latitude)
        && (bbox.left..=bbox.right).contains(&location.longitude)
}

impl ClientTrait for MockClient {
    async fn list_breeds(&self) -> Result<Vec<String>, ClientError> {
        self.enter_or_fail(Endpoint::Breeds).await?;
        let breeds: BTreeSet<String> = self
            .snapshot()
            .dogs
            .into_iter()
            .map(|dog| dog.breed)
            .collect();
        Ok(breeds.into_iter().collect())
    }

    async fn search_dog_ids(&self, query: &DogSearchQuery) -> Result<DogSearchResult, ClientError> {
        if query.age_min > query.age_max {
            return Err(ClientError::Validation(format!(
                "minimum age {} is greater than maximum age {}",
                query.age_min, query.age_max
            )));
        }
        self.enter_or_fail(Endpoint::Search).await?;

        let mut matching: Vec<Dog> = self
            .snapshot()
            .dogs
            .into_iter()
            .filter(|dog| query.breeds.is_empty() || query.breeds.contains(&dog.breed))
            .filter(|dog| query.zip_codes.is_empty() || query.zip_codes.contains(&dog.zip_code))
            .filter(|dog| (u32::from(query.age_min)..=u32::from(query.age_max)).contains(&dog.age))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare_dogs(query.sort.field, a, b);
            match query.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let result_ids = matching
            .into_iter()
            .skip(query.from as usize)
            .take(query.size as usize)
            .map(|dog| dog.id)
            .collect();
        Ok(DogSearchResult {
            result_ids,
            total,
            next: None,
            prev: None,
        })
    }

    /// Returns the dogs in reverse order of `ids`,
    /// as the backend does not guarantee any order.
    async fn fetch_dogs(&self, ids: &[DogId]) -> Result<Vec<Dog>, ClientError> {
        if ids.len() > MAX_FETCH_BATCH {
            return Err(ClientError::Validation(format!(
                "cannot fetch more than {MAX_FETCH_BATCH} dogs at once, got {}",
                ids.len()
            )));
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.enter_or_fail(Endpoint::Fetch).await?;

        let catalog = self.snapshot();
        let dogs = ids
            .iter()
            .rev()
            .filter_map(|id| catalog.dogs.iter().find(|dog| &dog.id == id))
            .cloned()
            .collect();
        Ok(dogs)
    }

    async fn try_search_locations(
        &self,
        request: &LocationSearchRequest,
    ) -> Result<LocationSearchResult, ClientError> {
        self.enter_or_fail(Endpoint::Locations).await?;

        let matching: Vec<Location> = self
            .snapshot()
            .locations
            .into_iter()
            .filter(|location| {
                request
                    .city
                    .as_ref()
                    .is_none_or(|city| city.eq_ignore_ascii_case(&location.city))
            })
            .filter(|location| {
                request
                    .states
                    .as_ref()
                    .is_none_or(|states| states.contains(&location.state))
            })
            .filter(|location| in_bounding_box(location, request))
            .collect();

        let total = matching.len() as u64;
        Ok(LocationSearchResult {
            results: matching.into_iter().take(request.size as usize).collect(),
            total,
        })
    }

    async fn resolve_match(&self, ids: &[DogId]) -> Result<Option<DogId>, ClientError> {
        self.enter_or_fail(Endpoint::Match).await?;
        let matched = match self.snapshot().matched {
            Some(matched) => ids.contains(&matched).then_some(matched),
            None => ids.first().cloned(),
        };
        Ok(matched)
    }

    async fn login(&self, email: &str, name: &str) -> Result<SessionToken, LoginError> {
        if let Some(status) = self.enter(Endpoint::Login).await {
            return Err(LoginError::from_status(status));
        }
        debug!(%email, %name, "issuing mock session");
        Ok(SessionToken::new(format!("mock-session-{email}"), Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use pawmatch_client::types::{PAGE_SIZE, Sort};
    use pawmatch_test_utils::{catalog_json, mixed_shelter, nashua, new_york, poodles};
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn query() -> DogSearchQuery {
        DogSearchQuery {
            breeds: BTreeSet::new(),
            zip_codes: BTreeSet::new(),
            age_min: 0,
            age_max: 20,
            size: PAGE_SIZE,
            from: 0,
            sort: Sort::default(),
        }
    }

    #[tokio::test]
    async fn search_pages_through_results() {
        let client = MockClient::with_dogs(poodles(15));

        let first = client.search_dog_ids(&query()).await.unwrap();
        assert_eq!(first.total, 15);
        assert_eq!(first.result_ids.len(), 12);

        let second = client
            .search_dog_ids(&DogSearchQuery { from: 12, ..query() })
            .await
            .unwrap();
        assert_eq!(second.result_ids, vec!["poodle-13", "poodle-14", "poodle-15"]);
    }

    #[tokio::test]
    async fn search_filters_and_sorts() {
        let client = MockClient::with_dogs(mixed_shelter());
        let result = client
            .search_dog_ids(&DogSearchQuery {
                breeds: ["Beagle".to_string(), "Pug".to_string()].into(),
                sort: Sort {
                    field: SortField::Age,
                    direction: SortDirection::Desc,
                },
                ..query()
            })
            .await
            .unwrap();
        assert_eq!(result.result_ids, vec!["4", "3", "1", "5"]);

        let result = client
            .search_dog_ids(&DogSearchQuery {
                zip_codes: ["10001".to_string()].into(),
                age_max: 5,
                ..query()
            })
            .await
            .unwrap();
        assert_eq!(result.result_ids, vec!["3"]);
    }

    #[tokio::test]
    async fn fetch_reverses_order_and_skips_unknown_ids() {
        let client = MockClient::with_dogs(mixed_shelter());
        let ids = vec!["1".to_string(), "404".to_string(), "3".to_string()];
        let dogs = client.fetch_dogs(&ids).await.unwrap();
        let fetched: Vec<_> = dogs.iter().map(|dog| dog.id.as_str()).collect();
        assert_eq!(fetched, vec!["3", "1"]);
    }

    #[tokio::test]
    async fn pushed_failures_apply_once() {
        let client = MockClient::with_dogs(mixed_shelter());
        client.push_failure(Endpoint::Breeds, StatusCode::SERVICE_UNAVAILABLE);

        assert!(matches!(
            client.list_breeds().await,
            Err(ClientError::Server(StatusCode::SERVICE_UNAVAILABLE))
        ));
        assert_eq!(client.list_breeds().await.unwrap(), vec!["Beagle", "Boxer", "Pug"]);
        assert_eq!(client.calls(Endpoint::Breeds), 2);
    }

    #[tokio::test]
    async fn locations_filter_by_state() {
        let client = MockClient::new(MockCatalog {
            locations: vec![nashua(), new_york()],
            ..Default::default()
        });
        let result = client
            .search_locations(&LocationSearchRequest {
                city: None,
                states: Some(vec!["NH".to_string()]),
                geo_bounding_box: None,
                size: 25,
            })
            .await;
        assert_eq!(result.zip_codes().collect::<Vec<_>>(), vec!["03060"]);
        assert_eq!(result.total, 1);
    }

    #[tokio::test]
    async fn match_picks_configured_dog() {
        let client = MockClient::with_dogs(mixed_shelter());
        let ids: Vec<DogId> = ["1", "2", "3"].map(String::from).to_vec();

        assert_eq!(client.resolve_match(&ids).await.unwrap().as_deref(), Some("1"));

        client.set_match(Some("2".to_string()));
        assert_eq!(client.match_dogs(&ids).await.unwrap().name, "Rex");

        client.set_match(Some("5".to_string()));
        assert_eq!(client.resolve_match(&ids).await.unwrap(), None);
    }

    #[test]
    fn reads_catalog_from_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), catalog_json(&mixed_shelter(), &[nashua()])).unwrap();

        let client = MockClient::from_path(file.path()).unwrap();
        let catalog = client.snapshot();
        assert_eq!(catalog.dogs.len(), 5);
        assert_eq!(catalog.locations.len(), 1);
        assert_eq!(catalog.matched, None);
    }
}
