//! The dog catalog client used by the SDK.
//!
//! [Client] is either the HTTP client talking to the adoption API
//! or a [MockClient] serving a fixture catalog.

use enum_dispatch::enum_dispatch;
use pawmatch_client::types::{
    Dog,
    DogId,
    DogSearchQuery,
    DogSearchResult,
    LocationSearchRequest,
    LocationSearchResult,
    SessionToken,
};
use pawmatch_client::{ClientError, DogClient, LoginError, MatchError};
use tracing::{debug, warn};

pub use super::mock::{MockCatalog, MockClient, MockDataError};

/// Setting this variable to the path of a JSON [MockCatalog]
/// makes the CLI use a [MockClient] instead of the HTTP API.
pub const PAWMATCH_MOCK_DATA_VAR: &str = "_PAWMATCH_MOCK_DATA";

/// Either a client for the adoption API,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Http(DogClient),
    Mock(MockClient),
}

/// The dog catalog operations the SDK builds on.
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// List all known breed names.
    async fn list_breeds(&self) -> Result<Vec<String>, ClientError>;

    /// Search for the IDs of dogs matching `query`.
    async fn search_dog_ids(&self, query: &DogSearchQuery) -> Result<DogSearchResult, ClientError>;

    /// Fetch full records for a batch of dog IDs.
    ///
    /// The order of the returned dogs is not guaranteed to match `ids`.
    async fn fetch_dogs(&self, ids: &[DogId]) -> Result<Vec<Dog>, ClientError>;

    /// Search for locations, failing on any error.
    ///
    /// Consumers should prefer [ClientTrait::search_locations].
    async fn try_search_locations(
        &self,
        request: &LocationSearchRequest,
    ) -> Result<LocationSearchResult, ClientError>;

    /// Search for locations.
    ///
    /// A failed search yields an empty result,
    /// so a broken location lookup never blocks browsing dogs.
    async fn search_locations(&self, request: &LocationSearchRequest) -> LocationSearchResult {
        match self.try_search_locations(request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "location search failed, using empty result");
                LocationSearchResult::default()
            },
        }
    }

    /// Ask the backend to pick one dog among `ids`.
    ///
    /// Returns `None` if the backend did not choose a dog.
    async fn resolve_match(&self, ids: &[DogId]) -> Result<Option<DogId>, ClientError>;

    /// Pick a match among `ids` and fetch its full record.
    async fn match_dogs(&self, ids: &[DogId]) -> Result<Dog, MatchError> {
        if ids.is_empty() {
            return Err(ClientError::Validation("no dogs to match from".to_string()).into());
        }

        let Some(matched) = self.resolve_match(ids).await? else {
            return Err(MatchError::NoMatchFound);
        };
        debug!(%matched, "backend picked a match");

        self.fetch_dogs(std::slice::from_ref(&matched))
            .await?
            .into_iter()
            .find(|dog| dog.id == matched)
            .ok_or(MatchError::NoMatchFound)
    }

    /// Claim an identity and receive a session token.
    async fn login(&self, email: &str, name: &str) -> Result<SessionToken, LoginError>;
}

impl ClientTrait for DogClient {
    async fn list_breeds(&self) -> Result<Vec<String>, ClientError> {
        DogClient::list_breeds(self).await
    }

    async fn search_dog_ids(&self, query: &DogSearchQuery) -> Result<DogSearchResult, ClientError> {
        DogClient::search_dog_ids(self, query).await
    }

    async fn fetch_dogs(&self, ids: &[DogId]) -> Result<Vec<Dog>, ClientError> {
        DogClient::fetch_dogs(self, ids).await
    }

    async fn try_search_locations(
        &self,
        request: &LocationSearchRequest,
    ) -> Result<LocationSearchResult, ClientError> {
        DogClient::try_search_locations(self, request).await
    }

    async fn resolve_match(&self, ids: &[DogId]) -> Result<Option<DogId>, ClientError> {
        DogClient::resolve_match(self, ids).await
    }

    async fn login(&self, email: &str, name: &str) -> Result<SessionToken, LoginError> {
        DogClient::login(self, email, name).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use httpmock::prelude::*;
    use pawmatch_client::{DogClientConfig, NoCredentials};
    use pawmatch_test_utils::mixed_shelter;
    use serde_json::json;

    use super::*;

    fn http_client(server: &MockServer) -> Client {
        let config = DogClientConfig {
            base_url: server.base_url(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
        };
        Client::from(DogClient::new(config, Arc::new(NoCredentials)).unwrap())
    }

    fn dog(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "img": format!("https://img.example/{id}.jpg"),
            "name": format!("Dog {id}"),
            "age": 3,
            "zip_code": "03060",
            "breed": "Poodle",
        })
    }

    #[tokio::test]
    async fn http_variant_calls_the_api() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/dogs/breeds");
                then.status(200).json_body(json!(["Akita"]));
            })
            .await;

        let client = http_client(&server);
        assert_eq!(client.list_breeds().await.unwrap(), vec!["Akita"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn mock_variant_serves_the_catalog() {
        let client = Client::from(MockClient::with_dogs(mixed_shelter()));
        assert_eq!(client.list_breeds().await.unwrap(), vec!["Beagle", "Boxer", "Pug"]);
    }

    #[tokio::test]
    async fn match_fetches_details_of_matched_dog() {
        let server = MockServer::start_async().await;
        let match_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/dogs/match")
                .json_body(json!(["1", "2", "3"]));
            then.status(200).json_body(json!({ "match": "2" }));
        });
        let details_mock = server.mock(|when, then| {
            when.method(POST).path("/dogs").json_body(json!(["2"]));
            then.status(200).json_body(json!([dog("2")]));
        });

        let ids = ["1", "2", "3"].map(String::from);
        let matched = http_client(&server).match_dogs(&ids).await.unwrap();
        assert_eq!(matched.id, "2");
        assert_eq!(matched.name, "Dog 2");
        match_mock.assert();
        details_mock.assert();
    }

    #[tokio::test]
    async fn match_without_result_is_no_match_found() {
        let server = MockServer::start_async().await;
        let match_mock = server.mock(|when, then| {
            when.method(POST).path("/dogs/match");
            then.status(200).json_body(json!({}));
        });
        let details_mock = server.mock(|when, then| {
            when.method(POST).path("/dogs");
            then.status(200).json_body(json!([]));
        });

        let result = http_client(&server).match_dogs(&["1".to_string()]).await;
        assert!(matches!(result, Err(MatchError::NoMatchFound)), "{result:?}");
        match_mock.assert();
        details_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn match_without_ids_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|_, then| {
            then.status(200).json_body(json!({ "match": "1" }));
        });

        let result = http_client(&server).match_dogs(&[]).await;
        assert!(
            matches!(result, Err(MatchError::Client(ClientError::Validation(_)))),
            "{result:?}"
        );
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn location_search_failure_degrades_to_empty() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|_, then| {
            then.status(500);
        });

        let request = LocationSearchRequest {
            city: Some("Nowhere".to_string()),
            states: None,
            geo_bounding_box: None,
            size: 25,
        };
        let client = http_client(&server);
        assert!(client.try_search_locations(&request).await.is_err());
        assert_eq!(
            client.search_locations(&request).await,
            LocationSearchResult::default()
        );
        mock.assert_hits(2);
    }
}
