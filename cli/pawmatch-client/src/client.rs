//! HTTP client for the dog adoption API.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{self, HeaderMap};
use reqwest::{Method, RequestBuilder};
use tracing::{debug, instrument};

use crate::auth::{
    AuthStrategy,
    CredentialSource,
    SessionCookieAuthStrategy,
    session_token_from_headers,
};
use crate::config::{CONNECT_TIMEOUT, DogClientConfig, REQUEST_TIMEOUT};
use crate::error::{ClientError, LoginError, MapResponseExt};
use crate::types::*;

/// A client for the dog adoption API.
///
/// Handles:
/// - HTTP client configuration with timeouts
/// - Session cookie attachment on every request
/// - Status code classification into [ClientError]
pub struct DogClient {
    client: reqwest::Client,
    config: DogClientConfig,
    credentials: Arc<dyn CredentialSource>,
}

impl Debug for DogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DogClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl DogClient {
    /// Create a new client from configuration.
    ///
    /// `credentials` is consulted on every request.
    pub fn new(
        config: DogClientConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ClientError> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    /// Get the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Start a request to `path` with the current session credential attached.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        SessionCookieAuthStrategy::add_auth_headers(&mut headers, self.credentials.as_ref());
        self.client
            .request(method, self.config.endpoint(path))
            .headers(headers)
    }
}

// ---------------------------------------------------------------------------
// API operations
// ---------------------------------------------------------------------------

impl DogClient {
    /// List all known breed names.
    #[instrument(skip_all)]
    pub async fn list_breeds(&self) -> Result<Vec<String>, ClientError> {
        let response = self
            .request(Method::GET, "dogs/breeds")
            .send()
            .await
            .map_response_error()?;

        let breeds: Vec<String> = response.json().await.map_err(ClientError::InvalidResponse)?;
        debug!(n_breeds = breeds.len(), "received breeds");
        Ok(breeds)
    }

    /// Search for the IDs of dogs matching `query`.
    #[instrument(skip_all, fields(from = query.from, sort = %query.sort))]
    pub async fn search_dog_ids(&self, query: &DogSearchQuery) -> Result<DogSearchResult, ClientError> {
        if query.age_min > query.age_max {
            return Err(ClientError::Validation(format!(
                "minimum age {} is greater than maximum age {}",
                query.age_min, query.age_max
            )));
        }

        debug!(
            n_breeds = query.breeds.len(),
            n_zip_codes = query.zip_codes.len(),
            age_min = query.age_min,
            age_max = query.age_max,
            "sending search request"
        );

        let response = self
            .request(Method::GET, "dogs/search")
            .query(&query.query_params())
            .send()
            .await
            .map_response_error()?;

        let result: DogSearchResult = response.json().await.map_err(ClientError::InvalidResponse)?;
        debug!(
            n_ids = result.result_ids.len(),
            total = result.total,
            "received search result"
        );
        Ok(result)
    }

    /// Fetch full records for a batch of dog IDs.
    ///
    /// The order of the returned dogs is not guaranteed to match `ids`.
    #[instrument(skip_all, fields(n_ids = ids.len()))]
    pub async fn fetch_dogs(&self, ids: &[DogId]) -> Result<Vec<Dog>, ClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_FETCH_BATCH {
            return Err(ClientError::Validation(format!(
                "cannot fetch more than {MAX_FETCH_BATCH} dogs at once, got {}",
                ids.len()
            )));
        }

        let response = self
            .request(Method::POST, "dogs")
            .json(ids)
            .send()
            .await
            .map_response_error()?;

        let dogs: Vec<Dog> = response.json().await.map_err(ClientError::InvalidResponse)?;
        debug!(n_dogs = dogs.len(), "received dogs");
        Ok(dogs)
    }

    /// Search for locations, failing on any error.
    #[instrument(skip_all)]
    pub async fn try_search_locations(
        &self,
        request: &LocationSearchRequest,
    ) -> Result<LocationSearchResult, ClientError> {
        let response = self
            .request(Method::POST, "locations/search")
            .json(request)
            .send()
            .await
            .map_response_error()?;

        let result: LocationSearchResult =
            response.json().await.map_err(ClientError::InvalidResponse)?;
        debug!(
            n_locations = result.results.len(),
            total = result.total,
            "received locations"
        );
        Ok(result)
    }

    /// Ask the backend to pick one dog among `ids`.
    ///
    /// Returns `None` if the backend did not choose a dog.
    #[instrument(skip_all, fields(n_ids = ids.len()))]
    pub async fn resolve_match(&self, ids: &[DogId]) -> Result<Option<DogId>, ClientError> {
        let response = self
            .request(Method::POST, "dogs/match")
            .json(ids)
            .send()
            .await
            .map_response_error()?;

        let response: MatchResponse = response.json().await.map_err(ClientError::InvalidResponse)?;
        Ok(response.matched.filter(|id| !id.is_empty()))
    }

    /// Claim an identity and receive a session token.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, name: &str) -> Result<SessionToken, LoginError> {
        let body = LoginRequest {
            email: email.to_string(),
            name: name.to_string(),
        };
        let response = self
            .client
            .post(self.config.endpoint("auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(LoginError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "login rejected");
            return Err(LoginError::from_status(status));
        }

        let issued_at = Utc::now();
        if let Some(token) = session_token_from_headers(response.headers()) {
            debug!("session token issued via cookie");
            return Ok(SessionToken::new(token, issued_at));
        }

        // Some deployments hand the token back in the body instead.
        let text = response.text().await.map_err(LoginError::Transport)?;
        serde_json::from_str::<LoginResponse>(&text)
            .ok()
            .and_then(|body| body.token)
            .filter(|token| !token.is_empty())
            .map(|token| SessionToken::new(token, issued_at))
            .ok_or(LoginError::MissingSessionToken)
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

fn build_http_client(config: &DogClientConfig) -> Result<reqwest::Client, ClientError> {
    let mut headers = HeaderMap::new();

    // Extra headers (the CLI may add client identification etc.)
    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| ClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| ClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        base_url = %config.base_url,
        extra_headers = config.extra_headers.len(),
        "building dog API HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| ClientError::Other(e.to_string()))
}

/// Index fetched dogs by ID.
///
/// `POST /dogs` does not preserve request order,
/// consumers restore it through this map.
pub fn index_by_id(dogs: impl IntoIterator<Item = Dog>) -> BTreeMap<DogId, Dog> {
    dogs.into_iter().map(|dog| (dog.id.clone(), dog)).collect()
}
