//! Dog API interaction types.
//!
//! These types mirror the JSON bodies of the adoption API,
//! with a few richer wrappers where the wire format is stringly typed.

use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Results per page of a dog search.
pub const PAGE_SIZE: u32 = 12;
/// Results requested per location search.
pub const LOCATION_SEARCH_SIZE: u32 = 25;
/// Largest number of IDs `POST /dogs` accepts in one batch.
pub const MAX_FETCH_BATCH: usize = 100;
/// Lifetime of a session issued by `POST /auth/login`.
pub const SESSION_TTL_SECS: i64 = 60 * 60;

pub type DogId = String;

// ---------------------------------------------------------------------------
// Dogs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dog {
    pub id: DogId,
    pub img: String,
    pub name: String,
    /// Age in years
    pub age: u32,
    pub zip_code: String,
    pub breed: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Breed,
    Name,
    Age,
}

impl Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortField::Breed => "breed",
            SortField::Name => "name",
            SortField::Age => "age",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
#[error("unknown sort field '{0}', expected one of: breed, name, age")]
pub struct UnknownSortField(String);

impl FromStr for SortField {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breed" => Ok(SortField::Breed),
            "name" => Ok(SortField::Name),
            "age" => Ok(SortField::Age),
            _ => Err(UnknownSortField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Sort order of a dog search, sent as `field:direction`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction)
    }
}

/// Query parameters of `GET /dogs/search`.
///
/// Empty breed and ZIP sets mean "no filter" and are left out of the
/// request entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DogSearchQuery {
    pub breeds: BTreeSet<String>,
    pub zip_codes: BTreeSet<String>,
    pub age_min: u8,
    pub age_max: u8,
    pub size: u32,
    pub from: u32,
    pub sort: Sort,
}

impl DogSearchQuery {
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        params.extend(self.breeds.iter().map(|breed| ("breeds[]", breed.clone())));
        params.extend(self.zip_codes.iter().map(|zip| ("zipCodes[]", zip.clone())));
        params.push(("ageMin", self.age_min.to_string()));
        params.push(("ageMax", self.age_max.to_string()));
        params.push(("size", self.size.to_string()));
        params.push(("from", self.from.to_string()));
        params.push(("sort", self.sort.to_string()));
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogSearchResult {
    pub result_ids: Vec<DogId>,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResponse {
    #[serde(rename = "match", default)]
    pub matched: Option<DogId>,
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub zip_code: String,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

/// Body of `POST /locations/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_bounding_box: Option<GeoBoundingBox>,
    pub size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSearchResult {
    #[serde(default)]
    pub results: Vec<Location>,
    #[serde(default)]
    pub total: u64,
}

impl LocationSearchResult {
    pub fn zip_codes(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|location| location.zip_code.as_str())
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub(crate) token: Option<String>,
}

/// A session credential issued by a successful login.
///
/// The token is opaque; it is only valid until `issued_at + ttl`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    token: String,
    issued_at: DateTime<Utc>,
    ttl_secs: i64,
}

impl SessionToken {
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            issued_at,
            ttl_secs: SESSION_TTL_SECS,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.num_seconds();
        self
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.ttl_secs)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}
