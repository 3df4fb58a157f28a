//! HTTP client for the shelter-dog adoption API.
//!
//! This crate provides:
//! - HTTP client construction with timeouts, user agent and extra headers
//! - Per-request session credential attachment
//! - Typed request/response models for the dogs, locations and auth endpoints
//! - Error classification for transport, auth, server and validation failures
//!
//! ## Usage
//!
//! ```ignore
//! use pawmatch_client::{DogClient, DogClientConfig};
//!
//! let config = DogClientConfig {
//!     base_url: "https://frontend-take-home-service.fetch.com".to_string(),
//!     extra_headers: BTreeMap::new(),
//!     user_agent: None,
//! };
//!
//! let client = DogClient::new(config, Arc::new(session_store))?;
//! let breeds = client.list_breeds().await?;
//! ```

mod auth;
mod client;
mod config;
mod error;
pub mod types;

pub use auth::{
    AuthStrategy,
    CredentialSource,
    NoCredentials,
    SESSION_COOKIE_NAME,
    SessionCookieAuthStrategy,
};
pub use client::{DogClient, index_by_id};
pub use config::DogClientConfig;
pub use error::{ClientError, LoginError, MapResponseExt, MatchError};
pub use reqwest::StatusCode;
