//! Session credential attachment
//!
//! The backend authenticates requests with a session cookie issued by
//! `POST /auth/login`. Rather than relying on an implicit cookie jar,
//! every outgoing request reads the current credential from a
//! [CredentialSource] and an [AuthStrategy] writes it into the request
//! headers.

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, warn};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "fetch-access-token";

/// Provides the credential to attach to the next request.
///
/// Implementations are read on every request, so a credential that is
/// cleared or expires stops being sent immediately.
pub trait CredentialSource: Send + Sync {
    fn credential(&self) -> Option<String>;
}

/// A source that never provides a credential (e.g. before login).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn credential(&self) -> Option<String> {
        None
    }
}

impl CredentialSource for String {
    fn credential(&self) -> Option<String> {
        Some(self.clone())
    }
}

/// Strategy for writing authentication headers
pub trait AuthStrategy {
    /// Add authorization headers to the provided HeaderMap
    fn add_auth_headers(header_map: &mut HeaderMap, credentials: &dyn CredentialSource);
}

/// Sends the session token as the `fetch-access-token` cookie.
pub struct SessionCookieAuthStrategy;

impl AuthStrategy for SessionCookieAuthStrategy {
    fn add_auth_headers(header_map: &mut HeaderMap, credentials: &dyn CredentialSource) {
        let Some(token) = credentials.credential() else {
            return;
        };

        let cookie = format!("{SESSION_COOKIE_NAME}={token}");
        let Ok(value) = HeaderValue::from_str(&cookie) else {
            warn!("Failed to create cookie header from session token");
            return;
        };
        header_map.insert(header::COOKIE, value);
        debug!("Added session cookie");
    }
}

/// Extract the session token from the `Set-Cookie` headers of a response.
pub(crate) fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
