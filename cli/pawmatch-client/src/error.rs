//! Error handling for dog API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Common error type for dog API operations.
///
/// Operation specific errors ([LoginError], [MatchError]) wrap or replace
/// this type where the caller needs to tell more cases apart.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connection, timeout, TLS).
    #[error("request failed")]
    Transport(#[source] reqwest::Error),
    /// The backend rejected the session credential.
    #[error("not authorized, the session may have expired")]
    Unauthorized,
    #[error("server error ({0})")]
    Server(StatusCode),
    /// Input rejected before anything was sent.
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("unexpected response ({0})")]
    UnexpectedResponse(StatusCode),
    #[error("failed to parse response")]
    InvalidResponse(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Classify a non-success status code.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            status if status.is_server_error() => ClientError::Server(status),
            status => ClientError::UnexpectedResponse(status),
        }
    }
}

/// Extension trait for converting raw `reqwest` results into client errors.
pub trait MapResponseExt {
    /// Maps transport failures and non-success statuses into
    /// [ClientError], passing successful responses through.
    fn map_response_error(self) -> Result<reqwest::Response, ClientError>;
}

impl MapResponseExt for Result<reqwest::Response, reqwest::Error> {
    fn map_response_error(self) -> Result<reqwest::Response, ClientError> {
        let response = self.map_err(ClientError::Transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ClientError::from_status(status))
        }
    }
}

/// Errors returned by [crate::DogClient::login].
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid email or name")]
    InvalidCredentials,
    #[error("the server is unavailable ({0})")]
    ServerUnavailable(StatusCode),
    #[error("login failed ({0})")]
    Unknown(StatusCode),
    #[error("login succeeded but no session token was issued")]
    MissingSessionToken,
    #[error("login request failed")]
    Transport(#[source] reqwest::Error),
}

impl LoginError {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => LoginError::InvalidCredentials,
            status if status.is_server_error() => LoginError::ServerUnavailable(status),
            status => LoginError::Unknown(status),
        }
    }
}

/// Errors from resolving favorites to a single matched dog.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("no match found")]
    NoMatchFound,
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_GATEWAY),
            ClientError::Server(StatusCode::BAD_GATEWAY)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::IM_A_TEAPOT),
            ClientError::UnexpectedResponse(_)
        ));
    }

    #[test]
    fn login_status_classification() {
        assert!(matches!(
            LoginError::from_status(StatusCode::UNAUTHORIZED),
            LoginError::InvalidCredentials
        ));
        assert!(matches!(
            LoginError::from_status(StatusCode::SERVICE_UNAVAILABLE),
            LoginError::ServerUnavailable(_)
        ));
        assert!(matches!(
            LoginError::from_status(StatusCode::FORBIDDEN),
            LoginError::Unknown(StatusCode::FORBIDDEN)
        ));
    }
}
