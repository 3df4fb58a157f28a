use indoc::{formatdoc, indoc};
use pawmatch_client::{ClientError, LoginError};
use pawmatch_sdk::session::SessionError;
use thiserror::Error;
use tracing::trace;

/// The failure has already been shown to the user,
/// only the exit status is left to set.
#[derive(Debug, Error)]
#[error("command failed")]
pub struct AlreadyReported;

/// The catalog can only be browsed with a valid session.
#[derive(Debug, Error)]
#[error("not logged in, run 'pawmatch login --email <email> --name <name>' first")]
pub struct NotLoggedIn;

pub fn format_client_error(err: &ClientError) -> String {
    trace!("formatting client_error: {err:?}");

    match err {
        ClientError::Unauthorized => indoc! {"
            Your session is no longer valid.

            Log in again with 'pawmatch login --email <email> --name <name>'.
        "}
        .to_string(),
        ClientError::Transport(_) | ClientError::Server(_) => formatdoc! {"
            {chain}

            The dog catalog could not be reached, please try again later.
        ", chain = display_chain(err)},
        ClientError::Validation(_) => display_chain(err),
        ClientError::UnexpectedResponse(_)
        | ClientError::InvalidResponse(_)
        | ClientError::Other(_) => display_chain(err),
    }
}

pub fn format_login_error(err: &LoginError) -> String {
    trace!("formatting login_error: {err:?}");

    match err {
        LoginError::InvalidCredentials => indoc! {"
            Login failed: the email or name was not accepted.

            Check both values and try again.
        "}
        .to_string(),
        LoginError::ServerUnavailable(status) => formatdoc! {"
            Login failed: the server is unavailable ({status}).

            Please try again later.
        "},
        LoginError::Unknown(status) => format!("Login failed: unexpected response ({status})."),
        LoginError::MissingSessionToken => indoc! {"
            Login failed: the server accepted the login but did not issue a session.
        "}
        .to_string(),
        LoginError::Transport(_) => formatdoc! {"
            {chain}

            The login service could not be reached, please try again later.
        ", chain = display_chain(err)},
    }
}

pub fn format_session_error(err: &SessionError) -> String {
    trace!("formatting session_error: {err:?}");

    match err {
        SessionError::Parse(_) => formatdoc! {"
            {chain}

            The saved session is corrupt, run 'pawmatch logout' and log in again.
        ", chain = display_chain(err)},
        _ => display_chain(err),
    }
}

pub fn display_chain(mut err: &dyn std::error::Error) -> String {
    let mut fmt = err.to_string();
    while let Some(source) = err.source() {
        fmt = format!("{fmt}: {source}");
        err = source;
    }

    fmt
}
