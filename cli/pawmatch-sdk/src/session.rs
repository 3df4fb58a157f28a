//! Session store
//!
//! Holds the token issued by `POST /auth/login`.
//! The store is shared between the API client, which reads the credential
//! on every request, and the login/logout flows, which set and clear it.
//! A store opened with a path also persists the token,
//! so separate CLI invocations share one session.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::{fs, io};

use chrono::{DateTime, Utc};
use pawmatch_client::CredentialSource;
use pawmatch_client::types::SessionToken;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

pub const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not read session file '{}'", .0.display())]
    Read(PathBuf, #[source] io::Error),
    #[error("could not parse session file")]
    Parse(#[source] serde_json::Error),
    #[error("could not write session file")]
    Write(#[source] io::Error),
    #[error("could not remove session file")]
    Remove(#[source] io::Error),
    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
}

/// Shared, optionally persisted holder of the current [SessionToken].
///
/// Clones share the same token.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    token: Arc<RwLock<Option<SessionToken>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`.
    ///
    /// A missing file means "not logged in".
    /// An expired session is discarded and its file removed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let token = match fs::read_to_string(&path) {
            Ok(contents) => {
                Some(serde_json::from_str::<SessionToken>(&contents).map_err(SessionError::Parse)?)
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(SessionError::Read(path, e)),
        };

        let token = match token {
            Some(token) if token.is_valid() => Some(token),
            Some(_) => {
                debug!(path = %path.display(), "discarding expired session");
                remove_file(&path)?;
                None
            },
            None => None,
        };

        Ok(Self {
            token: Arc::new(RwLock::new(token)),
            path: Some(path),
        })
    }

    /// Store a freshly issued token, replacing any previous one.
    pub fn set(&self, token: SessionToken) -> Result<(), SessionError> {
        if let Some(path) = &self.path {
            write_atomically(path, &token)?;
        }
        *self.token.write().expect("session lock poisoned") = Some(token);
        Ok(())
    }

    /// The current token if it has not expired.
    pub fn current(&self) -> Option<SessionToken> {
        self.current_at(Utc::now())
    }

    /// The token if it is still valid at `now`.
    ///
    /// An expired token is dropped from memory;
    /// the persisted copy is discarded the next time the store is opened.
    pub fn current_at(&self, now: DateTime<Utc>) -> Option<SessionToken> {
        let mut guard = self.token.write().expect("session lock poisoned");
        match guard.as_ref() {
            Some(token) if token.is_valid_at(now) => Some(token.clone()),
            Some(_) => {
                debug!("session expired");
                *guard = None;
                None
            },
            None => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Forget the token and delete the persisted copy.
    pub fn clear(&self) -> Result<(), SessionError> {
        *self.token.write().expect("session lock poisoned") = None;
        if let Some(path) = &self.path {
            remove_file(path)?;
        }
        Ok(())
    }
}

impl CredentialSource for SessionStore {
    fn credential(&self) -> Option<String> {
        self.current().map(|token| token.secret().to_string())
    }
}

fn write_atomically(path: &Path, token: &SessionToken) -> Result<(), SessionError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(SessionError::Write)?;
    let mut temp_file = NamedTempFile::new_in(dir).map_err(SessionError::Write)?;
    let contents = serde_json::to_string_pretty(token).map_err(SessionError::Parse)?;
    temp_file
        .write_all(contents.as_bytes())
        .map_err(SessionError::Write)?;
    temp_file.persist(path)?;
    debug!(path = %path.display(), "saved session");
    Ok(())
}

fn remove_file(path: &Path) -> Result<(), SessionError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SessionError::Remove(e)),
    }
}
