use std::path::PathBuf;
use std::sync::Arc;

use crate::models::browse::{BROWSE_FILE_NAME, BrowseError, BrowseSession, BrowseSnapshot};
use crate::notify::Notify;
use crate::providers::catalog::Client;
use crate::session::{SESSION_FILE_NAME, SessionStore};

/// The main API struct of the SDK
///
/// A [Pawmatch] instance is the context shared by all operations of one
/// CLI invocation: where state is kept, the catalog client and the
/// session that client authenticates with.
#[derive(Debug)]
pub struct Pawmatch {
    /// Persisted session and browse state live here
    pub data_dir: PathBuf,

    pub client: Arc<Client>,

    /// The session `client` reads its credential from.
    /// Checking [SessionStore::is_authenticated] tells whether the user is logged in.
    pub session: SessionStore,
}

impl Pawmatch {
    pub fn session_path(data_dir: impl Into<PathBuf>) -> PathBuf {
        data_dir.into().join(SESSION_FILE_NAME)
    }

    pub fn browse_path(&self) -> PathBuf {
        self.data_dir.join(BROWSE_FILE_NAME)
    }

    /// Resume the browse session saved by a previous invocation,
    /// or start a fresh one.
    pub fn browse(&self, notifier: Arc<dyn Notify>) -> Result<BrowseSession<Client>, BrowseError> {
        let snapshot = BrowseSnapshot::read(self.browse_path())?.unwrap_or_default();
        Ok(BrowseSession::restore(self.client.clone(), notifier, snapshot))
    }

    pub fn save_browse(&self, session: &BrowseSession<Client>) -> Result<(), BrowseError> {
        session.snapshot().write(self.browse_path())
    }
}

#[cfg(test)]
mod tests {
    use pawmatch_test_utils::mixed_shelter;
    use tempfile::TempDir;

    use super::*;
    use crate::models::filter::FilterEdit;
    use crate::notify::Silent;
    use crate::providers::mock::MockClient;

    fn pawmatch(dir: &TempDir) -> Pawmatch {
        Pawmatch {
            data_dir: dir.path().join("data"),
            client: Arc::new(MockClient::with_dogs(mixed_shelter()).into()),
            session: SessionStore::in_memory(),
        }
    }

    #[tokio::test]
    async fn browse_state_carries_over() {
        let dir = TempDir::new().unwrap();
        let pawmatch = pawmatch(&dir);

        let first = pawmatch.browse(Arc::new(Silent)).unwrap();
        first
            .apply(FilterEdit::AddBreed("Pug".to_string()))
            .await
            .unwrap();
        pawmatch.save_browse(&first).unwrap();

        let second = pawmatch.browse(Arc::new(Silent)).unwrap();
        assert!(second.criteria().breeds().contains("Pug"));
        assert_eq!(second.current_page().unwrap().dogs.len(), 2);
    }

    #[test]
    fn fresh_browse_state_is_default() {
        let dir = TempDir::new().unwrap();
        let browse = pawmatch(&dir).browse(Arc::new(Silent)).unwrap();
        assert_eq!(browse.snapshot(), BrowseSnapshot::default());
    }
}
