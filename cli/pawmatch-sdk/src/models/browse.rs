//! The browsing session: search, location lookup, favorites and matching
//! combined behind the intents a user can dispatch.
//!
//! A [BrowseSession] can be captured as a [BrowseSnapshot] and restored,
//! which lets short-lived front ends (such as the CLI) continue where the
//! previous invocation left off.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use pawmatch_client::types::{Dog, DogId};
use pawmatch_client::ClientError;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, instrument};

use super::favorites::{FavoriteError, FavoriteSet, MatchEngine, MatchOutcome};
use super::filter::{FilterCriteria, FilterEdit, FilterError};
use super::location::{LocationQuery, LocationQueryError};
use super::search::{CycleOutcome, SearchOrchestrator, SearchPage, SearchStatus};
use crate::notify::{Notification, Notify};
use crate::providers::catalog::ClientTrait;

pub const BROWSE_FILE_NAME: &str = "browse.json";

#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("could not read browse state '{}'", .0.display())]
    Read(PathBuf, #[source] io::Error),
    #[error("could not parse browse state")]
    Parse(#[source] serde_json::Error),
    #[error("could not write browse state")]
    Write(#[source] io::Error),
    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
}

/// Everything needed to resume browsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseSnapshot {
    #[serde(default)]
    pub criteria: FilterCriteria,
    #[serde(default)]
    pub favorites: FavoriteSet,
    #[serde(default)]
    pub match_result: Option<Dog>,
    /// The last page shown to the user.
    #[serde(default)]
    pub page: Option<SearchPage>,
}

impl BrowseSnapshot {
    /// Read a snapshot, `None` if nothing was saved yet.
    pub fn read(path: impl AsRef<Path>) -> Result<Option<Self>, BrowseError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BrowseError::Read(path.to_path_buf(), e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(BrowseError::Parse)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), BrowseError> {
        let path = path.as_ref();
        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(BrowseError::Write)?;

        let mut temp_file = NamedTempFile::new_in(dir).map_err(BrowseError::Write)?;
        serde_json::to_writer_pretty(&mut temp_file, self).map_err(BrowseError::Parse)?;
        temp_file.flush().map_err(BrowseError::Write)?;
        temp_file.persist(path)?;
        debug!(path = %path.display(), "saved browse state");
        Ok(())
    }
}

#[derive(Debug)]
pub enum LocateOutcome {
    /// No location matched, the ZIP filter was left as is.
    NoLocations,
    /// The ZIP filter was replaced by `zip_codes` ZIP codes.
    Searched {
        zip_codes: usize,
        outcome: CycleOutcome,
    },
}

pub struct BrowseSession<C> {
    client: Arc<C>,
    notifier: Arc<dyn Notify>,
    search: SearchOrchestrator<C>,
    matcher: MatchEngine<C>,
}

impl<C: ClientTrait> BrowseSession<C> {
    pub fn new(client: Arc<C>, notifier: Arc<dyn Notify>) -> Self {
        Self::restore(client, notifier, BrowseSnapshot::default())
    }

    pub fn restore(client: Arc<C>, notifier: Arc<dyn Notify>, snapshot: BrowseSnapshot) -> Self {
        let search = SearchOrchestrator::restore(client.clone(), snapshot.criteria, snapshot.page);
        let matcher = MatchEngine::restore(
            client.clone(),
            notifier.clone(),
            snapshot.favorites,
            snapshot.match_result,
        );
        Self {
            client,
            notifier,
            search,
            matcher,
        }
    }

    pub fn snapshot(&self) -> BrowseSnapshot {
        BrowseSnapshot {
            criteria: self.search.criteria(),
            favorites: self.matcher.favorites(),
            match_result: self.matcher.match_result(),
            page: self.search.current_page(),
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.search.criteria()
    }

    pub fn status(&self) -> SearchStatus {
        self.search.status()
    }

    pub fn current_page(&self) -> Option<SearchPage> {
        self.search.current_page()
    }

    pub fn favorites(&self) -> FavoriteSet {
        self.matcher.favorites()
    }

    pub fn match_result(&self) -> Option<Dog> {
        self.matcher.match_result()
    }

    pub async fn breeds(&self) -> Result<Vec<String>, ClientError> {
        self.client.list_breeds().await
    }

    pub async fn apply(&self, edit: FilterEdit) -> Result<CycleOutcome, FilterError> {
        self.search.apply(edit).await
    }

    /// Apply several edits, searching once for the resulting criteria.
    ///
    /// Validation stops at the first invalid edit, before anything is
    /// searched.
    pub async fn apply_all(
        &self,
        edits: impl IntoIterator<Item = FilterEdit>,
    ) -> Result<CycleOutcome, FilterError> {
        self.search
            .try_update(|criteria| criteria.apply_all(edits))
            .await
    }

    pub async fn refresh(&self) -> CycleOutcome {
        self.search.refresh().await
    }

    /// Replace the ZIP filter with the ZIP codes of matching locations.
    ///
    /// Invalid queries are reported without contacting the backend.
    #[instrument(skip_all)]
    pub async fn search_location(
        &self,
        query: LocationQuery,
    ) -> Result<LocateOutcome, LocationQueryError> {
        let request = match query.validate() {
            Ok(request) => request,
            Err(e) => {
                self.notifier.notify(Notification::error(&e));
                return Err(e);
            },
        };

        let result = self.client.search_locations(&request).await;
        if result.results.is_empty() {
            self.notifier
                .notify(Notification::info("No locations found, the location filter is unchanged."));
            return Ok(LocateOutcome::NoLocations);
        }

        let zip_codes: BTreeSet<String> = result.zip_codes().map(str::to_string).collect();
        let n_zip_codes = zip_codes.len();
        debug!(n_zip_codes, "filtering by location");
        let outcome = self
            .search
            .update(|criteria| criteria.set_zip_codes(zip_codes))
            .await;
        Ok(LocateOutcome::Searched {
            zip_codes: n_zip_codes,
            outcome,
        })
    }

    /// Toggle `id` as a favorite; only displayed dogs can be added.
    pub fn toggle_favorite(&self, id: &str) -> Result<bool, FavoriteError> {
        let displayed: Vec<DogId> = self.search.displayed_ids();
        self.matcher.toggle_favorite(id, &displayed)
    }

    pub async fn request_match(&self) -> MatchOutcome {
        self.matcher.request_match().await
    }

    /// Reset the criteria to their defaults and forget favorites and match.
    pub async fn clear_filters(&self) -> CycleOutcome {
        self.matcher.clear();
        self.search.update(FilterCriteria::reset).await
    }
}
