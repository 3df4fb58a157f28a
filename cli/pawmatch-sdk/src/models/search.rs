//! Search orchestration
//!
//! A search cycle runs in two stages: the dog search yields an ordered page
//! of IDs, then the details of those dogs are fetched in one batch.
//!
//! ```text
//! Idle -> SearchingIds -> FetchingDetails -> Ready
//!              |                 |
//!              +-----------------+-> Failed
//! ```
//!
//! Every change to the [FilterCriteria] starts a new cycle.
//! Cycles are never cancelled; instead each cycle remembers the criteria it
//! started with and only commits its results if those are still the current
//! criteria, so the most recent change always wins.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use pawmatch_client::types::{Dog, DogId};
use pawmatch_client::{ClientError, index_by_id};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::filter::{FilterCriteria, FilterEdit, FilterError, page_count};
use crate::providers::catalog::ClientTrait;

/// Number of fetched batches kept by the detail cache.
const DETAIL_CACHE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchStatus {
    #[default]
    Idle,
    SearchingIds,
    FetchingDetails,
    Ready,
    Failed(String),
}

/// One page of dogs in search order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub dogs: Vec<Dog>,
    pub total: u64,
    pub page: u32,
}

impl SearchPage {
    pub fn page_count(&self) -> u64 {
        page_count(self.total)
    }

    pub fn ids(&self) -> Vec<DogId> {
        self.dogs.iter().map(|dog| dog.id.clone()).collect()
    }
}

/// How a search cycle ended, from the point of view of its caller.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The edit did not change the criteria, no search was made.
    Unchanged,
    Ready(SearchPage),
    Failed(ClientError),
    /// The criteria changed while the cycle was running,
    /// its results were discarded.
    Stale,
}

#[derive(Debug)]
struct SearchState {
    criteria: FilterCriteria,
    status: SearchStatus,
    page: Option<SearchPage>,
}

impl SearchState {
    fn begin_cycle(&mut self) -> FilterCriteria {
        self.status = SearchStatus::SearchingIds;
        self.page = None;
        self.criteria.clone()
    }

    fn ready(&mut self, page: SearchPage) {
        self.status = SearchStatus::Ready;
        self.page = Some(page);
    }

    fn fail(&mut self, error: &ClientError) {
        self.status = SearchStatus::Failed(error.to_string());
        self.page = None;
    }
}

/// Bounded FIFO cache of fetched batches, keyed by the exact ID list.
#[derive(Debug, Default)]
struct DetailCache {
    batches: IndexMap<Vec<DogId>, Vec<Dog>>,
}

impl DetailCache {
    fn get(&self, ids: &[DogId]) -> Option<Vec<Dog>> {
        self.batches.get(ids).cloned()
    }

    fn insert(&mut self, ids: Vec<DogId>, dogs: Vec<Dog>) {
        if !self.batches.contains_key(&ids) && self.batches.len() >= DETAIL_CACHE_CAPACITY {
            self.batches.shift_remove_index(0);
        }
        self.batches.insert(ids, dogs);
    }
}

pub struct SearchOrchestrator<C> {
    client: Arc<C>,
    state: Mutex<SearchState>,
    cache: Mutex<DetailCache>,
}

impl<C: ClientTrait> SearchOrchestrator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::restore(client, FilterCriteria::default(), None)
    }

    /// Resume with previously displayed criteria and page.
    pub fn restore(client: Arc<C>, criteria: FilterCriteria, page: Option<SearchPage>) -> Self {
        let status = if page.is_some() {
            SearchStatus::Ready
        } else {
            SearchStatus::Idle
        };
        Self {
            client,
            state: Mutex::new(SearchState {
                criteria,
                status,
                page,
            }),
            cache: Mutex::new(DetailCache::default()),
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.state().criteria.clone()
    }

    pub fn status(&self) -> SearchStatus {
        self.state().status.clone()
    }

    /// The page shown to the user, if the last cycle completed.
    pub fn current_page(&self) -> Option<SearchPage> {
        self.state().page.clone()
    }

    pub fn displayed_ids(&self) -> Vec<DogId> {
        self.state()
            .page
            .as_ref()
            .map(SearchPage::ids)
            .unwrap_or_default()
    }

    /// Apply `edit` and, if the criteria changed, run a search cycle.
    pub async fn apply(&self, edit: FilterEdit) -> Result<CycleOutcome, FilterError> {
        self.try_update(|criteria| criteria.apply(edit)).await
    }

    /// Modify the criteria with `f`, which reports whether they changed,
    /// and run a search cycle if they did.
    pub async fn try_update(
        &self,
        f: impl FnOnce(&mut FilterCriteria) -> Result<bool, FilterError>,
    ) -> Result<CycleOutcome, FilterError> {
        let criteria = {
            let mut state = self.state();
            if !f(&mut state.criteria)? {
                return Ok(CycleOutcome::Unchanged);
            }
            state.begin_cycle()
        };
        Ok(self.run_cycle(criteria).await)
    }

    /// Like [SearchOrchestrator::try_update] for changes that cannot fail.
    pub async fn update(&self, f: impl FnOnce(&mut FilterCriteria) -> bool) -> CycleOutcome {
        let criteria = {
            let mut state = self.state();
            if !f(&mut state.criteria) {
                return CycleOutcome::Unchanged;
            }
            state.begin_cycle()
        };
        self.run_cycle(criteria).await
    }

    /// Run a search cycle for the current criteria.
    pub async fn refresh(&self) -> CycleOutcome {
        let criteria = self.state().begin_cycle();
        self.run_cycle(criteria).await
    }

    #[instrument(skip_all, fields(page = criteria.page()))]
    async fn run_cycle(&self, criteria: FilterCriteria) -> CycleOutcome {
        let searched = self.client.search_dog_ids(&criteria.to_query()).await;

        let result = {
            let mut state = self.state();
            if state.criteria != criteria {
                debug!("criteria changed during search, discarding result");
                return CycleOutcome::Stale;
            }
            match searched {
                Err(e) => {
                    state.fail(&e);
                    return CycleOutcome::Failed(e);
                },
                Ok(result) if result.result_ids.is_empty() => {
                    let page = SearchPage {
                        dogs: Vec::new(),
                        total: result.total,
                        page: criteria.page(),
                    };
                    state.ready(page.clone());
                    return CycleOutcome::Ready(page);
                },
                Ok(result) => {
                    state.status = SearchStatus::FetchingDetails;
                    result
                },
            }
        };

        let fetched = self.fetch_details(&result.result_ids).await;

        let mut state = self.state();
        if state.criteria != criteria {
            debug!("criteria changed during fetch, discarding details");
            return CycleOutcome::Stale;
        }
        match fetched {
            Err(e) => {
                state.fail(&e);
                CycleOutcome::Failed(e)
            },
            Ok(dogs) => {
                let mut by_id = index_by_id(dogs);
                let dogs: Vec<Dog> = result
                    .result_ids
                    .iter()
                    .filter_map(|id| by_id.remove(id))
                    .collect();
                debug!(n_dogs = dogs.len(), total = result.total, "search ready");
                let page = SearchPage {
                    dogs,
                    total: result.total,
                    page: criteria.page(),
                };
                state.ready(page.clone());
                CycleOutcome::Ready(page)
            },
        }
    }

    async fn fetch_details(&self, ids: &[DogId]) -> Result<Vec<Dog>, ClientError> {
        if let Some(dogs) = self.cache.lock().expect("cache lock poisoned").get(ids) {
            debug!("using cached details");
            return Ok(dogs);
        }
        let dogs = self.client.fetch_dogs(ids).await?;
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .insert(ids.to_vec(), dogs.clone());
        Ok(dogs)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SearchState> {
        self.state.lock().expect("search state lock poisoned")
    }
}
