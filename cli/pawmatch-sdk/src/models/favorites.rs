//! Favorites and matching
//!
//! Users pick favorites among the dogs they are shown.
//! The favorites are submitted to the match endpoint, which picks one dog;
//! that dog becomes the current match result.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use pawmatch_client::MatchError;
use pawmatch_client::types::{Dog, DogId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::notify::{Notification, Notify};
use crate::providers::catalog::ClientTrait;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FavoriteError {
    #[error("dog '{0}' is not on the current page")]
    NotDisplayed(DogId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet(BTreeSet<DogId>);

impl FavoriteSet {
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DogId> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<DogId> {
        self.0.iter().cloned().collect()
    }

    /// Flip membership of `id`, returning whether it is now a favorite.
    pub fn toggle(&mut self, id: DogId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<DogId> for FavoriteSet {
    fn from_iter<T: IntoIterator<Item = DogId>>(iter: T) -> Self {
        FavoriteSet(iter.into_iter().collect())
    }
}

#[derive(Debug)]
pub enum MatchOutcome {
    Matched(Dog),
    /// The backend did not pick any dog.
    NoMatch,
    /// There are no favorites to match from, nothing was sent.
    Disabled,
    /// Another match request is still running, nothing was sent.
    AlreadyPending,
    Failed(MatchError),
}

/// Resets the in-flight flag when the match request finishes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct MatchEngine<C> {
    client: Arc<C>,
    notifier: Arc<dyn Notify>,
    favorites: Mutex<FavoriteSet>,
    result: Mutex<Option<Dog>>,
    in_flight: AtomicBool,
}

impl<C: ClientTrait> MatchEngine<C> {
    pub fn new(client: Arc<C>, notifier: Arc<dyn Notify>) -> Self {
        Self::restore(client, notifier, FavoriteSet::default(), None)
    }

    pub fn restore(
        client: Arc<C>,
        notifier: Arc<dyn Notify>,
        favorites: FavoriteSet,
        result: Option<Dog>,
    ) -> Self {
        Self {
            client,
            notifier,
            favorites: Mutex::new(favorites),
            result: Mutex::new(result),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn favorites(&self) -> FavoriteSet {
        self.favorites.lock().expect("favorites lock poisoned").clone()
    }

    pub fn match_result(&self) -> Option<Dog> {
        self.result.lock().expect("match lock poisoned").clone()
    }

    /// Whether [MatchEngine::request_match] would send a request.
    pub fn can_match(&self) -> bool {
        !self.favorites.lock().expect("favorites lock poisoned").is_empty()
    }

    /// Add or remove `id`, returning whether it is now a favorite.
    ///
    /// Only dogs in `displayed` can be added,
    /// removing a favorite is always possible.
    pub fn toggle_favorite(&self, id: &str, displayed: &[DogId]) -> Result<bool, FavoriteError> {
        let mut favorites = self.favorites.lock().expect("favorites lock poisoned");
        if !favorites.contains(id) && !displayed.iter().any(|shown| shown == id) {
            return Err(FavoriteError::NotDisplayed(id.to_string()));
        }
        Ok(favorites.toggle(id.to_string()))
    }

    /// Submit the favorites to the match endpoint.
    ///
    /// A failed request leaves the previous match result in place.
    #[instrument(skip_all)]
    pub async fn request_match(&self) -> MatchOutcome {
        let ids = self.favorites().to_vec();
        if ids.is_empty() {
            debug!("no favorites, match disabled");
            return MatchOutcome::Disabled;
        }
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("match already pending");
            return MatchOutcome::AlreadyPending;
        };

        match self.client.match_dogs(&ids).await {
            Ok(dog) => {
                self.notifier.notify(Notification::success(format!(
                    "It's a match! Meet {}, a {} year old {}.",
                    dog.name, dog.age, dog.breed
                )));
                *self.result.lock().expect("match lock poisoned") = Some(dog.clone());
                MatchOutcome::Matched(dog)
            },
            Err(MatchError::NoMatchFound) => {
                self.notifier
                    .notify(Notification::info("No match found, try adding more favorites."));
                MatchOutcome::NoMatch
            },
            Err(e) => {
                self.notifier
                    .notify(Notification::error(format!("Failed to find a match: {e}")));
                MatchOutcome::Failed(e)
            },
        }
    }

    /// Forget favorites and the match result.
    pub fn clear(&self) {
        self.favorites.lock().expect("favorites lock poisoned").clear();
        *self.result.lock().expect("match lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pawmatch_test_utils::mixed_shelter;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::providers::mock::{Endpoint, MockClient};

    struct Fixture {
        client: Arc<MockClient>,
        notifier: Arc<RecordingNotifier>,
        engine: MatchEngine<MockClient>,
    }

    fn fixture() -> Fixture {
        let client = Arc::new(MockClient::with_dogs(mixed_shelter()));
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = MatchEngine::new(client.clone(), notifier.clone());
        Fixture {
            client,
            notifier,
            engine,
        }
    }

    fn displayed() -> Vec<DogId> {
        ["1", "2", "3"].map(String::from).to_vec()
    }

    #[test]
    fn toggle_adds_and_removes() {
        let Fixture { engine, .. } = fixture();
        assert_eq!(engine.toggle_favorite("1", &displayed()), Ok(true));
        assert!(engine.favorites().contains("1"));
        assert_eq!(engine.toggle_favorite("1", &displayed()), Ok(false));
        assert!(engine.favorites().is_empty());
    }

    #[test]
    fn only_displayed_dogs_can_be_added() {
        let Fixture { engine, .. } = fixture();
        assert_eq!(
            engine.toggle_favorite("4", &displayed()),
            Err(FavoriteError::NotDisplayed("4".to_string()))
        );

        engine.toggle_favorite("1", &displayed()).unwrap();
        // removal works after the dog scrolled out of view
        assert_eq!(engine.toggle_favorite("1", &[]), Ok(false));
    }

    #[tokio::test]
    async fn empty_favorites_disable_matching() {
        let Fixture { client, engine, .. } = fixture();
        assert!(!engine.can_match());
        assert!(matches!(engine.request_match().await, MatchOutcome::Disabled));
        assert_eq!(client.calls(Endpoint::Match), 0);
    }

    #[tokio::test]
    async fn match_result_is_full_record_of_matched_dog() {
        let Fixture {
            client,
            notifier,
            engine,
        } = fixture();
        client.set_match(Some("2".to_string()));
        for id in displayed() {
            engine.toggle_favorite(&id, &displayed()).unwrap();
        }

        let MatchOutcome::Matched(dog) = engine.request_match().await else {
            panic!("expected a match");
        };
        assert_eq!(dog, mixed_shelter()[1]);
        assert_eq!(engine.match_result(), Some(dog));
        assert!(matches!(
            notifier.notifications().as_slice(),
            [Notification::Success(msg)] if msg.contains("Rex")
        ));
    }

    #[tokio::test]
    async fn failed_match_keeps_previous_result() {
        let Fixture {
            client,
            notifier,
            engine,
        } = fixture();
        engine.toggle_favorite("1", &displayed()).unwrap();
        let MatchOutcome::Matched(first) = engine.request_match().await else {
            panic!("expected a match");
        };

        client.push_failure(Endpoint::Match, StatusCode::BAD_GATEWAY);
        let outcome = engine.request_match().await;
        assert!(matches!(outcome, MatchOutcome::Failed(MatchError::Client(_))));
        assert_eq!(engine.match_result(), Some(first));
        assert!(matches!(
            notifier.notifications().last(),
            Some(Notification::Error(_))
        ));
    }

    #[tokio::test]
    async fn no_match_is_reported() {
        let Fixture {
            client,
            notifier,
            engine,
        } = fixture();
        client.set_match(Some("5".to_string()));
        engine.toggle_favorite("1", &displayed()).unwrap();

        assert!(matches!(engine.request_match().await, MatchOutcome::NoMatch));
        assert_eq!(engine.match_result(), None);
        assert!(matches!(
            notifier.notifications().as_slice(),
            [Notification::Info(_)]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn only_one_match_in_flight() {
        let Fixture { client, engine, .. } = fixture();
        engine.toggle_favorite("1", &displayed()).unwrap();
        client.push_delay(Endpoint::Match, Duration::from_millis(100));

        let (first, second) = tokio::join!(engine.request_match(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            engine.request_match().await
        });

        assert!(matches!(first, MatchOutcome::Matched(_)));
        assert!(matches!(second, MatchOutcome::AlreadyPending));
        assert_eq!(client.calls(Endpoint::Match), 1);

        // the flag is released once the request finishes
        assert!(matches!(engine.request_match().await, MatchOutcome::Matched(_)));
    }

    #[tokio::test]
    async fn clear_forgets_favorites_and_result() {
        let Fixture { engine, .. } = fixture();
        engine.toggle_favorite("1", &displayed()).unwrap();
        engine.request_match().await;

        engine.clear();
        assert!(engine.favorites().is_empty());
        assert_eq!(engine.match_result(), None);
    }
}
