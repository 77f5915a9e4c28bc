//! Swipe session: the deck, the confirmation panel and the watchlist wired
//! to the catalog.
//!
//! All state sits behind one async mutex, so decisions are serialized and a
//! fetched page is appended in a single step. Catalog calls run in spawned
//! tasks and never hold the lock while awaiting the network; a failed call is
//! logged and treated as "no data".

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    db::WatchlistStore,
    error::AppResult,
    models::{Candidate, Decision, Direction, DiscoverFilters, MovieId, WatchlistEntry},
    services::{
        deck::{DeckEngine, DeckSummary, PageRequest, DEFAULT_LOW_WATER_MARK},
        detail_panel::{DetailPanel, PanelView},
        gesture::{resolve_gesture, DragRelease, GestureOutcome, DEFAULT_SWIPE_THRESHOLD},
        providers::{tmdb::MAX_PAGE, CatalogClient},
    },
};

/// Oldest notices are dropped past this many
const MAX_NOTICES: usize = 20;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub filters: DiscoverFilters,
    /// The starting page is drawn uniformly from `1..=start_page_max`
    pub start_page_max: u32,
    pub low_water_mark: usize,
    pub swipe_threshold: f64,
    /// Fixes the start page and every shuffle. Unset in production.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            filters: DiscoverFilters::default(),
            start_page_max: 50,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            filters: config.discover_filters(),
            start_page_max: config.start_page_max,
            low_water_mark: config.low_water_mark,
            swipe_threshold: config.swipe_threshold,
            seed: config.shuffle_seed,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient user-facing message (toast)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// How a swipe on a card was handled
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwipeOutcome {
    Decided {
        movie_id: MovieId,
        direction: Direction,
    },
    /// Released below the threshold; the card stays on top
    SnapBack,
    /// Only the top card can be dragged
    NotTopCard { top: MovieId },
    /// No card to swipe
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmOutcome {
    Added { movie_id: MovieId },
    AlreadyInWatchlist { movie_id: MovieId },
    /// The store rejected the write; a notice was queued
    Failed { movie_id: MovieId },
    NothingPending,
}

struct SessionState {
    deck: DeckEngine,
    panel: DetailPanel,
    notices: VecDeque<Notice>,
}

impl SessionState {
    fn notify(&mut self, level: NoticeLevel, message: String) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            message,
            created_at: Utc::now(),
        });
    }
}

#[derive(Clone)]
pub struct SwipeSession {
    state: Arc<Mutex<SessionState>>,
    catalog: Arc<dyn CatalogClient>,
    watchlist: Arc<dyn WatchlistStore>,
    filters: Arc<DiscoverFilters>,
    swipe_threshold: f64,
}

impl SwipeSession {
    /// Fetches a random starting page and builds the deck from it.
    ///
    /// A failed first fetch yields an empty deck that immediately asks for
    /// the following page. An empty first page exhausts the deck, unless the
    /// catalog reports fewer pages than the one drawn, in which case page 1
    /// is fetched instead.
    pub async fn start(
        catalog: Arc<dyn CatalogClient>,
        watchlist: Arc<dyn WatchlistStore>,
        config: SessionConfig,
    ) -> Self {
        let mut rng = config.rng();
        let mut start_page = rng.random_range(1..=config.start_page_max.clamp(1, MAX_PAGE));

        let mut fetched = catalog.discover(start_page, &config.filters).await;
        if let Ok(page) = &fetched {
            if page.results.is_empty() && page.total_pages > 0 && page.total_pages < start_page {
                tracing::info!(
                    page = start_page,
                    total_pages = page.total_pages,
                    provider = catalog.name(),
                    "Starting page past the end of the catalog, retrying from page 1"
                );
                start_page = 1;
                fetched = catalog.discover(start_page, &config.filters).await;
            }
        }

        let deck = match fetched {
            Ok(page) => {
                tracing::info!(
                    page = start_page,
                    results = page.results.len(),
                    provider = catalog.name(),
                    "Starting page fetched"
                );
                DeckEngine::new(page, start_page, config.low_water_mark, rng)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    page = start_page,
                    provider = catalog.name(),
                    "Starting page fetch failed, deck starts empty"
                );
                DeckEngine::after_failed_start(start_page, config.low_water_mark, rng)
            }
        };

        let session = Self::from_deck(deck, catalog, watchlist, config.filters, config.swipe_threshold);
        session.refill().await;
        session
    }

    /// Wraps an existing deck without fetching anything
    pub fn from_deck(
        deck: DeckEngine,
        catalog: Arc<dyn CatalogClient>,
        watchlist: Arc<dyn WatchlistStore>,
        filters: DiscoverFilters,
        swipe_threshold: f64,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                deck,
                panel: DetailPanel::new(),
                notices: VecDeque::new(),
            })),
            catalog,
            watchlist,
            filters: Arc::new(filters),
            swipe_threshold,
        }
    }

    pub async fn visible_window(&self, n: usize) -> Vec<Candidate> {
        self.state.lock().await.deck.visible_window(n).to_vec()
    }

    pub async fn summary(&self) -> DeckSummary {
        self.state.lock().await.deck.summary()
    }

    pub async fn panel(&self) -> PanelView {
        self.state.lock().await.panel.view()
    }

    pub async fn pending_candidate(&self) -> Option<Candidate> {
        self.state.lock().await.panel.pending_candidate().cloned()
    }

    /// Handles the release of a dragged card
    pub async fn swipe(&self, movie_id: MovieId, release: DragRelease) -> SwipeOutcome {
        let mut state = self.state.lock().await;

        let top = match state.deck.top() {
            Some(top) => top.id,
            None => return SwipeOutcome::Empty,
        };
        if top != movie_id {
            tracing::debug!(movie_id = %movie_id, top = %top, "Ignoring drag on a card below the top");
            return SwipeOutcome::NotTopCard { top };
        }

        match resolve_gesture(release, self.swipe_threshold) {
            GestureOutcome::SnapBack => SwipeOutcome::SnapBack,
            GestureOutcome::Decided(direction) => match self.decide_locked(&mut state, direction) {
                Some(decision) => SwipeOutcome::Decided {
                    movie_id: decision.candidate.id,
                    direction,
                },
                None => SwipeOutcome::Empty,
            },
        }
    }

    /// Decides on the top card directly (button controls)
    pub async fn decide(&self, direction: Direction) -> Option<Decision> {
        let mut state = self.state.lock().await;
        self.decide_locked(&mut state, direction)
    }

    fn decide_locked(&self, state: &mut SessionState, direction: Direction) -> Option<Decision> {
        let outcome = state.deck.decide(direction)?;
        let candidate = &outcome.decision.candidate;

        tracing::info!(
            movie_id = %candidate.id,
            title = %candidate.title,
            direction = ?direction,
            cursor = state.deck.cursor(),
            "Swipe decided"
        );

        if direction == Direction::Keep {
            state.panel.open(candidate.clone());
            self.spawn_lookups(candidate.id);
        }

        if let Some(request) = outcome.prefetch {
            self.spawn_prefetch(request);
        }

        Some(outcome.decision)
    }

    /// Re-applies the refill policy, e.g. after a failed fetch left the deck
    /// drained with no decision left to trigger a retry
    pub async fn refill(&self) -> Option<PageRequest> {
        let request = self.state.lock().await.deck.poll_refill();
        if let Some(request) = request {
            self.spawn_prefetch(request);
        }
        request
    }

    /// Commits the pending candidate to the watchlist and closes the panel
    pub async fn confirm(&self) -> ConfirmOutcome {
        let Some(candidate) = self.state.lock().await.panel.confirm() else {
            return ConfirmOutcome::NothingPending;
        };
        let movie_id = candidate.id;
        let title = candidate.title.clone();

        match self.watchlist.add(candidate).await {
            Ok(true) => {
                self.notify(NoticeLevel::Info, format!("\"{}\" added to your watchlist", title))
                    .await;
                ConfirmOutcome::Added { movie_id }
            }
            Ok(false) => ConfirmOutcome::AlreadyInWatchlist { movie_id },
            Err(e) => {
                tracing::error!(error = %e, movie_id = %movie_id, "Failed to save watchlist entry");
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not save \"{}\" to your watchlist", title),
                )
                .await;
                ConfirmOutcome::Failed { movie_id }
            }
        }
    }

    /// Closes the panel without saving. The card stays consumed.
    pub async fn cancel(&self) -> Option<Candidate> {
        let cancelled = self.state.lock().await.panel.cancel();
        if let Some(candidate) = &cancelled {
            tracing::info!(movie_id = %candidate.id, "Confirmation cancelled");
        }
        cancelled
    }

    pub async fn watchlist(&self) -> AppResult<Vec<WatchlistEntry>> {
        self.watchlist.list().await
    }

    /// Removes a watchlist entry; a failed write queues a notice
    pub async fn remove_from_watchlist(&self, id: MovieId) -> AppResult<bool> {
        match self.watchlist.remove(id).await {
            Ok(removed) => Ok(removed),
            Err(e) => {
                tracing::error!(error = %e, movie_id = %id, "Failed to remove watchlist entry");
                self.notify(NoticeLevel::Error, "Could not update your watchlist".to_string())
                    .await;
                Err(e)
            }
        }
    }

    /// Drains queued notices, oldest first
    pub async fn take_notices(&self) -> Vec<Notice> {
        self.state.lock().await.notices.drain(..).collect()
    }

    async fn notify(&self, level: NoticeLevel, message: String) {
        self.state.lock().await.notify(level, message);
    }

    fn spawn_prefetch(&self, request: PageRequest) {
        let session = self.clone();
        tokio::spawn(async move {
            session.run_prefetch(request).await;
        });
    }

    /// Fetches `request` and keeps going while appended pages leave the
    /// buffer at or below the low-water mark
    async fn run_prefetch(&self, mut request: PageRequest) {
        loop {
            let result = self.catalog.discover(request.page, &self.filters).await;

            let mut state = self.state.lock().await;
            let next = match result {
                Ok(page) => state.deck.complete_prefetch(request, page),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        page = request.page,
                        provider = self.catalog.name(),
                        "Prefetch failed"
                    );
                    state.deck.fail_prefetch(request);
                    None
                }
            };
            drop(state);

            match next {
                Some(next) => request = next,
                None => break,
            }
        }
    }

    /// Starts the detail and provider lookups for the pending candidate.
    /// Each settles its own half of the panel.
    fn spawn_lookups(&self, id: MovieId) {
        let session = self.clone();
        tokio::spawn(async move {
            let detail = match session.catalog.get_detail(id).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!(error = %e, movie_id = %id, "Detail lookup failed");
                    None
                }
            };
            session.state.lock().await.panel.apply_detail(id, detail);
        });

        let session = self.clone();
        tokio::spawn(async move {
            let providers = match session.catalog.get_providers(id).await {
                Ok(providers) => providers,
                Err(e) => {
                    tracing::warn!(error = %e, movie_id = %id, "Provider lookup failed");
                    None
                }
            };
            session.state.lock().await.panel.apply_providers(id, providers);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryWatchlistStore;
    use crate::error::AppError;
    use crate::models::Page;
    use crate::services::detail_panel::PanelState;
    use crate::services::providers::MockCatalogClient;
    use std::time::Duration;

    fn candidate(id: u64) -> Candidate {
        Candidate {
            id: MovieId(id),
            title: format!("Movie {}", id),
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: 6.0,
            overview: String::new(),
            genre_ids: Vec::new(),
        }
    }

    fn page(number: u32, ids: std::ops::Range<u64>) -> Page {
        Page {
            page: number,
            results: ids.map(candidate).collect(),
            total_pages: 50,
            total_results: 1000,
        }
    }

    fn session_with(mock: MockCatalogClient, ids: std::ops::Range<u64>) -> SwipeSession {
        let deck = DeckEngine::new(page(1, ids), 1, 5, StdRng::seed_from_u64(3));
        SwipeSession::from_deck(
            deck,
            Arc::new(mock),
            Arc::new(MemoryWatchlistStore::new()),
            DiscoverFilters::default(),
            DEFAULT_SWIPE_THRESHOLD,
        )
    }

    async fn settle<F, Fut>(mut done: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if done().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session did not settle");
    }

    #[tokio::test]
    async fn test_start_uses_seeded_page_in_range() {
        let mut mock = MockCatalogClient::new();
        mock.expect_name().return_const("mock");
        mock.expect_discover()
            .withf(|page, _| (1..=50).contains(page))
            .times(1)
            .returning(|p, _| Ok(page(p, 0..20)));

        let config = SessionConfig {
            seed: Some(42),
            ..SessionConfig::default()
        };
        let session =
            SwipeSession::start(Arc::new(mock), Arc::new(MemoryWatchlistStore::new()), config).await;

        let summary = session.summary().await;
        assert_eq!(summary.buffered, 20);
        assert!(!summary.loading);
        assert_eq!(session.visible_window(3).await.len(), 3);
    }

    #[tokio::test]
    async fn test_start_survives_failed_fetch() {
        let mut mock = MockCatalogClient::new();
        mock.expect_name().return_const("mock");
        mock.expect_discover()
            .returning(|_, _| Err(AppError::ExternalApi("503".to_string())));

        let session = SwipeSession::start(
            Arc::new(mock),
            Arc::new(MemoryWatchlistStore::new()),
            SessionConfig::default(),
        )
        .await;

        let s = session.clone();
        settle(|| {
            let s = s.clone();
            async move { !s.summary().await.loading }
        })
        .await;

        assert!(session.visible_window(3).await.is_empty());
        assert_eq!(session.swipe(MovieId(1), DragRelease::new(300.0)).await, SwipeOutcome::Empty);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_exhausted_on_start() {
        let mut mock = MockCatalogClient::new();
        mock.expect_name().return_const("mock");
        mock.expect_discover()
            .times(1)
            .returning(|p, _| Ok(Page::empty(p)));

        let session = SwipeSession::start(
            Arc::new(mock),
            Arc::new(MemoryWatchlistStore::new()),
            SessionConfig::default(),
        )
        .await;

        let summary = session.summary().await;
        assert!(summary.exhausted);
        assert!(!summary.loading);
        assert!(session.refill().await.is_none());
    }

    #[tokio::test]
    async fn test_discard_swipe_advances_without_panel() {
        let mock = MockCatalogClient::new();
        let session = session_with(mock, 0..20);
        let top = session.visible_window(1).await[0].id;

        let outcome = session.swipe(top, DragRelease::new(-400.0)).await;

        assert_eq!(
            outcome,
            SwipeOutcome::Decided {
                movie_id: top,
                direction: Direction::Discard
            }
        );
        assert_eq!(session.summary().await.cursor, 1);
        assert_eq!(session.panel().await.state, PanelState::Closed);
    }

    #[tokio::test]
    async fn test_snap_back_and_non_top_card() {
        let mock = MockCatalogClient::new();
        let session = session_with(mock, 0..20);
        let window = session.visible_window(2).await;

        assert_eq!(
            session.swipe(window[0].id, DragRelease::new(100.0)).await,
            SwipeOutcome::SnapBack
        );
        assert_eq!(
            session.swipe(window[1].id, DragRelease::new(500.0)).await,
            SwipeOutcome::NotTopCard { top: window[0].id }
        );
        assert_eq!(session.summary().await.cursor, 0);
    }

    #[tokio::test]
    async fn test_keep_loads_panel_with_partial_failure() {
        let mut mock = MockCatalogClient::new();
        mock.expect_get_detail()
            .times(1)
            .returning(|_| Err(AppError::ExternalApi("timeout".to_string())));
        mock.expect_get_providers().times(1).returning(|id| {
            Ok(Some(crate::models::ProviderAvailability {
                id,
                region: "IT".to_string(),
                link: None,
                flatrate: vec![crate::models::WatchProvider {
                    provider_id: 119,
                    provider_name: "Amazon Prime Video".to_string(),
                    logo_path: None,
                    display_priority: 1,
                }],
                rent: Vec::new(),
                buy: Vec::new(),
            }))
        });

        let session = session_with(mock, 0..20);
        let decision = session.decide(Direction::Keep).await.unwrap();

        let s = session.clone();
        settle(|| {
            let s = s.clone();
            async move { s.panel().await.state == PanelState::Ready }
        })
        .await;

        let view = session.panel().await;
        assert_eq!(view.pending.unwrap().id, decision.candidate.id);
        assert!(view.detail.is_none());
        assert_eq!(view.providers.unwrap().flatrate.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_commits_original_candidate() {
        let mut mock = MockCatalogClient::new();
        mock.expect_get_detail().returning(|_| Ok(None));
        mock.expect_get_providers().returning(|_| Ok(None));

        let session = session_with(mock, 0..20);
        let decision = session.decide(Direction::Keep).await.unwrap();

        let outcome = session.confirm().await;
        assert_eq!(
            outcome,
            ConfirmOutcome::Added {
                movie_id: decision.candidate.id
            }
        );

        let entries = session.watchlist().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].movie, decision.candidate);
        assert_eq!(session.panel().await.state, PanelState::Closed);

        let notices = session.take_notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert!(session.take_notices().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_keep_is_not_reoffered() {
        let mut mock = MockCatalogClient::new();
        mock.expect_get_detail().returning(|_| Ok(None));
        mock.expect_get_providers().returning(|_| Ok(None));

        let session = session_with(mock, 0..20);
        let kept = session.decide(Direction::Keep).await.unwrap().candidate;

        assert_eq!(session.cancel().await.map(|c| c.id), Some(kept.id));
        assert!(session.watchlist().await.unwrap().is_empty());
        assert!(!session
            .visible_window(20)
            .await
            .iter()
            .any(|c| c.id == kept.id));
        assert_eq!(session.confirm().await, ConfirmOutcome::NothingPending);
    }

    #[tokio::test]
    async fn test_failed_prefetch_clears_loading() {
        let mut mock = MockCatalogClient::new();
        mock.expect_name().return_const("mock");
        mock.expect_discover()
            .withf(|page, _| *page == 2)
            .times(1)
            .returning(|_, _| Err(AppError::ExternalApi("502".to_string())));

        let session = session_with(mock, 0..6);
        let decision = session.decide(Direction::Discard).await;
        assert!(decision.is_some());

        let s = session.clone();
        settle(|| {
            let s = s.clone();
            async move { !s.summary().await.loading }
        })
        .await;

        assert_eq!(session.visible_window(3).await.len(), 3);
        assert_eq!(session.summary().await.buffered, 6);
    }
}
