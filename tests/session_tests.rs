mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::Semaphore;

use movie_swiper::{
    db::{JsonFileWatchlistStore, MemoryWatchlistStore, WatchlistStore},
    models::{Direction, MovieId},
    services::{
        detail_panel::PanelState,
        gesture::DragRelease,
        session::{ConfirmOutcome, NoticeLevel, SwipeOutcome},
        SwipeSession,
    },
};

use common::{session_config, wait_until, FailingStore, FakeCatalog};
use movie_swiper::services::SessionConfig;

async fn start(catalog: Arc<FakeCatalog>, store: Arc<dyn WatchlistStore>) -> SwipeSession {
    SwipeSession::start(catalog, store, session_config()).await
}

#[tokio::test]
async fn test_quick_decisions_share_one_prefetch() {
    let gate = Arc::new(Semaphore::new(0));
    let catalog = Arc::new(FakeCatalog::gated(6, gate.clone()));
    let session = start(catalog.clone(), Arc::new(MemoryWatchlistStore::new())).await;
    assert_eq!(catalog.calls(), 1);

    // 6 -> 5 remaining crosses the low-water mark, 5 -> 4 must not refetch
    session.decide(Direction::Discard).await.unwrap();
    session.decide(Direction::Discard).await.unwrap();

    wait_until(|| {
        let catalog = catalog.clone();
        async move { catalog.calls() == 2 }
    })
    .await;
    assert!(session.summary().await.loading);

    gate.add_permits(1);
    let s = session.clone();
    wait_until(|| {
        let s = s.clone();
        async move { !s.summary().await.loading }
    })
    .await;

    assert_eq!(catalog.calls(), 2);
    let summary = session.summary().await;
    assert_eq!(summary.cursor, 2);
    assert_eq!(summary.buffered, 12);
    assert_eq!(summary.next_page, 3);
}

#[tokio::test]
async fn test_cursor_advances_once_per_decision() {
    let catalog = Arc::new(FakeCatalog::new(20));
    let session = start(catalog, Arc::new(MemoryWatchlistStore::new())).await;

    let mut decided = Vec::new();
    for direction in [Direction::Keep, Direction::Discard, Direction::Keep] {
        let decision = session.decide(direction).await.unwrap();
        decided.push(decision.candidate.id);
    }
    session.cancel().await;

    assert_eq!(session.summary().await.cursor, 3);
    let window = session.visible_window(20).await;
    assert!(window.len() <= 20);
    assert!(window.iter().all(|c| !decided.contains(&c.id)));
}

#[tokio::test]
async fn test_catalog_outage_leaves_deck_usable() {
    let catalog = Arc::new(FakeCatalog::new(10));
    catalog.fail_discover.store(true, Ordering::SeqCst);
    let session = start(catalog.clone(), Arc::new(MemoryWatchlistStore::new())).await;

    let s = session.clone();
    wait_until(|| {
        let s = s.clone();
        async move { !s.summary().await.loading }
    })
    .await;

    assert!(session.visible_window(3).await.is_empty());
    assert_eq!(
        session.swipe(MovieId(1000), DragRelease::new(400.0)).await,
        SwipeOutcome::Empty
    );

    // Catalog recovers; a manual refill fetches the next page
    catalog.fail_discover.store(false, Ordering::SeqCst);
    assert!(session.refill().await.is_some());

    let s = session.clone();
    wait_until(|| {
        let s = s.clone();
        async move { !s.visible_window(3).await.is_empty() }
    })
    .await;
    assert_eq!(session.visible_window(3).await.len(), 3);
}

#[tokio::test]
async fn test_swipe_flow_confirms_into_store() {
    let catalog = Arc::new(FakeCatalog::new(20));
    let store = Arc::new(MemoryWatchlistStore::new());
    let session = start(catalog, store.clone()).await;

    let top = session.visible_window(1).await[0].clone();
    let outcome = session.swipe(top.id, DragRelease::new(220.0)).await;
    assert_eq!(
        outcome,
        SwipeOutcome::Decided {
            movie_id: top.id,
            direction: Direction::Keep
        }
    );

    let s = session.clone();
    wait_until(|| {
        let s = s.clone();
        async move { s.panel().await.state == PanelState::Ready }
    })
    .await;
    let view = session.panel().await;
    assert_eq!(view.detail.unwrap().formatted_runtime(), "2h 5m");

    assert_eq!(
        session.confirm().await,
        ConfirmOutcome::Added { movie_id: top.id }
    );
    assert!(store.contains(top.id).await.unwrap());
    assert_eq!(store.list().await.unwrap()[0].movie, top);
}

#[tokio::test]
async fn test_detail_failure_still_shows_providers() {
    let catalog = Arc::new(FakeCatalog::new(20));
    catalog.fail_detail.store(true, Ordering::SeqCst);
    let session = start(catalog, Arc::new(MemoryWatchlistStore::new())).await;

    session.decide(Direction::Keep).await.unwrap();

    let s = session.clone();
    wait_until(|| {
        let s = s.clone();
        async move { s.panel().await.state == PanelState::Ready }
    })
    .await;

    let view = session.panel().await;
    assert!(view.detail.is_none());
    assert_eq!(view.providers.unwrap().flatrate[0].provider_name, "Netflix");
}

#[tokio::test]
async fn test_unconfirmed_keep_leaves_store_unchanged() {
    let catalog = Arc::new(FakeCatalog::new(20));
    let store = Arc::new(MemoryWatchlistStore::new());
    let session = start(catalog, store.clone()).await;

    let kept = session.decide(Direction::Keep).await.unwrap().candidate;
    // A second keep supersedes the first pending candidate
    let second = session.decide(Direction::Keep).await.unwrap().candidate;
    assert_eq!(session.pending_candidate().await.map(|c| c.id), Some(second.id));

    session.cancel().await;

    assert!(store.list().await.unwrap().is_empty());
    let window = session.visible_window(20).await;
    assert!(!window.iter().any(|c| c.id == kept.id || c.id == second.id));
}

#[tokio::test]
async fn test_store_failure_becomes_notice() {
    let catalog = Arc::new(FakeCatalog::new(20));
    let session = start(catalog, Arc::new(FailingStore)).await;

    let kept = session.decide(Direction::Keep).await.unwrap().candidate;
    assert_eq!(
        session.confirm().await,
        ConfirmOutcome::Failed { movie_id: kept.id }
    );

    assert_eq!(session.panel().await.state, PanelState::Closed);
    let notices = session.take_notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);

    // The session keeps going
    assert!(session.decide(Direction::Discard).await.is_some());
}

#[tokio::test]
async fn test_confirmed_entry_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watchlist.json");

    let catalog = Arc::new(FakeCatalog::new(20));
    let store = Arc::new(JsonFileWatchlistStore::open(&path).await);
    let session = start(catalog, store.clone()).await;

    session.decide(Direction::Keep).await.unwrap();
    session.confirm().await;

    let before = store.list().await.unwrap();
    let reloaded = JsonFileWatchlistStore::open(&path).await;
    assert_eq!(reloaded.list().await.unwrap(), before);
    assert_eq!(before.len(), 1);
}

#[tokio::test]
async fn test_region_without_titles_fetches_once() {
    let catalog = Arc::new(FakeCatalog::new(0));
    let session = start(catalog.clone(), Arc::new(MemoryWatchlistStore::new())).await;

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(catalog.calls(), 1);
    let summary = session.summary().await;
    assert!(summary.exhausted);
    assert!(!summary.loading);
    assert!(session.visible_window(3).await.is_empty());
}

#[tokio::test]
async fn test_start_page_past_catalog_end_falls_back_to_first_page() {
    let catalog = Arc::new(FakeCatalog::new(10).with_total_pages(1));
    let config = SessionConfig {
        start_page_max: 50,
        seed: Some(11),
        ..SessionConfig::default()
    };
    let session =
        SwipeSession::start(catalog.clone(), Arc::new(MemoryWatchlistStore::new()), config).await;

    // Either page 1 was drawn directly or the empty page triggered one retry
    assert!(catalog.calls() <= 2);
    let window = session.visible_window(20).await;
    assert_eq!(window.len(), 10);
    assert!(window.iter().all(|c| (1000..1010).contains(&c.id.0)));
    assert!(!session.summary().await.exhausted);
}
