#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use movie_swiper::{
    db::WatchlistStore,
    error::{AppError, AppResult},
    models::{
        Candidate, DiscoverFilters, ExtendedDetail, MovieId, Page, ProviderAvailability,
        WatchProvider, WatchlistEntry,
    },
    services::{CatalogClient, SessionConfig},
};

/// Canned catalog: page `p` holds ids `p * 1000 .. p * 1000 + page_size`
pub struct FakeCatalog {
    pub page_size: u64,
    pub total_pages: u32,
    pub discover_calls: AtomicUsize,
    pub fail_discover: AtomicBool,
    pub fail_detail: AtomicBool,
    /// When set, fetches of pages after the first wait for a permit
    gate: Option<Arc<Semaphore>>,
}

impl FakeCatalog {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size,
            total_pages: 50,
            discover_calls: AtomicUsize::new(0),
            fail_discover: AtomicBool::new(false),
            fail_detail: AtomicBool::new(false),
            gate: None,
        }
    }

    pub fn gated(page_size: u64, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(page_size)
        }
    }

    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.total_pages = total_pages;
        self
    }

    pub fn calls(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }
}

pub fn candidate(id: u64) -> Candidate {
    Candidate {
        id: MovieId(id),
        title: format!("Movie {}", id),
        poster_path: Some(format!("/poster{}.jpg", id)),
        backdrop_path: None,
        release_date: None,
        vote_average: 7.0,
        overview: "Overview".to_string(),
        genre_ids: vec![18],
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_popular(&self, page: u32) -> AppResult<Page> {
        self.discover(page, &DiscoverFilters::default()).await
    }

    async fn discover(&self, page: u32, _filters: &DiscoverFilters) -> AppResult<Page> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);

        if page > 1 {
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
        }

        if self.fail_discover.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi("TMDB returned 503".to_string()));
        }

        if page > self.total_pages {
            return Ok(Page {
                page,
                results: Vec::new(),
                total_pages: self.total_pages,
                total_results: self.total_pages * self.page_size as u32,
            });
        }

        let start = u64::from(page) * 1000;
        Ok(Page {
            page,
            results: (start..start + self.page_size).map(candidate).collect(),
            total_pages: self.total_pages,
            total_results: self.total_pages * self.page_size as u32,
        })
    }

    async fn get_detail(&self, id: MovieId) -> AppResult<Option<ExtendedDetail>> {
        if self.fail_detail.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi("timeout".to_string()));
        }
        Ok(Some(ExtendedDetail {
            id,
            runtime_minutes: Some(125),
            genres: vec!["Drama".to_string()],
            tagline: None,
            cast: Vec::new(),
            crew: Vec::new(),
            videos: Vec::new(),
        }))
    }

    async fn get_providers(&self, id: MovieId) -> AppResult<Option<ProviderAvailability>> {
        Ok(Some(ProviderAvailability {
            id,
            region: "IT".to_string(),
            link: None,
            flatrate: vec![WatchProvider {
                provider_id: 8,
                provider_name: "Netflix".to_string(),
                logo_path: Some("/netflix.jpg".to_string()),
                display_priority: 0,
            }],
            rent: Vec::new(),
            buy: Vec::new(),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Store whose writes always fail
pub struct FailingStore;

#[async_trait]
impl WatchlistStore for FailingStore {
    async fn add(&self, _movie: Candidate) -> AppResult<bool> {
        Err(AppError::Persistence("disk full".to_string()))
    }

    async fn remove(&self, _id: MovieId) -> AppResult<bool> {
        Err(AppError::Persistence("disk full".to_string()))
    }

    async fn list(&self) -> AppResult<Vec<WatchlistEntry>> {
        Ok(Vec::new())
    }

    async fn contains(&self, _id: MovieId) -> AppResult<bool> {
        Ok(false)
    }
}

/// Deterministic session settings starting on page 1
pub fn session_config() -> SessionConfig {
    SessionConfig {
        start_page_max: 1,
        seed: Some(7),
        ..SessionConfig::default()
    }
}

/// Polls `check` until it holds, failing the test after about a second
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
