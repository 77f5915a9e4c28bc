use tokio::sync::RwLock;

use super::{insert_unique, remove_by_id, WatchlistStore};
use crate::{
    error::AppResult,
    models::{Candidate, MovieId, WatchlistEntry},
};

/// Watchlist kept only in memory. Lost when the process exits.
#[derive(Default)]
pub struct MemoryWatchlistStore {
    entries: RwLock<Vec<WatchlistEntry>>,
}

impl MemoryWatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<WatchlistEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait::async_trait]
impl WatchlistStore for MemoryWatchlistStore {
    async fn add(&self, movie: Candidate) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        Ok(insert_unique(&mut entries, movie))
    }

    async fn remove(&self, id: MovieId) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        Ok(remove_by_id(&mut entries, id))
    }

    async fn list(&self) -> AppResult<Vec<WatchlistEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn contains(&self, id: MovieId) -> AppResult<bool> {
        Ok(self.entries.read().await.iter().any(|e| e.id() == id))
    }
}
