/// Persistent watchlist storage
///
/// The watchlist is an injected service: the session and the HTTP layer hold an
/// `Arc<dyn WatchlistStore>`, so the on-disk store can be swapped for the
/// in-memory one in tests.
use crate::{
    error::AppResult,
    models::{Candidate, MovieId, WatchlistEntry},
};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileWatchlistStore;
pub use memory::MemoryWatchlistStore;

#[async_trait::async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Stores a snapshot of the candidate.
    ///
    /// Idempotent on the movie id: returns `false` and leaves the existing
    /// entry untouched when the id is already present.
    async fn add(&self, movie: Candidate) -> AppResult<bool>;

    /// Removes an entry, returning whether it existed
    async fn remove(&self, id: MovieId) -> AppResult<bool>;

    /// All entries in insertion order
    async fn list(&self) -> AppResult<Vec<WatchlistEntry>>;

    async fn contains(&self, id: MovieId) -> AppResult<bool>;
}

/// Entry list mutations shared by the store implementations
pub(crate) fn insert_unique(entries: &mut Vec<WatchlistEntry>, movie: Candidate) -> bool {
    if entries.iter().any(|e| e.id() == movie.id) {
        return false;
    }
    entries.push(WatchlistEntry::new(movie));
    true
}

pub(crate) fn remove_by_id(entries: &mut Vec<WatchlistEntry>, id: MovieId) -> bool {
    let before = entries.len();
    entries.retain(|e| e.id() != id);
    entries.len() != before
}
