use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::{insert_unique, remove_by_id, WatchlistStore};
use crate::{
    error::{AppError, AppResult},
    models::{Candidate, MovieId, WatchlistEntry},
};

const FORMAT_VERSION: u32 = 1;

/// On-disk layout of the watchlist file
#[derive(Debug, Serialize, Deserialize)]
struct WatchlistDocument {
    version: u32,
    entries: Vec<WatchlistEntry>,
}

/// Watchlist persisted as a single JSON document.
///
/// Every mutation rewrites the whole file through a temp file + rename. The
/// in-memory list is only updated once the write succeeded, so a failed write
/// leaves both copies as they were.
pub struct JsonFileWatchlistStore {
    path: PathBuf,
    entries: RwLock<Vec<WatchlistEntry>>,
}

impl JsonFileWatchlistStore {
    /// Opens the store at `path`.
    ///
    /// Never fails: a missing file is an empty watchlist, and an unreadable or
    /// malformed one is moved aside to `<file>.corrupt` and replaced by an
    /// empty watchlist.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load(&path).await;

        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            "Watchlist loaded"
        );

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> Vec<WatchlistEntry> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Watchlist unreadable, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<WatchlistDocument>(&content) {
            Ok(document) => dedupe(document.entries),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Malformed watchlist file, resetting to empty"
                );
                Self::quarantine(path).await;
                Vec::new()
            }
        }
    }

    async fn quarantine(path: &Path) {
        let backup = sibling(path, "corrupt");
        if let Err(e) = tokio::fs::rename(path, &backup).await {
            tracing::warn!(error = %e, backup = %backup.display(), "Could not move malformed watchlist aside");
        }
    }

    async fn persist(&self, entries: &[WatchlistEntry]) -> AppResult<()> {
        let document = WatchlistDocument {
            version: FORMAT_VERSION,
            entries: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence_error("create directory", parent, e))?;
        }

        let tmp = sibling(&self.path, "tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| persistence_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| persistence_error("replace", &self.path, e))?;

        tracing::debug!(path = %self.path.display(), entries = entries.len(), "Watchlist persisted");
        Ok(())
    }
}

#[async_trait::async_trait]
impl WatchlistStore for JsonFileWatchlistStore {
    async fn add(&self, movie: Candidate) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        let movie_id = movie.id;

        let mut updated = entries.clone();
        if !insert_unique(&mut updated, movie) {
            return Ok(false);
        }

        self.persist(&updated).await?;
        *entries = updated;

        tracing::info!(movie_id = %movie_id, total = entries.len(), "Added to watchlist");
        Ok(true)
    }

    async fn remove(&self, id: MovieId) -> AppResult<bool> {
        let mut entries = self.entries.write().await;

        let mut updated = entries.clone();
        if !remove_by_id(&mut updated, id) {
            return Ok(false);
        }

        self.persist(&updated).await?;
        *entries = updated;

        tracing::info!(movie_id = %id, total = entries.len(), "Removed from watchlist");
        Ok(true)
    }

    async fn list(&self) -> AppResult<Vec<WatchlistEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn contains(&self, id: MovieId) -> AppResult<bool> {
        Ok(self.entries.read().await.iter().any(|e| e.id() == id))
    }
}

/// `watchlist.json` -> `watchlist.json.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn persistence_error(action: &str, path: &Path, e: std::io::Error) -> AppError {
    AppError::Persistence(format!("failed to {} {}: {}", action, path.display(), e))
}

/// Keeps the first entry for each id
fn dedupe(entries: Vec<WatchlistEntry>) -> Vec<WatchlistEntry> {
    let mut seen = HashSet::new();
    entries.into_iter().filter(|e| seen.insert(e.id())).collect()
}
