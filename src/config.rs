use serde::Deserialize;
use std::path::PathBuf;

use crate::models::{DiscoverFilters, MonetizationType};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API read access token (v4 bearer token)
    pub tmdb_read_token: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Language sent with every catalog request
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Region used for discover filtering and provider lookups
    #[serde(default = "default_watch_region")]
    pub watch_region: String,

    /// Pipe-separated TMDB provider ids (OR semantics), e.g. "8|119"
    #[serde(default = "default_watch_providers")]
    pub watch_providers: String,

    #[serde(default = "default_monetization_type")]
    pub monetization_type: MonetizationType,

    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    /// Redis connection URL. Catalog responses are not cached when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Watchlist file location. Defaults to the platform data directory.
    #[serde(default)]
    pub watchlist_path: Option<PathBuf>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound (inclusive) of the random starting page
    #[serde(default = "default_start_page_max")]
    pub start_page_max: u32,

    /// Remaining-buffer threshold that triggers a prefetch
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,

    /// Horizontal displacement a release must exceed to count as a decision
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f64,

    /// Fixed RNG seed. Leave unset outside of tests and demos.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_language() -> String {
    "it-IT".to_string()
}

fn default_watch_region() -> String {
    "IT".to_string()
}

fn default_watch_providers() -> String {
    // Netflix (8) OR Prime Video (119)
    "8|119".to_string()
}

fn default_monetization_type() -> MonetizationType {
    MonetizationType::Flatrate
}

fn default_sort_by() -> String {
    "popularity.desc".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_start_page_max() -> u32 {
    50
}

fn default_low_water_mark() -> usize {
    5
}

fn default_swipe_threshold() -> f64 {
    150.0
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Discover filters built from the configured region and provider set
    pub fn discover_filters(&self) -> DiscoverFilters {
        DiscoverFilters {
            watch_region: self.watch_region.clone(),
            watch_providers: self
                .watch_providers
                .split('|')
                .filter_map(|id| id.trim().parse().ok())
                .collect(),
            monetization_type: self.monetization_type,
            sort_by: self.sort_by.clone(),
        }
    }

    /// Resolves where the watchlist file lives:
    /// 1. `WATCHLIST_PATH`
    /// 2. `<data dir>/movie-swiper/watchlist.json`
    /// 3. `./movie-swiper-watchlist.json`
    pub fn resolve_watchlist_path(&self) -> PathBuf {
        if let Some(path) = &self.watchlist_path {
            return path.clone();
        }

        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("movie-swiper").join("watchlist.json");
        }

        PathBuf::from("movie-swiper-watchlist.json")
    }
}
