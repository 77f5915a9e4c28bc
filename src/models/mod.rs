use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

pub mod detail;

pub use detail::{
    CastMember, CrewMember, ExtendedDetail, Genre, ProviderAvailability, TmdbMovieDetails,
    TmdbRegionProviders, TmdbWatchProviders, Video, WatchProvider,
};

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// TMDB numeric movie identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Image sizes served by the TMDB image CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// Card artwork
    W500,
    /// Thumbnails (detail panel header, watchlist grid)
    W342,
    /// Full-resolution backdrops and provider logos
    Original,
}

impl ImageSize {
    fn as_path_segment(self) -> &'static str {
        match self {
            ImageSize::W500 => "w500",
            ImageSize::W342 => "w342",
            ImageSize::Original => "original",
        }
    }
}

/// Builds a CDN URL for an image path returned by the catalog
pub fn image_url(path: &str, size: ImageSize) -> String {
    format!("{}/{}{}", IMAGE_BASE_URL, size.as_path_segment(), path)
}

/// One browsable movie in the discovery sequence.
///
/// Field names follow the catalog's list payload so a page of results
/// deserializes straight into candidates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "deserialize_release_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl Candidate {
    pub fn poster_url(&self, size: ImageSize) -> Option<String> {
        self.poster_path.as_deref().map(|p| image_url(p, size))
    }

    pub fn backdrop_url(&self) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .map(|p| image_url(p, ImageSize::Original))
    }

    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }
}

/// The catalog sends `""` for unreleased titles. Empty or unparseable dates
/// become `None` so one odd record cannot fail a whole page.
fn deserialize_release_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Ok(Some(date)),
            Err(e) => {
                tracing::debug!(release_date = %s, error = %e, "Ignoring unparseable release date");
                Ok(None)
            }
        },
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Page {
    pub page: u32,
    #[serde(default)]
    pub results: Vec<Candidate>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

impl Page {
    /// An empty page, used when the starting fetch failed
    pub fn empty(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }
}

/// The two gesture-resolved decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Keep,
    Discard,
}

/// A decision taken on the candidate that was at the cursor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub candidate: Candidate,
    pub direction: Direction,
    /// Cursor position the candidate occupied
    pub position: usize,
}

/// A persisted, user-confirmed candidate snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    #[serde(flatten)]
    pub movie: Candidate,
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(movie: Candidate) -> Self {
        Self {
            movie,
            added_at: Utc::now(),
        }
    }

    pub fn id(&self) -> MovieId {
        self.movie.id
    }
}

/// How a title must be offered by the providers to pass the discover filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MonetizationType {
    Flatrate,
    Free,
    Ads,
    Rent,
    Buy,
}

impl MonetizationType {
    pub fn as_str(self) -> &'static str {
        match self {
            MonetizationType::Flatrate => "flatrate",
            MonetizationType::Free => "free",
            MonetizationType::Ads => "ads",
            MonetizationType::Rent => "rent",
            MonetizationType::Buy => "buy",
        }
    }
}

/// Filters for the discover endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverFilters {
    pub watch_region: String,
    /// Provider ids, any of which may carry the title
    pub watch_providers: Vec<u32>,
    pub monetization_type: MonetizationType,
    pub sort_by: String,
}

impl DiscoverFilters {
    /// Provider ids joined with `|`, the catalog's OR syntax
    pub fn providers_param(&self) -> String {
        self.watch_providers
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Stable key fragment used to cache discover pages per filter set
    pub fn cache_fragment(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.watch_region.to_lowercase(),
            self.providers_param(),
            self.monetization_type.as_str(),
            self.sort_by
        )
    }
}

impl Default for DiscoverFilters {
    fn default() -> Self {
        Self {
            watch_region: "IT".to_string(),
            watch_providers: vec![8, 119],
            monetization_type: MonetizationType::Flatrate,
            sort_by: "popularity.desc".to_string(),
        }
    }
}
