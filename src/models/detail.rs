use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{image_url, ImageSize, MovieId};

/// Providers shown per group in the detail panel
const PROVIDERS_PER_GROUP: usize = 5;

/// On-demand enrichment of a candidate, shown in the confirmation panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtendedDetail {
    pub id: MovieId,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<String>,
    pub tagline: Option<String>,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
    pub videos: Vec<Video>,
}

impl ExtendedDetail {
    /// Runtime as `"2h 28m"`, or `"N/A"` when the catalog has none
    pub fn formatted_runtime(&self) -> String {
        match self.runtime_minutes {
            Some(minutes) if minutes > 0 => format!("{}h {}m", minutes / 60, minutes % 60),
            _ => "N/A".to_string(),
        }
    }

    pub fn directors(&self) -> Vec<&str> {
        self.crew
            .iter()
            .filter(|member| member.job == "Director")
            .map(|member| member.name.as_str())
            .collect()
    }

    /// First trailer hosted on YouTube, if any
    pub fn trailer(&self) -> Option<&Video> {
        self.videos
            .iter()
            .find(|video| video.video_type == "Trailer" && video.site == "YouTube")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

impl Video {
    pub fn url(&self) -> Option<String> {
        match self.site.as_str() {
            "YouTube" => Some(format!("https://www.youtube.com/watch?v={}", self.key)),
            "Vimeo" => Some(format!("https://vimeo.com/{}", self.key)),
            _ => None,
        }
    }
}

/// Where a movie can be watched in one region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderAvailability {
    pub id: MovieId,
    pub region: String,
    pub link: Option<String>,
    pub flatrate: Vec<WatchProvider>,
    pub rent: Vec<WatchProvider>,
    pub buy: Vec<WatchProvider>,
}

impl ProviderAvailability {
    /// No streaming, rental or purchase option: cinema-only or not out yet
    pub fn is_empty(&self) -> bool {
        self.flatrate.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }

    /// Display groups in panel order, empty groups skipped, capped per group
    pub fn groups(&self) -> Vec<(&'static str, &[WatchProvider])> {
        [
            ("streaming", self.flatrate.as_slice()),
            ("rent", self.rent.as_slice()),
            ("buy", self.buy.as_slice()),
        ]
        .into_iter()
        .filter(|(_, list)| !list.is_empty())
        .map(|(name, list)| (name, &list[..list.len().min(PROVIDERS_PER_GROUP)]))
        .collect()
    }

    /// Extracts one region from the catalog's per-region response
    pub fn from_response(response: TmdbWatchProviders, region: &str) -> Option<Self> {
        let TmdbWatchProviders { id, mut results } = response;
        let providers = results.remove(region)?;

        Some(Self {
            id,
            region: region.to_string(),
            link: providers.link,
            flatrate: sorted_by_priority(providers.flatrate),
            rent: sorted_by_priority(providers.rent),
            buy: sorted_by_priority(providers.buy),
        })
    }
}

fn sorted_by_priority(mut list: Vec<WatchProvider>) -> Vec<WatchProvider> {
    list.sort_by_key(|p| p.display_priority);
    list
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchProvider {
    pub provider_id: u32,
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub display_priority: u32,
}

impl WatchProvider {
    pub fn logo_url(&self) -> Option<String> {
        self.logo_path
            .as_deref()
            .map(|p| image_url(p, ImageSize::Original))
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw response from GET /movie/{id}?append_to_response=credits,videos
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: MovieId,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub videos: Option<TmdbVideos>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<Video>,
}

impl From<TmdbMovieDetails> for ExtendedDetail {
    fn from(details: TmdbMovieDetails) -> Self {
        let credits = details.credits.unwrap_or_default();

        ExtendedDetail {
            id: details.id,
            runtime_minutes: details.runtime,
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            tagline: details.tagline.filter(|t| !t.trim().is_empty()),
            cast: credits.cast,
            crew: credits.crew,
            videos: details.videos.unwrap_or_default().results,
        }
    }
}

/// Raw response from GET /movie/{id}/watch/providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbWatchProviders {
    pub id: MovieId,
    #[serde(default)]
    pub results: HashMap<String, TmdbRegionProviders>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TmdbRegionProviders {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub flatrate: Vec<WatchProvider>,
    #[serde(default)]
    pub rent: Vec<WatchProvider>,
    #[serde(default)]
    pub buy: Vec<WatchProvider>,
}
