/// TMDB (The Movie Database) catalog client
///
/// API Flow:
/// 1. Deck pages: /discover/movie (filtered) or /movie/popular
/// 2. Confirmation panel: /movie/{id}?append_to_response=credits,videos and
///    /movie/{id}/watch/providers, fetched concurrently
///
/// Every response is cached for an hour when Redis is configured.
use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        DiscoverFilters, ExtendedDetail, MovieId, Page, ProviderAvailability, TmdbMovieDetails,
        TmdbWatchProviders,
    },
    services::providers::CatalogClient,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

const CATALOG_CACHE_TTL: u64 = 3600; // 1 hour

/// Highest page the list endpoints will serve
pub const MAX_PAGE: u32 = 500;

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    read_token: String,
    api_url: String,
    language: String,
    region: String,
    cache: Cache,
}

impl TmdbClient {
    pub fn new(
        cache: Cache,
        read_token: String,
        api_url: String,
        language: String,
        region: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            read_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            region,
            cache,
        }
    }

    pub fn from_config(config: &Config, cache: Cache) -> Self {
        Self::new(
            cache,
            config.tmdb_read_token.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
            config.watch_region.clone(),
        )
    }

    /// Issues an authenticated GET. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> AppResult<Option<T>> {
        let url = format!("{}{}", self.api_url, endpoint);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.read_token)
            .query(&[("language", self.language.as_str())])
            .query(params)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(endpoint = %endpoint, "TMDB returned 404");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        tracing::debug!(endpoint = %endpoint, bytes = response_text.len(), "Raw TMDB response");

        let parsed = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                endpoint = %endpoint,
                "Failed to deserialize TMDB response"
            );
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })?;

        Ok(Some(parsed))
    }

    async fn get_page(&self, endpoint: &str, params: &[(&str, String)]) -> AppResult<Page> {
        self.get_json(endpoint, params)
            .await?
            .ok_or_else(|| AppError::ExternalApi(format!("TMDB endpoint {} not found", endpoint)))
    }

    fn validate_page(page: u32) -> AppResult<()> {
        if page == 0 || page > MAX_PAGE {
            return Err(AppError::InvalidInput(format!(
                "Page must be between 1 and {}, got {}",
                MAX_PAGE, page
            )));
        }
        Ok(())
    }

    fn discover_params(page: u32, filters: &DiscoverFilters) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", page.to_string()),
            ("watch_region", filters.watch_region.clone()),
            (
                "with_watch_monetization_types",
                filters.monetization_type.as_str().to_string(),
            ),
            ("sort_by", filters.sort_by.clone()),
        ];
        if !filters.watch_providers.is_empty() {
            params.push(("with_watch_providers", filters.providers_param()));
        }
        params
    }
}

#[async_trait::async_trait]
impl CatalogClient for TmdbClient {
    async fn list_popular(&self, page: u32) -> AppResult<Page> {
        Self::validate_page(page)?;

        cached!(
            self.cache,
            CacheKey::Popular {
                language: self.language.clone(),
                page,
            },
            CATALOG_CACHE_TTL,
            async move {
                let result = self
                    .get_page("/movie/popular", &[("page", page.to_string())])
                    .await?;

                tracing::info!(
                    page = page,
                    results = result.results.len(),
                    provider = "tmdb",
                    "Popular page fetched"
                );

                Ok::<_, AppError>(result)
            }
        )
    }

    async fn discover(&self, page: u32, filters: &DiscoverFilters) -> AppResult<Page> {
        Self::validate_page(page)?;

        cached!(
            self.cache,
            CacheKey::discover(&self.language, filters, page),
            CATALOG_CACHE_TTL,
            async move {
                let params = Self::discover_params(page, filters);
                let result = self.get_page("/discover/movie", &params).await?;

                tracing::info!(
                    page = page,
                    results = result.results.len(),
                    total_pages = result.total_pages,
                    region = %filters.watch_region,
                    provider = "tmdb",
                    "Discover page fetched"
                );

                Ok::<_, AppError>(result)
            }
        )
    }

    async fn get_detail(&self, id: MovieId) -> AppResult<Option<ExtendedDetail>> {
        cached!(
            self.cache,
            CacheKey::Detail {
                language: self.language.clone(),
                id,
            },
            CATALOG_CACHE_TTL,
            async move {
                let endpoint = format!("/movie/{}", id);
                let raw: Option<TmdbMovieDetails> = self
                    .get_json(
                        &endpoint,
                        &[("append_to_response", "credits,videos".to_string())],
                    )
                    .await?;
                let detail = raw.map(ExtendedDetail::from);

                tracing::info!(
                    movie_id = %id,
                    found = detail.is_some(),
                    provider = "tmdb",
                    "Movie details fetched"
                );

                Ok::<_, AppError>(detail)
            }
        )
    }

    async fn get_providers(&self, id: MovieId) -> AppResult<Option<ProviderAvailability>> {
        // All regions are cached together; the region is picked after the lookup
        let raw: AppResult<Option<TmdbWatchProviders>> = cached!(
            self.cache,
            CacheKey::Providers(id),
            CATALOG_CACHE_TTL,
            async move {
                let endpoint = format!("/movie/{}/watch/providers", id);
                self.get_json::<TmdbWatchProviders>(&endpoint, &[]).await
            }
        );

        let availability = raw?.and_then(|r| ProviderAvailability::from_response(r, &self.region));

        tracing::info!(
            movie_id = %id,
            region = %self.region,
            services = availability
                .as_ref()
                .map(|a| a.flatrate.len() + a.rent.len() + a.buy.len())
                .unwrap_or(0),
            provider = "tmdb",
            "Watch providers fetched"
        );

        Ok(availability)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
