/// Movie catalog abstraction
///
/// The deck and the detail panel only talk to the catalog through this trait,
/// so the TMDB client can be replaced by a mock or a canned fake in tests.
use crate::{
    error::AppResult,
    models::{DiscoverFilters, ExtendedDetail, MovieId, Page, ProviderAvailability},
};

pub mod tmdb;

pub use tmdb::TmdbClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Popular movies, catalog ordering
    async fn list_popular(&self, page: u32) -> AppResult<Page>;

    /// Movies matching the region / provider / monetization filters
    async fn discover(&self, page: u32, filters: &DiscoverFilters) -> AppResult<Page>;

    /// Extended detail (runtime, genres, credits, videos).
    ///
    /// `Ok(None)` when the catalog does not know the id.
    async fn get_detail(&self, id: MovieId) -> AppResult<Option<ExtendedDetail>>;

    /// Provider availability for the client's configured region.
    ///
    /// `Ok(None)` when the title has no offers in that region.
    async fn get_providers(&self, id: MovieId) -> AppResult<Option<ProviderAvailability>>;

    /// Catalog name for logging and debugging
    fn name(&self) -> &'static str;
}
