pub mod redis;
pub mod watchlist;

pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;
pub use watchlist::{JsonFileWatchlistStore, MemoryWatchlistStore, WatchlistStore};
