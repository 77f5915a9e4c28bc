/// Read-through caching for catalog calls.
///
/// Returns the cached value when `$key` is present. Otherwise awaits `$block`,
/// hands the result to the background writer with `$ttl` seconds to live, and
/// returns it. Errors from `$block` are propagated and never cached.
///
/// # Example
/// ```rust,ignore
/// let page: Page = cached!(self.cache, CacheKey::Providers(id), 3600, async move {
///     self.fetch_providers(id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
