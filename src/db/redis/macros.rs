/// Read-through caching for an async computation.
///
/// Returns the cached value for `$key` when Redis has one. Otherwise awaits
/// `$block`, queues the result for storage with `$ttl` seconds to live, and
/// returns it. Must be used in a function returning `AppResult`.
///
/// A failed cache read is logged and treated as a miss, so an unavailable
/// Redis never fails the caller. Errors from `$block` are propagated.
///
/// ```rust,ignore
/// cached!(self.cache, CacheKey::Categories, 3600, async move {
///     load_categories(&self.pool).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::trace!(key = %key, "Cache hit");
                Ok(cached)
            }
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, loading from source");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
