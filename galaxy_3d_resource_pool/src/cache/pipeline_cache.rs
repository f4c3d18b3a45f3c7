/// PipelineCache - memoizes expensive artifact construction by CacheKey.
///
/// Single-owner version: every operation takes `&mut self`, so the whole
/// lookup-then-insert sequence is one critical section when the cache sits
/// behind a `Mutex`. See `SharedPipelineCache` for the claim-then-build variant.
///
/// Invariant: at most one live artifact per distinct key, and every entry's
/// handle resolves in `artifacts`.

use std::fmt;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::pool::{GenerationalPool, Handle, PoolConfig};
use crate::{engine_debug, engine_error, engine_info};
use super::cache_key::CacheKey;

const SOURCE: &str = "galaxy3d::PipelineCache";

/// Pipeline cache configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCacheConfig {
    /// Configuration of the backing artifact pool
    pub pool: PoolConfig,
}

impl Default for PipelineCacheConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig {
                name: "pipeline_cache".to_string(),
                initial_capacity: 64,
                max_capacity: None,
            },
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered without calling the factory
    pub hits: u64,
    /// Lookups that called the factory
    pub misses: u64,
    /// Misses whose factory (or registration) failed
    pub failures: u64,
}

impl CacheStats {
    /// hits / (hits + misses), 0.0 before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Memoization table from `CacheKey` to `Handle<A>`
///
/// # Example
///
/// ```
/// use galaxy_3d_resource_pool::galaxy3d::cache::{CacheKey, PipelineCache};
///
/// let mut cache: PipelineCache<String> = PipelineCache::new();
/// let key = CacheKey::builder().write_u32(1).build();
///
/// let first = cache.get_or_create(key.clone(), || Ok::<_, String>("built".to_string()))?;
/// let second = cache.get_or_create(key, || Err::<String, _>("not called".to_string()))?;
/// assert_eq!(first, second);
/// # Ok::<(), galaxy_3d_resource_pool::galaxy3d::Error>(())
/// ```
pub struct PipelineCache<A> {
    entries: FxHashMap<CacheKey, Handle<A>>,
    artifacts: GenerationalPool<A>,
    stats: CacheStats,
}

impl<A> PipelineCache<A> {
    /// Create an empty cache with the default configuration
    pub fn new() -> Self {
        Self::with_config(PipelineCacheConfig::default())
    }

    /// Create an empty cache
    pub fn with_config(config: PipelineCacheConfig) -> Self {
        Self {
            entries: FxHashMap::default(),
            artifacts: GenerationalPool::with_config(config.pool),
            stats: CacheStats::default(),
        }
    }

    /// Register the hook that destroys artifacts on invalidate/clear
    pub fn set_teardown<F>(&mut self, hook: F)
    where
        F: FnMut(A) + Send + 'static,
    {
        self.artifacts.set_teardown(hook);
    }

    /// Builder-style variant of `set_teardown`
    pub fn with_teardown<F>(mut self, hook: F) -> Self
    where
        F: FnMut(A) + Send + 'static,
    {
        self.set_teardown(hook);
        self
    }

    /// Return the artifact cached under `key`, building it on a miss
    ///
    /// On a hit the factory is not called. On a miss it is called exactly
    /// once; its result is pooled and cached.
    ///
    /// # Errors
    ///
    /// - `Error::ConstructionFailed` if the factory fails
    /// - `Error::CapacityExhausted` if the artifact pool is capped and full
    ///
    /// In both cases the cache is left exactly as it was.
    pub fn get_or_create<F, E>(&mut self, key: CacheKey, factory: F) -> Result<Handle<A>>
    where
        F: FnOnce() -> std::result::Result<A, E>,
        E: fmt::Display,
    {
        if let Some(&handle) = self.entries.get(&key) {
            self.stats.hits += 1;
            return Ok(handle);
        }

        self.stats.misses += 1;
        engine_debug!(SOURCE, "Cache miss for {:?}", key);

        let artifact = match factory() {
            Ok(artifact) => artifact,
            Err(err) => {
                self.stats.failures += 1;
                engine_error!(SOURCE, "Artifact construction failed: {}", err);
                return Err(Error::ConstructionFailed(err.to_string()));
            }
        };

        let handle = self.artifacts.allocate(artifact).inspect_err(|_| {
            self.stats.failures += 1;
        })?;
        self.entries.insert(key, handle);
        Ok(handle)
    }

    /// Handle cached under `key`, without building anything
    pub fn lookup(&self, key: &CacheKey) -> Option<Handle<A>> {
        self.entries.get(key).copied()
    }

    /// Whether `key` has a cached artifact
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Artifact behind `handle`, or None if it was invalidated or cleared
    pub fn try_get(&self, handle: Handle<A>) -> Option<&A> {
        self.artifacts.try_get(handle)
    }

    /// Mutable artifact behind `handle`
    pub fn try_get_mut(&mut self, handle: Handle<A>) -> Option<&mut A> {
        self.artifacts.try_get_mut(handle)
    }

    /// Drop one entry and release its artifact
    ///
    /// Returns false if nothing was cached under `key`.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        match self.entries.remove(key) {
            Some(handle) => {
                let released = self.artifacts.release(handle);
                debug_assert!(released, "cache entry pointed at a dead artifact");
                engine_debug!(SOURCE, "Invalidated {:?}", key);
                released
            }
            None => false,
        }
    }

    /// Release every artifact and forget every key
    ///
    /// Returns the number of artifacts released.
    pub fn clear(&mut self) -> usize {
        self.entries.clear();
        let released = self.artifacts.clear();
        engine_info!(SOURCE, "Cleared {} cached artifacts", released);
        released
    }

    /// Number of cached artifacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capacity of the backing artifact pool
    pub fn capacity(&self) -> usize {
        self.artifacts.capacity()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Cached (handle, artifact) pairs
    pub fn iter(&self) -> impl Iterator<Item = (Handle<A>, &A)> + '_ {
        self.artifacts.iter()
    }
}

impl<A> Default for PipelineCache<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "pipeline_cache_tests.rs"]
mod tests;
