/// SharedPipelineCache - thread-safe cache with a claim-then-build miss path.
///
/// The first caller to miss on a key inserts a `Building` marker under the
/// lock, runs the factory with the lock released, then publishes the result
/// under the lock. Callers that find a `Building` marker wait on a condvar.
/// Net effect: one factory call per distinct key no matter how many threads
/// race on it, and unrelated keys build in parallel.
///
/// Artifacts are stored as `Arc<A>` so readers can keep using one after the
/// lock is released.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::pool::{GenerationalPool, Handle};
use crate::{engine_debug, engine_err, engine_error, engine_info};
use super::cache_key::CacheKey;
use super::pipeline_cache::{CacheStats, PipelineCacheConfig};

const SOURCE: &str = "galaxy3d::SharedPipelineCache";

enum Entry<A> {
    /// A thread has claimed this key and is running its factory
    Building(ThreadId),
    Ready(Handle<Arc<A>>),
}

struct State<A> {
    entries: FxHashMap<CacheKey, Entry<A>>,
    artifacts: GenerationalPool<Arc<A>>,
    stats: CacheStats,
}

/// Thread-safe pipeline cache
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use galaxy_3d_resource_pool::galaxy3d::cache::{CacheKey, SharedPipelineCache};
///
/// let cache = Arc::new(SharedPipelineCache::<u32>::new());
/// let key = CacheKey::builder().write_u32(9).build();
///
/// let workers: Vec<_> = (0..4).map(|_| {
///     let cache = cache.clone();
///     let key = key.clone();
///     thread::spawn(move || cache.get_or_create(key, || Ok::<_, String>(42)).unwrap())
/// }).collect();
///
/// let handles: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
/// assert!(handles.windows(2).all(|w| w[0] == w[1]));
/// assert_eq!(cache.stats().misses, 1);
/// ```
pub struct SharedPipelineCache<A> {
    state: Mutex<State<A>>,
    ready: Condvar,
}

/// Removes a `Building` marker if the factory unwinds
struct BuildClaim<'a, A> {
    cache: &'a SharedPipelineCache<A>,
    key: &'a CacheKey,
    armed: bool,
}

impl<A> Drop for BuildClaim<'_, A> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.cache.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.entries.remove(self.key);
        state.stats.failures += 1;
        drop(state);
        self.cache.ready.notify_all();
        engine_error!(SOURCE, "Factory for {:?} did not complete; claim released", self.key);
    }
}

impl<A> SharedPipelineCache<A> {
    /// Create an empty cache with the default configuration
    pub fn new() -> Self {
        Self::with_config(PipelineCacheConfig::default())
    }

    /// Create an empty cache
    pub fn with_config(config: PipelineCacheConfig) -> Self {
        Self {
            state: Mutex::new(State {
                entries: FxHashMap::default(),
                artifacts: GenerationalPool::with_config(config.pool),
                stats: CacheStats::default(),
            }),
            ready: Condvar::new(),
        }
    }

    /// Builder-style teardown registration (hooks run under the cache lock)
    pub fn with_teardown<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Arc<A>) + Send + 'static,
    {
        if let Ok(state) = self.state.get_mut() {
            state.artifacts.set_teardown(hook);
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, State<A>>> {
        self.state
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Pipeline cache lock poisoned"))
    }

    /// Return the artifact cached under `key`, building it on a miss
    ///
    /// Concurrent callers on the same new key wait for the first one's
    /// factory instead of running their own. A factory that asks for the
    /// key it is building gets an error rather than waiting on itself.
    ///
    /// # Errors
    ///
    /// - `Error::ConstructionFailed` if this caller's factory fails
    /// - `Error::CapacityExhausted` if the artifact pool is capped and full
    /// - `Error::BackendError` if the lock is poisoned, or if called from
    ///   inside the factory currently building `key`
    ///
    /// On error no entry is recorded and waiting callers are woken; one of
    /// them then claims the key and runs its own factory.
    pub fn get_or_create<F, E>(&self, key: CacheKey, factory: F) -> Result<Handle<A>>
    where
        F: FnOnce() -> std::result::Result<A, E>,
        E: fmt::Display,
    {
        let caller = thread::current().id();
        let mut state = self.lock()?;
        loop {
            let status = state.entries.get(&key).map(|entry| match entry {
                Entry::Ready(handle) => Ok(*handle),
                Entry::Building(builder) => Err(*builder),
            });
            match status {
                Some(Ok(handle)) => {
                    state.stats.hits += 1;
                    return Ok(handle.cast());
                }
                Some(Err(builder)) if builder == caller => {
                    return Err(engine_err!(SOURCE, "Re-entrant build of {:?}", key));
                }
                Some(Err(_)) => {
                    state = self
                        .ready
                        .wait(state)
                        .map_err(|_| engine_err!(SOURCE, "Pipeline cache lock poisoned"))?;
                }
                None => break,
            }
        }

        state.entries.insert(key.clone(), Entry::Building(caller));
        state.stats.misses += 1;
        drop(state);
        engine_debug!(SOURCE, "Claimed {:?}", key);

        let mut claim = BuildClaim { cache: self, key: &key, armed: true };
        let built = factory();

        let mut state = self.lock()?;
        claim.armed = false;

        let outcome = match built {
            Ok(artifact) => state.artifacts.allocate(Arc::new(artifact)),
            Err(err) => {
                engine_error!(SOURCE, "Artifact construction failed: {}", err);
                Err(Error::ConstructionFailed(err.to_string()))
            }
        };

        match outcome {
            Ok(handle) => {
                state.entries.insert(key.clone(), Entry::Ready(handle));
                drop(state);
                self.ready.notify_all();
                Ok(handle.cast())
            }
            Err(error) => {
                state.entries.remove(&key);
                state.stats.failures += 1;
                drop(state);
                self.ready.notify_all();
                Err(error)
            }
        }
    }

    /// Handle cached under `key` (ignores keys still being built)
    pub fn lookup(&self, key: &CacheKey) -> Option<Handle<A>> {
        let state = self.lock().ok()?;
        match state.entries.get(key) {
            Some(Entry::Ready(handle)) => Some(handle.cast()),
            _ => None,
        }
    }

    /// Shared reference to the artifact behind `handle`
    pub fn try_get(&self, handle: Handle<A>) -> Option<Arc<A>> {
        let state = self.lock().ok()?;
        state.artifacts.try_get(handle.cast()).cloned()
    }

    /// Drop one ready entry and release its artifact
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let Ok(mut state) = self.lock() else {
            return false;
        };
        let ready = match state.entries.get(key) {
            Some(Entry::Ready(handle)) => *handle,
            _ => return false,
        };
        state.entries.remove(key);
        state.artifacts.release(ready)
    }

    /// Release every built artifact and forget its key
    ///
    /// Keys still being built are left alone; their builders publish normally.
    pub fn clear(&self) -> usize {
        let Ok(mut state) = self.lock() else {
            return 0;
        };
        state.entries.retain(|_, entry| matches!(entry, Entry::Building(_)));
        let released = state.artifacts.clear();
        engine_info!(SOURCE, "Cleared {} cached artifacts", released);
        released
    }

    /// Number of built artifacts
    pub fn len(&self) -> usize {
        self.lock().map(|state| state.artifacts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently claimed by a running factory
    pub fn in_flight(&self) -> usize {
        self.lock()
            .map(|state| {
                state.entries.values().filter(|e| matches!(e, Entry::Building(_))).count()
            })
            .unwrap_or(0)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().map(|state| state.stats).unwrap_or_default()
    }

    pub fn reset_stats(&self) {
        if let Ok(mut state) = self.lock() {
            state.stats = CacheStats::default();
        }
    }
}

impl<A> Default for SharedPipelineCache<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "shared_pipeline_cache_tests.rs"]
mod tests;
