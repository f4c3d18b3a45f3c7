/// ResourceRegistry - one GenerationalPool per resource kind.
///
/// Each `ResourceKind` is bound to exactly one Rust type, the first one
/// registered (or configured) under it. Handles stay typed: a
/// `Handle<VulkanBuffer>` only ever resolves in the buffer pool.

use std::any::Any;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::pool::{GenerationalPool, Handle, PoolConfig, PoolResource, ResourceId, ResourceKind};
use crate::{engine_bail, engine_debug, engine_error, engine_info};

const SOURCE: &str = "galaxy3d::ResourceRegistry";

/// Object-safe view of a `GenerationalPool<T>`
trait ErasedPool: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn len(&self) -> usize;
    fn capacity(&self) -> usize;
    fn clear(&mut self) -> usize;
    fn type_name(&self) -> &'static str;
}

impl<T: Send + 'static> ErasedPool for GenerationalPool<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        GenerationalPool::len(self)
    }

    fn capacity(&self) -> usize {
        GenerationalPool::capacity(self)
    }

    fn clear(&mut self) -> usize {
        GenerationalPool::clear(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Registry of per-kind resource pools
///
/// # Example
///
/// ```
/// use galaxy_3d_resource_pool::galaxy3d::pool::{PoolResource, ResourceKind};
/// use galaxy_3d_resource_pool::galaxy3d::registry::ResourceRegistry;
///
/// struct Buffer { size: u64 }
/// impl PoolResource for Buffer {
///     const KIND: ResourceKind = ResourceKind::Buffer;
/// }
///
/// let mut registry = ResourceRegistry::new();
/// let handle = registry.register(Buffer { size: 256 })?;
/// assert_eq!(registry.try_get(handle).map(|b| b.size), Some(256));
/// assert_eq!(registry.count(ResourceKind::Buffer), 1);
/// # Ok::<(), galaxy_3d_resource_pool::galaxy3d::Error>(())
/// ```
pub struct ResourceRegistry {
    pools: FxHashMap<ResourceKind, Box<dyn ErasedPool>>,
}

impl ResourceRegistry {
    /// Create an empty registry (pools are created on first use)
    pub fn new() -> Self {
        Self {
            pools: FxHashMap::default(),
        }
    }

    // ===== POOL SETUP =====

    /// Create the pool for `T` with an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the pool for `T::KIND` already exists.
    pub fn configure<T: PoolResource>(&mut self, config: PoolConfig) -> Result<()> {
        if self.pools.contains_key(&T::KIND) {
            engine_bail!(SOURCE, "Pool for {:?} already exists", T::KIND);
        }
        engine_debug!(SOURCE, "Configured pool '{}' for {:?}", config.name, T::KIND);
        self.pools.insert(T::KIND, Box::new(GenerationalPool::<T>::with_config(config)));
        Ok(())
    }

    /// Register the teardown hook for `T`'s pool, creating the pool if needed
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if `T::KIND` is bound to another type.
    pub fn set_teardown<T, F>(&mut self, hook: F) -> Result<()>
    where
        T: PoolResource,
        F: FnMut(T) + Send + 'static,
    {
        self.pool_entry::<T>()?.set_teardown(hook);
        Ok(())
    }

    fn pool_entry<T: PoolResource>(&mut self) -> Result<&mut GenerationalPool<T>> {
        let pool = self.pools.entry(T::KIND).or_insert_with(|| {
            engine_debug!(SOURCE, "Created pool for {:?}", T::KIND);
            Box::new(GenerationalPool::<T>::with_config(PoolConfig::named(&format!("{:?}", T::KIND))))
        });
        let bound = pool.type_name();
        pool.as_any_mut()
            .downcast_mut::<GenerationalPool<T>>()
            .ok_or_else(|| {
                let message = format!(
                    "{:?} is bound to {}, not {}",
                    T::KIND,
                    bound,
                    std::any::type_name::<T>()
                );
                engine_error!(SOURCE, "{}", message);
                Error::InvalidResource(message)
            })
    }

    /// Pool holding `T`, if it exists and `T::KIND` is bound to `T`
    pub fn pool<T: PoolResource>(&self) -> Option<&GenerationalPool<T>> {
        self.pools
            .get(&T::KIND)
            .and_then(|pool| pool.as_any().downcast_ref::<GenerationalPool<T>>())
    }

    fn pool_mut<T: PoolResource>(&mut self) -> Option<&mut GenerationalPool<T>> {
        self.pools
            .get_mut(&T::KIND)
            .and_then(|pool| pool.as_any_mut().downcast_mut::<GenerationalPool<T>>())
    }

    // ===== RESOURCES =====

    /// Store a resource in its kind's pool
    ///
    /// # Errors
    ///
    /// - `Error::InvalidResource` if `T::KIND` is bound to another type
    /// - `Error::CapacityExhausted` if the pool is capped and full
    pub fn register<T: PoolResource>(&mut self, value: T) -> Result<Handle<T>> {
        self.pool_entry::<T>()?.allocate(value)
    }

    /// Release a resource (teardown hook runs). False if the handle is stale.
    pub fn release<T: PoolResource>(&mut self, handle: Handle<T>) -> bool {
        self.pool_mut::<T>()
            .map(|pool| pool.release(handle))
            .unwrap_or(false)
    }

    pub fn try_get<T: PoolResource>(&self, handle: Handle<T>) -> Option<&T> {
        self.pool::<T>()?.try_get(handle)
    }

    pub fn try_get_mut<T: PoolResource>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.pool_mut::<T>()?.try_get_mut(handle)
    }

    /// Type-erased identity of a live handle
    pub fn resource_id<T: PoolResource>(&self, handle: Handle<T>) -> Option<ResourceId> {
        self.pool::<T>()?
            .contains(handle)
            .then(|| ResourceId::of(handle))
    }

    // ===== INTROSPECTION =====

    /// Live resources of one kind
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.pools.get(&kind).map_or(0, |pool| pool.len())
    }

    /// Capacity of one kind's pool (0 if it was never created)
    pub fn capacity(&self, kind: ResourceKind) -> usize {
        self.pools.get(&kind).map_or(0, |pool| pool.capacity())
    }

    /// Kinds with a pool, sorted
    pub fn kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<_> = self.pools.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Live resources across every pool
    pub fn total_count(&self) -> usize {
        self.pools.values().map(|pool| pool.len()).sum()
    }

    /// Release every resource in every pool; pools and their hooks survive
    pub fn clear(&mut self) -> usize {
        let released: usize = self.pools.values_mut().map(|pool| pool.clear()).sum();
        if released > 0 {
            engine_info!(SOURCE, "Released {} resources", released);
        }
        released
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for kind in self.kinds() {
            map.entry(&kind, &self.count(kind));
        }
        map.finish()
    }
}

#[cfg(test)]
#[path = "resource_registry_tests.rs"]
mod tests;
