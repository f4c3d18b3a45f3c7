/// GenerationalPool - slot storage that issues stale-detecting handles.
///
/// Slots live in a dense, append-only array. Released indices go on a free
/// list and are recycled with a bumped generation, so every handle issued for
/// an earlier incarnation of the slot stops resolving.
///
/// Invariant: every index below `slots.len()` is either occupied or present
/// exactly once in `free_list` (retired slots excepted, see `release`).

use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_trace};
use super::Handle;

const SOURCE: &str = "galaxy3d::GenerationalPool";

/// Largest number of slots a pool can address (indices are `u32`)
const MAX_SLOTS: usize = u32::MAX as usize;

/// Most slots reserved eagerly by `with_config`; the rest is reserved by `grow`
const MAX_EAGER_RESERVE: usize = 4096;

/// Called exactly once with each value leaving the pool through `release`,
/// `clear`, or a rejected allocation.
pub type TeardownHook<T> = Box<dyn FnMut(T) + Send>;

/// Pool configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Name used in logs and errors
    pub name: String,
    /// Slots reserved up front
    pub initial_capacity: usize,
    /// Hard cap on slots (None = grow until host memory runs out)
    pub max_capacity: Option<usize>,
}

impl PoolConfig {
    /// Default configuration with a name
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            initial_capacity: 16,
            max_capacity: None,
        }
    }
}

struct Slot<T> {
    value: Option<T>,
    generation: u64,
}

/// Pool of `T` addressed by `Handle<T>`
///
/// Mutation takes `&mut self`: one owner at a time. To share a pool between
/// threads, wrap it in a single `Mutex`.
///
/// # Example
///
/// ```
/// use galaxy_3d_resource_pool::galaxy3d::pool::GenerationalPool;
///
/// let mut pool = GenerationalPool::with_capacity(2);
/// let a = pool.allocate("A")?;
/// assert_eq!(pool.try_get(a), Some(&"A"));
///
/// assert!(pool.release(a));
/// assert!(pool.try_get(a).is_none());
/// assert!(!pool.release(a));
/// # Ok::<(), galaxy_3d_resource_pool::galaxy3d::Error>(())
/// ```
pub struct GenerationalPool<T> {
    name: String,
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    /// Logical capacity; doubles when `slots` is full and the free list is empty
    capacity: usize,
    max_capacity: Option<usize>,
    len: usize,
    teardown: Option<TeardownHook<T>>,
}

impl<T> GenerationalPool<T> {
    /// Create a pool with the default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool reserving `initial_capacity` slots
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::with_config(PoolConfig {
            initial_capacity,
            ..PoolConfig::default()
        })
    }

    /// Create a pool from a configuration
    ///
    /// `initial_capacity` is clamped to `max_capacity` when both are set.
    /// It sets the logical capacity; host memory for at most
    /// `MAX_EAGER_RESERVE` slots is reserved up front, the rest as slots fill.
    pub fn with_config(config: PoolConfig) -> Self {
        let limit = config.max_capacity.unwrap_or(MAX_SLOTS).min(MAX_SLOTS);
        let capacity = config.initial_capacity.min(limit);
        Self {
            name: config.name,
            slots: Vec::with_capacity(capacity.min(MAX_EAGER_RESERVE)),
            free_list: Vec::new(),
            capacity,
            max_capacity: config.max_capacity,
            len: 0,
            teardown: None,
        }
    }

    /// Builder-style variant of `set_teardown`
    pub fn with_teardown<F>(mut self, hook: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        self.set_teardown(hook);
        self
    }

    /// Register the hook that destroys values leaving the pool
    ///
    /// Replaces any previous hook. Without a hook, values are dropped.
    pub fn set_teardown<F>(&mut self, hook: F)
    where
        F: FnMut(T) + Send + 'static,
    {
        self.teardown = Some(Box::new(hook));
    }

    // ===== ALLOCATION =====

    /// Store a value and return its handle
    ///
    /// Reuses the most recently freed index if there is one, otherwise
    /// appends a slot at generation 1, doubling capacity when full.
    ///
    /// # Errors
    ///
    /// `Error::CapacityExhausted` if the pool has a hard cap and is full.
    /// The rejected value is handed to the teardown hook.
    pub fn allocate(&mut self, value: T) -> Result<Handle<T>> {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none(), "free-listed slot {} is occupied", index);
            slot.value = Some(value);
            self.len += 1;
            let handle = Handle::from_raw_parts(index, slot.generation);
            engine_trace!(SOURCE, "[{}] Reused slot {:?}", self.name, handle);
            return Ok(handle);
        }

        if self.slots.len() == self.capacity {
            if let Err(error) = self.grow() {
                self.discard(value);
                return Err(error);
            }
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            value: Some(value),
            generation: 1,
        });
        self.len += 1;
        let handle = Handle::from_raw_parts(index, 1);
        engine_trace!(SOURCE, "[{}] Appended slot {:?}", self.name, handle);
        Ok(handle)
    }

    fn grow(&mut self) -> Result<()> {
        let limit = self.max_capacity.unwrap_or(MAX_SLOTS).min(MAX_SLOTS);
        if self.capacity >= limit {
            engine_error!(SOURCE, "[{}] Capacity exhausted at {} slots", self.name, self.capacity);
            return Err(Error::CapacityExhausted {
                pool: self.name.clone(),
                capacity: self.capacity,
            });
        }

        let doubled = if self.capacity == 0 { 1 } else { self.capacity.saturating_mul(2) };
        let new_capacity = doubled.min(limit);
        self.slots.reserve_exact(new_capacity - self.slots.len());
        engine_debug!(SOURCE, "[{}] Grew from {} to {} slots", self.name, self.capacity, new_capacity);
        self.capacity = new_capacity;
        Ok(())
    }

    fn discard(&mut self, value: T) {
        if let Some(hook) = self.teardown.as_mut() {
            hook(value);
        }
    }

    // ===== RELEASE =====

    /// Destroy the value behind `handle`
    ///
    /// Returns false, with no side effects, if the handle is stale, was never
    /// issued, or is out of range. On success the teardown hook runs exactly
    /// once and every handle to this slot incarnation stops resolving.
    pub fn release(&mut self, handle: Handle<T>) -> bool {
        match self.take(handle) {
            Some(value) => {
                self.discard(value);
                true
            }
            None => {
                engine_trace!(SOURCE, "[{}] Ignored release of stale handle {:?}", self.name, handle);
                false
            }
        }
    }

    /// Remove the value behind `handle` and give it to the caller
    ///
    /// Same bookkeeping as `release`, but the teardown hook is not called:
    /// destroying the value becomes the caller's job.
    pub fn take(&mut self, handle: Handle<T>) -> Option<T> {
        let index = handle.index();
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        self.len -= 1;
        Self::retire_or_recycle(slot, index, &mut self.free_list, &self.name);
        Some(value)
    }

    /// Release every live value, returning how many were released
    pub fn clear(&mut self) -> usize {
        let mut values = Vec::with_capacity(self.len);
        // Walk backwards so the free list pops the lowest index first
        for index in (0..self.slots.len()).rev() {
            let slot = &mut self.slots[index];
            if let Some(value) = slot.value.take() {
                Self::retire_or_recycle(slot, index as u32, &mut self.free_list, &self.name);
                values.push(value);
            }
        }
        self.len = 0;

        let released = values.len();
        for value in values {
            self.discard(value);
        }
        if released > 0 {
            engine_debug!(SOURCE, "[{}] Cleared {} slots", self.name, released);
        }
        released
    }

    /// Bump the generation of an emptied slot and free-list its index.
    ///
    /// A slot whose generation would overflow is retired: it is never reused,
    /// so no handle can ever alias an older incarnation.
    fn retire_or_recycle(slot: &mut Slot<T>, index: u32, free_list: &mut Vec<u32>, name: &str) {
        match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                free_list.push(index);
            }
            None => {
                engine_debug!(SOURCE, "[{}] Retired slot {} (generation exhausted)", name, index);
            }
        }
    }

    // ===== ACCESS =====

    /// Value behind `handle`, or None if stale or out of range
    #[inline]
    pub fn try_get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    /// Mutable value behind `handle`, or None if stale or out of range
    #[inline]
    pub fn try_get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Whether `handle` currently resolves
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.try_get(handle).is_some()
    }

    /// Live (handle, value) pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Handle::from_raw_parts(index as u32, slot.generation), value))
        })
    }

    // ===== INTROSPECTION =====

    /// Number of live values
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no values are live
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Logical capacity (never decreases)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Highest index ever allocated + 1
    pub fn high_water_mark(&self) -> usize {
        self.slots.len()
    }

    /// Indices waiting to be reused
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Name from the configuration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hard cap from the configuration
    pub fn max_capacity(&self) -> Option<usize> {
        self.max_capacity
    }
}

impl<T> Default for GenerationalPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for GenerationalPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationalPool")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("free", &self.free_list.len())
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "generational_pool_tests.rs"]
mod tests;
