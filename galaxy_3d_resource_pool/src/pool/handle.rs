/// Handle - a copyable (index, generation) token issued by a GenerationalPool.
///
/// A handle owns nothing. Dropping it does nothing; only
/// `GenerationalPool::release` destroys the resource it names.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed handle into a `GenerationalPool<T>`
///
/// Valid for a pool iff the slot at `index` is occupied and its generation
/// equals `generation`. Generation 0 is never issued, so `Handle::DANGLING`
/// never resolves.
pub struct Handle<T> {
    index: u32,
    generation: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// A handle that no pool will ever resolve
    pub const DANGLING: Self = Self::from_raw_parts(u32::MAX, 0);

    /// Build a handle from its raw parts (tooling, tests, deserialized ids)
    pub const fn from_raw_parts(index: u32, generation: u64) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index in the backing array
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Same slot identity, different resource type
    pub(crate) fn cast<U>(self) -> Handle<U> {
        Handle::from_raw_parts(self.index, self.generation)
    }
}

// Manual impls: derives would put bounds on T.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
