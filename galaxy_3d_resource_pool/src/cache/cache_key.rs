/// CacheKey - immutable, hashable identity of a constructed artifact.
///
/// A key is an ordered sequence of 64-bit words. Every field is written with
/// a type tag in the top byte of its header word, and variable-length parts
/// carry their length, so two different field sequences cannot produce the
/// same words. There is deliberately no floating-point writer: descriptors
/// store such values in fixed point.

use std::fmt;
use crate::pool::ResourceId;

// Field tags (top byte of a header word)
const TAG_U32: u64 = 0x01;
const TAG_I32: u64 = 0x02;
const TAG_U64: u64 = 0x03;
const TAG_BOOL: u64 = 0x04;
const TAG_ENUM: u64 = 0x05;
const TAG_RESOURCE: u64 = 0x06;
const TAG_FINGERPRINT: u64 = 0x07;
const TAG_SEQUENCE: u64 = 0x08;
const TAG_NONE: u64 = 0x09;
const TAG_SOME: u64 = 0x0A;
const TAG_DOMAIN: u64 = 0x0B;

#[inline]
fn header(tag: u64, payload: u32) -> u64 {
    (tag << 56) | payload as u64
}

/// Immutable cache key
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    words: Box<[u64]>,
}

impl CacheKey {
    /// Start an empty key
    pub fn builder() -> CacheKeyBuilder {
        CacheKeyBuilder::new()
    }

    /// Key of a single source
    pub fn of<S: KeySource + ?Sized>(source: &S) -> Self {
        let mut builder = CacheKeyBuilder::new();
        source.write_key(&mut builder);
        builder.build()
    }

    /// Raw words
    pub fn as_words(&self) -> &[u64] {
        &self.words
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey(")?;
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:016x}", word)?;
        }
        write!(f, ")")
    }
}

/// Ordered writer producing a `CacheKey`
///
/// # Example
///
/// ```
/// use galaxy_3d_resource_pool::galaxy3d::cache::CacheKey;
///
/// let a = CacheKey::builder().write_u32(4).write_bool(true).build();
/// let b = CacheKey::builder().write_u32(4).write_bool(true).build();
/// let c = CacheKey::builder().write_u32(4).write_bool(false).build();
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CacheKeyBuilder {
    words: Vec<u64>,
}

impl CacheKeyBuilder {
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Artifact family marker, so keys of unrelated artifact types never meet
    pub fn write_domain(&mut self, domain: u32) -> &mut Self {
        self.words.push(header(TAG_DOMAIN, domain));
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.write_u32(value as u32)
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.write_u32(value as u32)
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.words.push(header(TAG_U32, value));
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.words.push(header(TAG_I32, value as u32));
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.words.push(header(TAG_U64, 0));
        self.words.push(value);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.words.push(header(TAG_BOOL, value as u32));
        self
    }

    /// Enum discriminant (fieldless enums)
    pub fn write_discriminant(&mut self, value: u32) -> &mut Self {
        self.words.push(header(TAG_ENUM, value));
        self
    }

    /// Identity of a participating resource (kind, slot, generation)
    pub fn write_resource(&mut self, id: ResourceId) -> &mut Self {
        self.words.push(header(TAG_RESOURCE, id.index()));
        self.words.push(id.kind().code());
        self.words.push(id.generation());
        self
    }

    /// Opaque compatibility fingerprint supplied by the backend
    pub fn write_fingerprint(&mut self, fingerprint: u64) -> &mut Self {
        self.words.push(header(TAG_FINGERPRINT, 0));
        self.words.push(fingerprint);
        self
    }

    /// Length-prefixed sequence
    pub fn write_seq<S: KeySource>(&mut self, items: &[S]) -> &mut Self {
        self.words.push(header(TAG_SEQUENCE, items.len() as u32));
        for item in items {
            item.write_key(self);
        }
        self
    }

    /// Any key source
    pub fn write<S: KeySource + ?Sized>(&mut self, source: &S) -> &mut Self {
        source.write_key(self);
        self
    }

    /// Freeze the words into a key
    pub fn build(&mut self) -> CacheKey {
        CacheKey {
            words: std::mem::take(&mut self.words).into_boxed_slice(),
        }
    }
}

/// Something that writes its semantic state into a key
///
/// Implementations must be pure: equal values write equal words.
pub trait KeySource {
    fn write_key(&self, builder: &mut CacheKeyBuilder);
}

impl KeySource for u8 {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_u8(*self);
    }
}

impl KeySource for u16 {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_u16(*self);
    }
}

impl KeySource for u32 {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_u32(*self);
    }
}

impl KeySource for i32 {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_i32(*self);
    }
}

impl KeySource for u64 {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_u64(*self);
    }
}

impl KeySource for bool {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_bool(*self);
    }
}

impl KeySource for ResourceId {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_resource(*self);
    }
}

impl<S: KeySource> KeySource for Option<S> {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        match self {
            Some(value) => {
                builder.words.push(header(TAG_SOME, 0));
                value.write_key(builder);
            }
            None => {
                builder.words.push(header(TAG_NONE, 0));
            }
        }
    }
}

impl<S: KeySource> KeySource for [S] {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_seq(self);
    }
}

impl<S: KeySource> KeySource for Vec<S> {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_seq(self.as_slice());
    }
}

impl<S: KeySource + ?Sized> KeySource for &S {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        (**self).write_key(builder);
    }
}

#[cfg(test)]
#[path = "cache_key_tests.rs"]
mod tests;
