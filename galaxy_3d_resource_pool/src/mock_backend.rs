/// Mock backend for unit tests (no GPU required)
///
/// Stands in for the device layer that creates and destroys raw objects.
/// Every creation and destruction is counted so tests can check that
/// teardown hooks ran exactly once per resource.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use crate::pool::{PoolResource, ResourceKind};

// ============================================================================
// Mock Device
// ============================================================================

#[derive(Debug, Default)]
pub struct MockDevice {
    next_raw: AtomicU64,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl MockDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_raw(&self) -> u64 {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.next_raw.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn create_buffer(&self, size: u64) -> MockBuffer {
        MockBuffer { raw: self.next_raw(), size }
    }

    pub fn create_texture(&self, width: u32, height: u32) -> MockTexture {
        MockTexture { raw: self.next_raw(), width, height }
    }

    pub fn create_shader(&self, entry_point: &str) -> MockShader {
        MockShader { raw: self.next_raw(), entry_point: entry_point.to_string() }
    }

    pub fn create_pipeline(&self, label: &str) -> MockPipeline {
        MockPipeline { raw: self.next_raw(), label: label.to_string() }
    }

    /// Teardown entry point: every destroyed object goes through here
    pub fn destroy(&self, _raw: u64) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn alive(&self) -> usize {
        self.created() - self.destroyed()
    }
}

// ============================================================================
// Mock Resources
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
pub struct MockBuffer {
    pub raw: u64,
    pub size: u64,
}

impl PoolResource for MockBuffer {
    const KIND: ResourceKind = ResourceKind::Buffer;
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockTexture {
    pub raw: u64,
    pub width: u32,
    pub height: u32,
}

impl PoolResource for MockTexture {
    const KIND: ResourceKind = ResourceKind::Texture;
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockShader {
    pub raw: u64,
    pub entry_point: String,
}

impl PoolResource for MockShader {
    const KIND: ResourceKind = ResourceKind::Shader;
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockPipeline {
    pub raw: u64,
    pub label: String,
}

/// Resource whose Rust type collides with MockBuffer's kind
#[derive(Debug)]
pub struct MockImpostorBuffer;

impl PoolResource for MockImpostorBuffer {
    const KIND: ResourceKind = ResourceKind::Buffer;
}

/// Anything with a raw backend id
pub trait RawObject {
    fn raw(&self) -> u64;
}

impl RawObject for MockBuffer {
    fn raw(&self) -> u64 { self.raw }
}

impl RawObject for MockTexture {
    fn raw(&self) -> u64 { self.raw }
}

impl RawObject for MockShader {
    fn raw(&self) -> u64 { self.raw }
}

impl RawObject for MockPipeline {
    fn raw(&self) -> u64 { self.raw }
}

impl<T: RawObject> RawObject for Arc<T> {
    fn raw(&self) -> u64 { (**self).raw() }
}

/// Teardown hook forwarding to `device.destroy`
pub fn destroy_with<T: RawObject>(device: &Arc<MockDevice>) -> impl FnMut(T) + Send + 'static {
    let device = device.clone();
    move |object: T| device.destroy(object.raw())
}
