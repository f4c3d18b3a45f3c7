/// Type-erased resource identity used inside cache keys and by the registry.

use super::Handle;

/// Kind tag: which registry pool a resource type lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// Vertex, index, uniform or storage buffer
    Buffer,
    /// Sampled image, render target or depth attachment
    Texture,
    /// Sampler state object
    Sampler,
    /// Compiled shader module
    Shader,
    /// Descriptor set layout (one per resource set)
    BindingLayout,
    /// Descriptor set / bind group
    BindingGroup,
    /// Render pass object
    RenderPass,
    /// Framebuffer object
    Framebuffer,
    /// Application-defined kind
    Custom(u32),
}

impl ResourceKind {
    /// Stable 64-bit code: variant in the high half, custom payload in the low half
    pub fn code(&self) -> u64 {
        let (variant, payload): (u64, u32) = match *self {
            ResourceKind::Buffer => (1, 0),
            ResourceKind::Texture => (2, 0),
            ResourceKind::Sampler => (3, 0),
            ResourceKind::Shader => (4, 0),
            ResourceKind::BindingLayout => (5, 0),
            ResourceKind::BindingGroup => (6, 0),
            ResourceKind::RenderPass => (7, 0),
            ResourceKind::Framebuffer => (8, 0),
            ResourceKind::Custom(id) => (9, id),
        };
        (variant << 32) | payload as u64
    }
}

/// A Rust type that lives in a registry pool of a given kind
///
/// # Example
///
/// ```
/// use galaxy_3d_resource_pool::galaxy3d::pool::{PoolResource, ResourceKind};
///
/// struct VulkanSampler { raw: u64 }
///
/// impl PoolResource for VulkanSampler {
///     const KIND: ResourceKind = ResourceKind::Sampler;
/// }
/// ```
pub trait PoolResource: Send + 'static {
    const KIND: ResourceKind;
}

/// (kind, index, generation) - a handle with its type erased
///
/// Two ids are equal only if they name the same slot incarnation of the
/// same kind, so a recycled slot never aliases a released resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    kind: ResourceKind,
    index: u32,
    generation: u64,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, index: u32, generation: u64) -> Self {
        Self { kind, index, generation }
    }

    /// Identity of a typed handle
    pub fn of<T: PoolResource>(handle: Handle<T>) -> Self {
        Self::new(T::KIND, handle.index(), handle.generation())
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Back to a typed handle, if the kind matches `T`
    pub fn to_handle<T: PoolResource>(&self) -> Option<Handle<T>> {
        (self.kind == T::KIND).then(|| Handle::from_raw_parts(self.index, self.generation))
    }
}

impl<T: PoolResource> From<Handle<T>> for ResourceId {
    fn from(handle: Handle<T>) -> Self {
        Self::of(handle)
    }
}

#[cfg(test)]
#[path = "resource_id_tests.rs"]
mod tests;
