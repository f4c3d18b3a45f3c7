//! Resource registry module
//!
//! Per-kind pools for raw backend resources, and the owned context that
//! pairs them with a pipeline cache.

mod resource_registry;
mod resource_context;

pub use resource_registry::ResourceRegistry;
pub use resource_context::ResourceContext;
