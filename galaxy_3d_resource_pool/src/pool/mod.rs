//! Generational pool module
//!
//! Handles, resource identities and the slot pool that issues them.

mod handle;
mod resource_id;
mod generational_pool;

pub use handle::Handle;
pub use resource_id::{ResourceId, ResourceKind, PoolResource};
pub use generational_pool::{GenerationalPool, PoolConfig, TeardownHook};
