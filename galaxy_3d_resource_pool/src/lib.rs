/*!
# Galaxy 3D Resource Pool

Resource identity and pipeline memoization for the Galaxy 3D engine.

Backends create raw GPU objects; this crate owns them and hands out
generational handles that detect use-after-release without ever panicking.
Expensive derived objects (graphics pipelines and the like) are memoized by
an immutable key built from the state that defines them.

## Architecture

- **Handle**: copyable `(index, generation)` token, never owns anything
- **GenerationalPool**: slot storage, free list, doubling growth, teardown hook
- **CacheKey**: ordered, typed word sequence derived from state descriptors
- **PipelineCache**: single-owner memoization table on top of a pool
- **SharedPipelineCache**: thread-safe cache with claim-then-build miss path
- **ResourceRegistry**: one pool per resource kind
- **ResourceContext**: explicitly owned registry + pipeline cache pair

There is no global resource table. Only the logger is process-wide.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod pool;
pub mod cache;
pub mod registry;

#[cfg(test)]
mod mock_backend;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros stay at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Pool sub-module
    pub mod pool {
        pub use crate::pool::*;
    }

    // Cache sub-module
    pub mod cache {
        pub use crate::cache::*;
    }

    // Registry sub-module
    pub mod registry {
        pub use crate::registry::*;
    }
}
