//! Error types for the Galaxy3D resource pool
//!
//! Stale or out-of-range handles are not errors: they surface as `false` or
//! `None` from the pool. This enum covers the failures a caller must act on.

use std::fmt;

/// Result type for Galaxy3D resource operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D resource errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan, DirectX, poisoned locks, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (wrong kind, wrong type, unknown handle)
    InvalidResource(String),

    /// Initialization failed (pool, cache, context)
    InitializationFailed(String),

    /// A cache factory failed to build an artifact. Nothing was cached.
    ConstructionFailed(String),

    /// A pool with a hard capacity cap is full
    CapacityExhausted {
        /// Name of the pool that rejected the allocation
        pool: String,
        /// The cap that was reached
        capacity: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ConstructionFailed(msg) => write!(f, "Construction failed: {}", msg),
            Error::CapacityExhausted { pool, capacity } => {
                write!(f, "Capacity exhausted: pool '{}' is capped at {} slots", pool, capacity)
            }
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an `Error::BackendError`, logging it at ERROR level with file:line
///
/// # Example
///
/// ```ignore
/// let state = self.state.lock()
///     .map_err(|_| engine_err!("galaxy3d::SharedPipelineCache", "Cache lock poisoned"))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log and return an `Error::BackendError` from the current function
///
/// # Example
///
/// ```ignore
/// if already_bound {
///     engine_bail!("galaxy3d::ResourceRegistry", "Kind {:?} already bound", kind);
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
