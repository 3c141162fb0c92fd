//! Message log service backends.
//!
//! Provides:
//! - `MemoryLogService` - In-process emulation of the backend functions (feature: memory)
//! - `ConvexLogService` - HTTP client for a Convex deployment (feature: convex)

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "convex")]
pub mod convex;

#[cfg(feature = "memory")]
pub use memory::{DeletionPolicy, MemoryLogService, MemoryPolicy};

#[cfg(feature = "convex")]
pub use convex::ConvexLogService;
