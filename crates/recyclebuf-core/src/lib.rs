//! Buffer recycling for high-performance computing workloads.
//!
//! Numerical codes allocate and free the same large, fixed-size staging
//! buffers over and over. When the backing allocator is expensive (pinned
//! host memory, device-adjacent staging memory), that churn dominates.
//! This crate keeps freed buffers in per-type sharded pools and serves
//! later requests of the same element count from there, so the backing
//! allocator is only asked for memory the pools have never seen.
//!
//! # Key Concepts
//!
//! - **Typed pool**: one pool per (element type, backing allocator) pair,
//!   created lazily and shared process-wide
//! - **Shard**: one partition of a pool with its own mutex, in-use map, and
//!   LIFO free list; hints steer traffic to specific shards
//! - **Standard recycling**: reuse the memory, hand out raw buffers
//! - **Aggressive recycling**: reuse memory *and* element state, skipping
//!   construction entirely
//!
//! # Modules
//!
//! - [`alloc`]: allocator facades (standard and aggressive flavours)
//! - [`backing`]: the backing-allocator contract and host-memory impls
//! - [`config`]: process-wide configuration (shard count)
//! - [`error`]: error types
//! - [`pool`]: the sharded pools and the low-level get/mark_unused API
//! - [`registry`]: global cleanup entry points
//! - [`stats`]: per-shard counters (feature `counters`)
//! - [`types`]: element type bounds
//!
//! # Example
//!
//! ```
//! use recyclebuf_core::backing::SystemHeap;
//!
//! let buffer = recyclebuf_core::get::<f64, SystemHeap>(256, false, None).unwrap();
//! // ... fill and use the buffer ...
//! unsafe {
//!     recyclebuf_core::mark_unused::<f64, SystemHeap>(buffer, 256, None).unwrap();
//! }
//!
//! // The next request of the same count reuses the same allocation.
//! let again = recyclebuf_core::get::<f64, SystemHeap>(256, false, None).unwrap();
//! assert_eq!(buffer, again);
//! # unsafe { recyclebuf_core::mark_unused::<f64, SystemHeap>(again, 256, None).unwrap(); }
//! ```

pub mod alloc;
pub mod backing;
pub mod config;
pub mod error;
pub mod pool;
pub mod registry;
#[cfg(feature = "counters")]
pub mod stats;
pub mod types;

// Re-export commonly used items at the crate root
pub use error::{RecycleError, Result};
pub use pool::{get, mark_unused, BufferPool};
pub use registry::{cleanup, force_cleanup};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use recyclebuf_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::alloc::{
        AggressiveRecycleAligned, AggressiveRecycleAllocator, AggressiveRecycleStd,
        RecycleAligned, RecycleAllocator, RecycleStd,
    };
    pub use crate::backing::{AlignedHeap, BackingAllocator, SystemHeap};
    pub use crate::config::{
        recycle_config, set_recycle_config, RecycleConfig, RecycleConfigBuilder,
    };
    pub use crate::error::{RecycleError, Result};
    pub use crate::pool::{get, mark_unused, BufferPool};
    pub use crate::registry::{cleanup, force_cleanup};
    #[cfg(feature = "counters")]
    pub use crate::stats::{PoolStats, ShardStats};
    pub use crate::types::Element;
}
