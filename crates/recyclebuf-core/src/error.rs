//! Error types for buffer recycling operations.
//!
//! Exhausting the backing allocator is the only error a correct program can
//! encounter; the remaining variants flag caller bugs (releasing a buffer
//! the pools never handed out, releasing with the wrong element count, or
//! passing a shard hint outside the configured range).

use thiserror::Error;

/// Errors that can occur while acquiring or releasing pooled buffers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecycleError {
    /// The backing allocator reported exhaustion.
    ///
    /// Raised only after the one-shot recovery path (sweep all unused
    /// buffers globally, then retry the allocation once) has also failed.
    #[error("backing allocator exhausted: {count} elements ({bytes} bytes) requested")]
    OutOfMemory {
        /// Number of elements requested
        count: usize,
        /// Size of the request in bytes
        bytes: usize,
    },

    /// A buffer was released that no shard has on record.
    ///
    /// Indicates a double release, a release against the wrong
    /// (element type, backing allocator) pool, or memory corruption.
    #[error("released buffer at {address:#x} is unknown to every shard")]
    UnknownBuffer {
        /// Address of the unknown buffer
        address: usize,
    },

    /// A buffer was released with a different element count than it was
    /// acquired with.
    #[error("buffer released with element count {provided}, but {recorded} was recorded at acquisition")]
    SizeMismatch {
        /// Element count recorded when the buffer was handed out
        recorded: usize,
        /// Element count supplied at release
        provided: usize,
    },

    /// A shard hint was outside `[0, shard_count)`.
    #[error("shard hint {hint} is out of range for {shards} shards")]
    InvalidHint {
        /// The rejected hint
        hint: usize,
        /// Number of shards per pool
        shards: usize,
    },
}

impl RecycleError {
    /// Create an OutOfMemory error for a request of `count` elements.
    pub fn out_of_memory(count: usize, bytes: usize) -> Self {
        Self::OutOfMemory { count, bytes }
    }

    /// Create an UnknownBuffer error for the given address.
    pub fn unknown_buffer(address: usize) -> Self {
        Self::UnknownBuffer { address }
    }

    /// Create a SizeMismatch error.
    pub fn size_mismatch(recorded: usize, provided: usize) -> Self {
        Self::SizeMismatch { recorded, provided }
    }

    /// Create an InvalidHint error.
    pub fn invalid_hint(hint: usize, shards: usize) -> Self {
        Self::InvalidHint { hint, shards }
    }
}

/// Result type alias for recycling operations.
pub type Result<T> = std::result::Result<T, RecycleError>;
