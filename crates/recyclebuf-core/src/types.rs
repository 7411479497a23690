//! Element type bounds for pooled buffers.
//!
//! Buffers managed by the recycling pools hold arrays of plain-value
//! elements: the kind of data that gets staged between host and accelerator
//! memory in numerical codes. The [`Element`] trait captures the minimum the
//! pool layer needs from such a type; the allocator facades additionally
//! require `Copy`, which restricts them to trivially-copyable elements.

/// Trait for element types that can live in a recycled buffer.
///
/// Value-initialisation of a buffer writes `T::default()` into every slot,
/// so elements must be `Default`. Buffers travel between threads through the
/// shared pools, so elements must be `Send + Sync`, and the typed-pool
/// registry is keyed by `TypeId`, which needs `'static`.
///
/// Zero-sized types are not meaningful as buffer elements and are rejected
/// by the backing allocators.
pub trait Element: Default + Send + Sync + 'static {}

impl<T> Element for T where T: Default + Send + Sync + 'static {}
