//! Sharded buffer-recycling pools.
//!
//! One [`BufferPool`] exists per (element type, backing allocator) pair,
//! created lazily on first use. The free functions here are the low-level
//! entry points used by the allocator facades in [`crate::alloc`]; they can
//! also be called directly when a code path wants to steer shard placement
//! with hints.

mod entry;
mod manager;
mod shard;

pub use manager::BufferPool;

use std::ptr::NonNull;

use crate::backing::BackingAllocator;
use crate::error::Result;
use crate::types::Element;

/// Acquire a buffer of exactly `count` elements from the global pool for
/// `(T, A)`, recycling a previously released buffer when one of that count
/// is available.
///
/// See [`BufferPool::get`] for the full contract.
pub fn get<T, A>(count: usize, aggressive: bool, hint: Option<usize>) -> Result<NonNull<T>>
where
    T: Element,
    A: BackingAllocator<T>,
{
    BufferPool::<T, A>::global().get(count, aggressive, hint)
}

/// Release a buffer back to the global pool for `(T, A)` so later requests
/// of the same count can reuse it.
///
/// See [`BufferPool::mark_unused`] for the full contract.
///
/// # Safety
///
/// `ptr` must have been returned by [`get`] with the same `T`, `A`, and
/// `count`, and the caller must not touch the buffer afterwards.
pub unsafe fn mark_unused<T, A>(ptr: NonNull<T>, count: usize, hint: Option<usize>) -> Result<()>
where
    T: Element,
    A: BackingAllocator<T>,
{
    // SAFETY: forwarded caller contract.
    unsafe { BufferPool::<T, A>::global().mark_unused(ptr, count, hint) }
}
