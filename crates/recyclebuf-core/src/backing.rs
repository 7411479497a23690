//! Backing allocator contract and host-memory implementations.
//!
//! A backing allocator is the component that actually obtains memory from
//! the OS, runtime, or device driver. The pools treat it as a pluggable
//! boundary: anything implementing [`BackingAllocator`] can sit behind a
//! typed pool, so pinned host memory or device staging memory slot in the
//! same way as the plain system heap provided here.

use std::alloc::{alloc, dealloc, Layout};
use std::mem;
use std::ptr::NonNull;

use crate::error::{RecycleError, Result};

/// Contract for allocators that back a typed pool.
///
/// Implementations are stateless handles: any two instances of the same
/// type are interchangeable, and a fresh instance must be cheap to
/// construct (`Default`). The pools construct one wherever they need to
/// allocate or free.
pub trait BackingAllocator<T>: Default + Send + Sync + 'static {
    /// Allocate room for `count` uninitialised elements of `T`.
    ///
    /// Returns [`RecycleError::OutOfMemory`] on exhaustion.
    fn allocate(&self, count: usize) -> Result<NonNull<T>>;

    /// Return memory previously obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from a call to `allocate` on an allocator of the same
    /// type with the same `count`, must not have been deallocated already,
    /// and the elements must already be destroyed (the memory is treated as
    /// raw).
    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize);
}

/// Backing allocator over the system heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemHeap;

impl<T> BackingAllocator<T> for SystemHeap {
    fn allocate(&self, count: usize) -> Result<NonNull<T>> {
        let bytes = mem::size_of::<T>().saturating_mul(count);
        let layout =
            Layout::array::<T>(count).map_err(|_| RecycleError::out_of_memory(count, bytes))?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        // SAFETY: the layout has non-zero size.
        let raw = unsafe { alloc(layout) };
        NonNull::new(raw.cast::<T>()).ok_or_else(|| RecycleError::out_of_memory(count, bytes))
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        let layout = Layout::array::<T>(count).expect("layout was valid at allocation");
        if layout.size() == 0 {
            return;
        }
        // SAFETY: per the trait contract, ptr was returned by allocate with
        // this count, so the layout matches.
        unsafe { dealloc(ptr.as_ptr().cast::<u8>(), layout) };
    }
}

/// Backing allocator returning buffers aligned to at least `ALIGN` bytes.
///
/// Useful for SIMD-friendly staging buffers and for backends with alignment
/// requirements stricter than the element type's own. `ALIGN` must be a
/// power of two; element alignment wins when it is stricter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlignedHeap<const ALIGN: usize>;

impl<const ALIGN: usize> AlignedHeap<ALIGN> {
    fn layout_for<T>(count: usize) -> Option<Layout> {
        let size = mem::size_of::<T>().checked_mul(count)?;
        let align = ALIGN.max(mem::align_of::<T>());
        Layout::from_size_align(size, align).ok()
    }
}

impl<T, const ALIGN: usize> BackingAllocator<T> for AlignedHeap<ALIGN> {
    fn allocate(&self, count: usize) -> Result<NonNull<T>> {
        let bytes = mem::size_of::<T>().saturating_mul(count);
        let layout =
            Self::layout_for::<T>(count).ok_or_else(|| RecycleError::out_of_memory(count, bytes))?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        // SAFETY: the layout has non-zero size.
        let raw = unsafe { alloc(layout) };
        NonNull::new(raw.cast::<T>()).ok_or_else(|| RecycleError::out_of_memory(count, bytes))
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        let layout = Self::layout_for::<T>(count).expect("layout was valid at allocation");
        if layout.size() == 0 {
            return;
        }
        // SAFETY: allocate used the same layout for this ptr.
        unsafe { dealloc(ptr.as_ptr().cast::<u8>(), layout) };
    }
}
