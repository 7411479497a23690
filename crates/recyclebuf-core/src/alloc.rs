//! Allocator facades over the recycling pools.
//!
//! Both facades satisfy the usual allocator surface
//! (`allocate`/`deallocate`/`construct`/`destroy`) and differ only in what
//! they recycle: [`RecycleAllocator`] reuses memory and hands out raw
//! buffers, [`AggressiveRecycleAllocator`] reuses memory *and* element
//! state, so `construct` and `destroy` are no-ops and a recycled buffer
//! arrives holding whatever its previous owner left behind.
//!
//! Elements must be trivially copyable (`Copy`): the aggressive flavour is
//! only sound for types that are safe to observe in a previously-used state,
//! and the standard flavour relies on destruction being a no-op.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::backing::{AlignedHeap, BackingAllocator, SystemHeap};
use crate::error::Result;
use crate::pool;
use crate::types::Element;

/// Recycling allocator: buffers are reused, contents are not.
pub struct RecycleAllocator<T: Element + Copy, A: BackingAllocator<T> = SystemHeap> {
    _types: PhantomData<fn() -> (T, A)>,
}

/// Recycling allocator that also reuses buffer contents.
pub struct AggressiveRecycleAllocator<T: Element + Copy, A: BackingAllocator<T> = SystemHeap> {
    _types: PhantomData<fn() -> (T, A)>,
}

/// Standard recycling allocator over the system heap.
pub type RecycleStd<T> = RecycleAllocator<T, SystemHeap>;
/// Aggressive recycling allocator over the system heap.
pub type AggressiveRecycleStd<T> = AggressiveRecycleAllocator<T, SystemHeap>;
/// Standard recycling allocator over `ALIGN`-aligned host memory.
pub type RecycleAligned<T, const ALIGN: usize> = RecycleAllocator<T, AlignedHeap<ALIGN>>;
/// Aggressive recycling allocator over `ALIGN`-aligned host memory.
pub type AggressiveRecycleAligned<T, const ALIGN: usize> =
    AggressiveRecycleAllocator<T, AlignedHeap<ALIGN>>;

impl<T: Element + Copy, A: BackingAllocator<T>> RecycleAllocator<T, A> {
    pub fn new() -> Self {
        Self {
            _types: PhantomData,
        }
    }

    /// Acquire a buffer of `n` elements. The memory is raw: recycled
    /// buffers have their previous contents destroyed before hand-out.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>> {
        pool::get::<T, A>(n, false, None)
    }

    /// Release a buffer for reuse. The memory is retained by the pool, not
    /// returned to the backing allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate`](Self::allocate) on this
    /// allocator type with the same `n`, and must not be used afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is unknown to the pool or `n` disagrees with the
    /// count recorded at allocation; both indicate a caller bug.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        // SAFETY: forwarded caller contract.
        if let Err(error) = unsafe { pool::mark_unused::<T, A>(ptr, n, None) } {
            panic!("recycle deallocate failed: {error}");
        }
    }

    /// Write `value` into the slot at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point into a buffer obtained from this allocator and be
    /// valid for a write of `T`.
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: per the caller contract.
        unsafe { ptr.as_ptr().write(value) };
    }

    /// Drop the element at `ptr` in place.
    ///
    /// # Safety
    ///
    /// `ptr` must point at a live element in a buffer obtained from this
    /// allocator.
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        // SAFETY: per the caller contract. Trivial elements make this a
        // no-op, which is why the facade is restricted to Copy types.
        unsafe { ptr::drop_in_place(ptr.as_ptr()) };
    }
}

impl<T: Element + Copy, A: BackingAllocator<T>> AggressiveRecycleAllocator<T, A> {
    pub fn new() -> Self {
        Self {
            _types: PhantomData,
        }
    }

    /// Acquire a buffer of `n` constructed elements: the previous owner's
    /// contents when recycled aggressive-to-aggressive, value-initialised
    /// elements otherwise.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>> {
        pool::get::<T, A>(n, true, None)
    }

    /// Release a buffer for reuse, leaving its contents in place for the
    /// next owner.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate`](Self::allocate) on this
    /// allocator type with the same `n`, and must not be used afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is unknown to the pool or `n` disagrees with the
    /// count recorded at allocation; both indicate a caller bug.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        // SAFETY: forwarded caller contract.
        if let Err(error) = unsafe { pool::mark_unused::<T, A>(ptr, n, None) } {
            panic!("recycle deallocate failed: {error}");
        }
    }

    /// No-op: reusing the previous owner's elements is the point.
    pub fn construct(&self, _ptr: NonNull<T>, _value: T) {}

    /// No-op: contents are destroyed only when the buffer truly leaves the
    /// pool.
    pub fn destroy(&self, _ptr: NonNull<T>) {}
}

macro_rules! facade_common_impls {
    ($facade:ident) => {
        impl<T: Element + Copy, A: BackingAllocator<T>> Clone for $facade<T, A> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T: Element + Copy, A: BackingAllocator<T>> Copy for $facade<T, A> {}

        impl<T: Element + Copy, A: BackingAllocator<T>> Default for $facade<T, A> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T: Element + Copy, A: BackingAllocator<T>> fmt::Debug for $facade<T, A> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($facade), "<"))?;
                f.write_str(std::any::type_name::<T>())?;
                f.write_str(">")
            }
        }

        // Two facade instances are interchangeable exactly when they manage
        // the same element type through the same backing allocator, both of
        // which are type-level facts.
        impl<T, U, A> PartialEq<$facade<U, A>> for $facade<T, A>
        where
            T: Element + Copy,
            U: Element + Copy,
            A: BackingAllocator<T> + BackingAllocator<U>,
        {
            fn eq(&self, _other: &$facade<U, A>) -> bool {
                TypeId::of::<T>() == TypeId::of::<U>()
            }
        }

        impl<T: Element + Copy, A: BackingAllocator<T>> Eq for $facade<T, A> {}
    };
}

facade_common_impls!(RecycleAllocator);
facade_common_impls!(AggressiveRecycleAllocator);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_facade_roundtrip() {
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        struct Elem(f32);

        let alloc = RecycleAllocator::<Elem, SystemHeap>::new();
        let ptr = alloc.allocate(64).unwrap();
        unsafe {
            alloc.construct(ptr, Elem(1.5));
            assert_eq!(*ptr.as_ptr(), Elem(1.5));
            alloc.destroy(ptr);
            alloc.deallocate(ptr, 64);
        }

        let again = alloc.allocate(64).unwrap();
        assert_eq!(ptr, again);
        unsafe { alloc.deallocate(again, 64) };
    }

    #[test]
    fn aggressive_facade_skips_construction() {
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        struct Elem(u64);

        let alloc = AggressiveRecycleAllocator::<Elem, SystemHeap>::new();
        let ptr = alloc.allocate(16).unwrap();
        unsafe {
            ptr.as_ptr().write(Elem(99));
            alloc.deallocate(ptr, 16);
        }

        let again = alloc.allocate(16).unwrap();
        assert_eq!(ptr, again);
        // construct is a no-op, so the previous contents survive.
        alloc.construct(again, Elem(1));
        unsafe {
            assert_eq!(*again.as_ptr(), Elem(99));
            alloc.deallocate(again, 16);
        }
    }

    #[test]
    fn facades_compare_by_element_type() {
        let a = RecycleStd::<f32>::new();
        let b = RecycleStd::<f32>::new();
        assert_eq!(a, b);

        let c = RecycleStd::<f64>::new();
        assert!(a != c);

        let d = AggressiveRecycleStd::<f32>::new();
        let e = AggressiveRecycleStd::<f32>::new();
        assert_eq!(d, e);
    }

    #[test]
    fn aligned_alias_returns_aligned_buffers() {
        let alloc = RecycleAligned::<f64, 256>::new();
        let ptr = alloc.allocate(32).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 256, 0);
        unsafe { alloc.deallocate(ptr, 32) };
    }
}
