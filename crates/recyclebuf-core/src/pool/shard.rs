//! One shard of a typed pool: the in-use map and the free list.

use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::backing::BackingAllocator;
use crate::error::{RecycleError, Result};
#[cfg(feature = "counters")]
use crate::stats::ShardStats;
use crate::types::Element;

use super::entry::BufferEntry;

/// Mutable state of a single shard. The owning pool wraps each `ShardState`
/// in a mutex; every method here assumes that lock is held.
///
/// The free list is LIFO: the most recently released buffer sits at the
/// front and is the first match for a new request of the same count, which
/// keeps reuse cache-warm.
pub(crate) struct ShardState<T: Element, A: BackingAllocator<T>> {
    location: usize,
    in_use: HashMap<usize, BufferEntry<T>>,
    free: VecDeque<BufferEntry<T>>,
    #[cfg(feature = "counters")]
    stats: ShardStats,
    _backing: PhantomData<fn() -> A>,
}

impl<T: Element, A: BackingAllocator<T>> ShardState<T, A> {
    pub(crate) fn new(location: usize) -> Self {
        Self {
            location,
            in_use: HashMap::new(),
            free: VecDeque::new(),
            #[cfg(feature = "counters")]
            stats: ShardStats::default(),
            _backing: PhantomData,
        }
    }

    /// Take the first free entry with exactly `count` elements, reconcile
    /// its content state with the requested flavour, and move it to the
    /// in-use map.
    pub(crate) fn recycle(&mut self, count: usize, aggressive: bool) -> Option<NonNull<T>> {
        let matched = self.free.iter().position(|entry| entry.count() == count)?;
        let mut entry = self.free.remove(matched).expect("matched index is in bounds");
        if aggressive && !entry.is_constructed() {
            // SAFETY: the entry sits on the free list, so the pool owns it.
            unsafe { entry.value_initialize() };
        } else if !aggressive && entry.is_constructed() {
            // SAFETY: as above.
            unsafe { entry.destroy_contents() };
        }
        let ptr = entry.ptr();
        self.note_recycle();
        self.in_use.insert(ptr.as_ptr() as usize, entry);
        Some(ptr)
    }

    /// Record a freshly allocated buffer as handed out, value-initialising
    /// it when the aggressive flavour asked for constructed elements.
    pub(crate) fn admit(&mut self, ptr: NonNull<T>, count: usize, aggressive: bool) {
        let mut entry = BufferEntry::new(ptr, count, self.location, false);
        if aggressive {
            // SAFETY: the allocation is brand new and not yet handed out.
            unsafe { entry.value_initialize() };
        }
        self.note_creation();
        self.in_use.insert(ptr.as_ptr() as usize, entry);
    }

    /// Move a handed-out buffer to the front of the free list.
    ///
    /// Returns `Ok(false)` when this shard has no record of `ptr` (the
    /// caller keeps searching), and `SizeMismatch` when the recorded element
    /// count disagrees with the caller's. Contents are left untouched; the
    /// next `recycle` reconciles them.
    pub(crate) fn release(&mut self, ptr: NonNull<T>, count: usize) -> Result<bool> {
        let key = ptr.as_ptr() as usize;
        match self.in_use.get(&key) {
            None => Ok(false),
            Some(entry) => {
                if entry.count() != count {
                    return Err(RecycleError::size_mismatch(entry.count(), count));
                }
                let entry = self.in_use.remove(&key).expect("entry was just looked up");
                debug_assert_eq!(entry.location(), self.location);
                self.free.push_front(entry);
                self.note_release();
                Ok(true)
            }
        }
    }

    /// Destroy and free every entry on the free list. In-use buffers are
    /// untouched.
    pub(crate) fn purge_free(&mut self) {
        let backing = A::default();
        for entry in self.free.drain(..) {
            retire(&backing, entry);
        }
    }

    pub(crate) fn note_request(&mut self) {
        #[cfg(feature = "counters")]
        {
            self.stats.allocations += 1;
        }
    }

    pub(crate) fn note_bad_alloc(&mut self) {
        #[cfg(feature = "counters")]
        {
            self.stats.bad_allocs += 1;
        }
    }

    pub(crate) fn note_wrong_hint(&mut self) {
        #[cfg(feature = "counters")]
        {
            self.stats.wrong_hints += 1;
        }
    }

    fn note_recycle(&mut self) {
        #[cfg(feature = "counters")]
        {
            self.stats.recycle_hits += 1;
        }
    }

    fn note_creation(&mut self) {
        #[cfg(feature = "counters")]
        {
            self.stats.creations += 1;
        }
    }

    fn note_release(&mut self) {
        #[cfg(feature = "counters")]
        {
            self.stats.deallocations += 1;
        }
    }

    #[cfg(feature = "counters")]
    pub(crate) fn stats(&self) -> ShardStats {
        self.stats
    }

    #[cfg(test)]
    pub(crate) fn free_len(&self) -> usize {
        self.free.len()
    }

    #[cfg(test)]
    pub(crate) fn in_use_len(&self) -> usize {
        self.in_use.len()
    }

    #[cfg(test)]
    pub(crate) fn is_constructed(&self, ptr: NonNull<T>) -> Option<bool> {
        self.in_use
            .get(&(ptr.as_ptr() as usize))
            .map(|entry| entry.is_constructed())
    }
}

impl<T: Element, A: BackingAllocator<T>> Drop for ShardState<T, A> {
    fn drop(&mut self) {
        // Frees everything the shard still owns, including buffers users
        // never returned. Quiescence is the caller's contract for the
        // operations that drop shard state.
        self.purge_free();
        let backing = A::default();
        for (_, entry) in self.in_use.drain() {
            retire(&backing, entry);
        }
    }
}

/// Destroy an entry's contents if they are live, then hand the raw memory
/// back to the backing allocator.
fn retire<T: Element, A: BackingAllocator<T>>(backing: &A, mut entry: BufferEntry<T>) {
    // SAFETY: the entry came off a shard list, so the pool owns the buffer;
    // after destruction the memory is raw, as deallocate requires.
    unsafe {
        if entry.is_constructed() {
            entry.destroy_contents();
        }
        backing.deallocate(entry.ptr(), entry.count());
    }
}
