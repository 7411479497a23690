//! Typed pools and the process-wide pool registry.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::mem;
use std::ptr::NonNull;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

use crate::backing::BackingAllocator;
use crate::config::recycle_config;
use crate::error::{RecycleError, Result};
use crate::registry;
#[cfg(feature = "counters")]
use crate::stats::PoolStats;
#[cfg(feature = "counters")]
use crate::stats::ShardStats;
use crate::types::Element;

use super::shard::ShardState;

/// One pool singleton per (element type, backing allocator) pair. Rust has
/// no generic statics, so the singletons live in a map keyed by the two
/// `TypeId`s, each slot holding an `Arc<BufferPool<T, A>>` behind `dyn Any`.
type PoolKey = (TypeId, TypeId);
static POOLS: Lazy<RwLock<HashMap<PoolKey, Box<dyn Any + Send + Sync>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// The recycling pool for one (element type, backing allocator) pair.
///
/// A pool owns a fixed array of shards, each protected by its own mutex and
/// holding an in-use map plus a LIFO free list. Requests carry an optional
/// shard hint; without one, shard 0 is used. Buffers released back to the
/// pool are retained and handed out again to later requests with the exact
/// same element count.
///
/// # Locking
///
/// A thread holds at most one shard mutex at a time. The bad-alloc recovery
/// path drops the shard mutex around the global sweep (which runs under the
/// cleanup registry's mutex and re-locks shards one by one), then re-locks
/// for the retry, so shard mutexes are never held while waiting on the
/// registry.
pub struct BufferPool<T: Element, A: BackingAllocator<T>> {
    shards: Box<[Mutex<ShardState<T, A>>]>,
}

impl<T: Element, A: BackingAllocator<T>> BufferPool<T, A> {
    fn new() -> Self {
        let shard_count = recycle_config().shard_count;
        let shards: Vec<_> = (0..shard_count)
            .map(|location| Mutex::new(ShardState::new(location)))
            .collect();
        Self {
            shards: shards.into_boxed_slice(),
        }
    }

    /// The process-wide pool for this (element type, backing allocator)
    /// pair, created on first use.
    ///
    /// Creation registers the pool's two cleanup callbacks (full and
    /// free-only) exactly once; the map insertion doubles as the one-shot
    /// latch.
    pub fn global() -> Arc<Self> {
        let key = (TypeId::of::<T>(), TypeId::of::<A>());
        if let Some(slot) = POOLS.read().get(&key) {
            return slot
                .downcast_ref::<Arc<Self>>()
                .expect("pool map entry matches its type key")
                .clone();
        }

        let mut pools = POOLS.write();
        // Double-checked: another thread may have created the pool between
        // the read and write locks.
        let slot = pools.entry(key).or_insert_with(|| {
            let pool = Arc::new(Self::new());
            let full = Arc::clone(&pool);
            // Quiescence at force_cleanup time is its caller's contract.
            registry::register_full_cleanup(move || unsafe { full.clean() });
            let partial = Arc::clone(&pool);
            registry::register_partial_cleanup(move || partial.clean_unused_only());
            Box::new(pool)
        });
        slot.downcast_ref::<Arc<Self>>()
            .expect("pool map entry matches its type key")
            .clone()
    }

    /// Number of shards in this pool.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Acquire a buffer of exactly `count` elements, recycled when a free
    /// buffer of that count exists in the target shard.
    ///
    /// With `aggressive` set the returned buffer holds constructed elements:
    /// either the previous owner's contents (recycled aggressive-to-
    /// aggressive) or value-initialised ones. Without it the memory is raw.
    ///
    /// When the backing allocator reports exhaustion, every pool's free
    /// lists are swept once and the allocation is retried; a second failure
    /// is returned as [`RecycleError::OutOfMemory`].
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn get(&self, count: usize, aggressive: bool, hint: Option<usize>) -> Result<NonNull<T>> {
        assert!(count > 0, "buffer element count must be positive");
        let location = hint.unwrap_or(0);
        if location >= self.shards.len() {
            return Err(RecycleError::invalid_hint(location, self.shards.len()));
        }

        let mut shard = self.shards[location].lock();
        shard.note_request();
        if let Some(ptr) = shard.recycle(count, aggressive) {
            return Ok(ptr);
        }

        let backing = A::default();
        match backing.allocate(count) {
            Ok(ptr) => {
                shard.admit(ptr, count, aggressive);
                Ok(ptr)
            }
            Err(_) => {
                // Drop the shard mutex before the global sweep: the sweep
                // runs under the registry mutex and locks shards itself.
                drop(shard);
                eprintln!(
                    "recyclebuf: backing allocation of {} x {} failed; sweeping unused buffers and retrying",
                    count,
                    mem::size_of::<T>(),
                );
                registry::cleanup();

                let mut shard = self.shards[location].lock();
                let ptr = backing.allocate(count)?;
                shard.note_bad_alloc();
                shard.admit(ptr, count, aggressive);
                Ok(ptr)
            }
        }
    }

    /// Release a buffer back to the pool for reuse.
    ///
    /// The hinted shard is tried first; a miss there is tallied as a wrong
    /// hint and every other shard is searched in order, locking one at a
    /// time. The buffer is never returned to the backing allocator here,
    /// and its contents are left exactly as the caller wrote them.
    ///
    /// # Errors
    ///
    /// [`RecycleError::UnknownBuffer`] when no shard has the pointer on
    /// record, [`RecycleError::SizeMismatch`] when `count` differs from the
    /// count recorded at acquisition, [`RecycleError::InvalidHint`] when the
    /// hint is out of range.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`get`](Self::get) on this pool, and
    /// the caller must not touch the buffer afterwards: the pool may hand it
    /// to another owner or rewrite its contents at any point.
    pub unsafe fn mark_unused(
        &self,
        ptr: NonNull<T>,
        count: usize,
        hint: Option<usize>,
    ) -> Result<()> {
        if let Some(hinted) = hint {
            if hinted >= self.shards.len() {
                return Err(RecycleError::invalid_hint(hinted, self.shards.len()));
            }
            let mut shard = self.shards[hinted].lock();
            if shard.release(ptr, count)? {
                return Ok(());
            }
            shard.note_wrong_hint();
        }

        for location in 0..self.shards.len() {
            if hint == Some(location) {
                continue;
            }
            let mut shard = self.shards[location].lock();
            if shard.release(ptr, count)? {
                return Ok(());
            }
        }

        Err(RecycleError::unknown_buffer(ptr.as_ptr() as usize))
    }

    /// Destroy and free every buffer on every shard's free list. Buffers
    /// currently handed out are untouched.
    pub fn clean_unused_only(&self) {
        for shard in self.shards.iter() {
            shard.lock().purge_free();
        }
    }

    /// Reset every shard to a freshly constructed empty state, destroying
    /// and freeing everything the pool owns, including buffers still handed
    /// out.
    ///
    /// # Safety
    ///
    /// No buffer obtained from this pool may be in use: every outstanding
    /// pointer dangles once its shard is reset. The caller must guarantee
    /// quiescence.
    pub unsafe fn clean(&self) {
        for (location, shard) in self.shards.iter().enumerate() {
            let mut state = shard.lock();
            // The old state drops here, under the shard lock, returning all
            // of its buffers to the backing allocator.
            *state = ShardState::new(location);
        }
    }

    /// Counter snapshot of one shard.
    ///
    /// # Panics
    ///
    /// Panics if `location` is out of range.
    #[cfg(feature = "counters")]
    pub fn shard_stats(&self, location: usize) -> ShardStats {
        self.shards[location].lock().stats()
    }

    /// Counter snapshot of the whole pool, taken shard by shard.
    #[cfg(feature = "counters")]
    pub fn stats(&self) -> PoolStats {
        PoolStats::new(self.shards.iter().map(|shard| shard.lock().stats()).collect())
    }
}
