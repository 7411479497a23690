//! Process-wide cleanup coordination.
//!
//! Every typed pool registers two callbacks when it is created: a partial
//! one that frees only the buffers sitting on free lists, and a full one
//! that resets the pool outright. [`cleanup`] and [`force_cleanup`] run the
//! corresponding list in registration order.
//!
//! Callbacks run with the registry mutex held. They therefore must not call
//! back into the registry; the only locks they may take are shard mutexes.
//! Together with the pools' rule of holding at most one shard mutex at a
//! time (and never while waiting on the registry), the lock order
//! `registry -> shard` is acyclic.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

type CleanupFn = Box<dyn Fn() + Send + Sync>;

struct CallbackLists {
    full: Vec<CleanupFn>,
    partial: Vec<CleanupFn>,
}

static REGISTRY: Lazy<Mutex<CallbackLists>> = Lazy::new(|| {
    Mutex::new(CallbackLists {
        full: Vec::new(),
        partial: Vec::new(),
    })
});

/// Record a callback that destroys everything a typed pool owns.
///
/// Called exactly once per pool, from the pool-creation latch.
pub(crate) fn register_full_cleanup(callback: impl Fn() + Send + Sync + 'static) {
    REGISTRY.lock().full.push(Box::new(callback));
}

/// Record a callback that frees only a typed pool's unused buffers.
///
/// Called exactly once per pool, from the pool-creation latch.
pub(crate) fn register_partial_cleanup(callback: impl Fn() + Send + Sync + 'static) {
    REGISTRY.lock().partial.push(Box::new(callback));
}

/// Free every buffer currently sitting on a free list, in every typed pool.
///
/// Buffers handed out to users are untouched. Safe to call at any time;
/// also invoked internally when a backing allocator reports exhaustion.
pub fn cleanup() {
    let lists = REGISTRY.lock();
    for callback in &lists.partial {
        callback();
    }
}

/// Reset every typed pool, freeing all buffers whether in use or not.
///
/// # Safety
///
/// Callable only at quiescence: no pooled buffer may be in use anywhere in
/// the process, and no allocation traffic may race this call. Every pointer
/// previously obtained from any pool dangles afterwards. Pools are reused
/// lazily by subsequent traffic.
pub unsafe fn force_cleanup() {
    let lists = REGISTRY.lock();
    for callback in &lists.full {
        callback();
    }
}
