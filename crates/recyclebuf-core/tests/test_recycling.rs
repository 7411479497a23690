//! End-to-end recycling behaviour against the public API.
//!
//! Every test uses its own local element type so each gets a private typed
//! pool; the tests can then run in parallel without sharing counters. The
//! shard count is pinned to 4 for the whole binary before any pool exists.

use approx::assert_relative_eq;
use recyclebuf_core::backing::SystemHeap;
use recyclebuf_core::config::{set_recycle_config, RecycleConfigBuilder};
use recyclebuf_core::pool::BufferPool;
use recyclebuf_core::RecycleError;

/// Pin the process-wide shard count to 4. First caller wins; later calls
/// are no-ops against the already frozen configuration.
fn four_shards() {
    let _ = set_recycle_config(RecycleConfigBuilder::new().shard_count(4).build());
}

#[test]
fn basic_recycle() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(i32);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    assert_eq!(pool.shard_count(), 4);

    let first = pool.get(16, false, None).unwrap();
    unsafe { pool.mark_unused(first, 16, None).unwrap() };
    let second = pool.get(16, false, None).unwrap();
    assert_eq!(first, second);

    let totals = pool.stats().totals();
    assert_eq!(totals.allocations, 2);
    assert_eq!(totals.creations, 1);
    assert_eq!(totals.recycle_hits, 1);

    unsafe { pool.mark_unused(second, 16, None).unwrap() };
}

#[test]
fn size_mismatch_never_recycles() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(i32);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    let first = pool.get(16, false, None).unwrap();
    unsafe { pool.mark_unused(first, 16, None).unwrap() };

    let second = pool.get(17, false, None).unwrap();
    assert_ne!(first, second);

    let totals = pool.stats().totals();
    assert_eq!(totals.creations, 2);
    assert_eq!(totals.recycle_hits, 0);

    // The 16-element buffer is still waiting on the free list.
    let again = pool.get(16, false, None).unwrap();
    assert_eq!(first, again);

    unsafe {
        pool.mark_unused(second, 17, None).unwrap();
        pool.mark_unused(again, 16, None).unwrap();
    }
}

#[test]
fn aggressive_recycling_preserves_contents() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(f64);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    let first = pool.get(8, true, None).unwrap();
    unsafe {
        for offset in 0..8 {
            first.as_ptr().add(offset).write(Elem(offset as f64 + 1.0));
        }
        pool.mark_unused(first, 8, None).unwrap();
    }

    let second = pool.get(8, true, None).unwrap();
    assert_eq!(first, second);
    unsafe {
        for offset in 0..8 {
            assert_relative_eq!((*second.as_ptr().add(offset)).0, offset as f64 + 1.0);
        }
        pool.mark_unused(second, 8, None).unwrap();
    }
}

#[test]
fn standard_then_aggressive_value_initialises() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(f64);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    let first = pool.get(8, false, None).unwrap();
    unsafe {
        // Scribble over the raw buffer; none of this may survive the
        // flavour switch.
        for offset in 0..8 {
            first.as_ptr().add(offset).write(Elem(1e9));
        }
        pool.mark_unused(first, 8, None).unwrap();
    }

    let second = pool.get(8, true, None).unwrap();
    assert_eq!(first, second);
    unsafe {
        for offset in 0..8 {
            assert_relative_eq!((*second.as_ptr().add(offset)).0, 0.0);
        }
        pool.mark_unused(second, 8, None).unwrap();
    }
}

#[test]
fn wrong_hint_falls_back_and_is_tallied() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(i32);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    let ptr = pool.get(32, false, Some(2)).unwrap();
    unsafe { pool.mark_unused(ptr, 32, Some(0)).unwrap() };

    assert_eq!(pool.shard_stats(0).wrong_hints, 1);
    assert_eq!(pool.shard_stats(2).deallocations, 1);

    // The buffer sits in the shard that owns it and recycles from there.
    let again = pool.get(32, false, Some(2)).unwrap();
    assert_eq!(ptr, again);
    assert_eq!(pool.shard_stats(2).recycle_hits, 1);

    unsafe { pool.mark_unused(again, 32, Some(2)).unwrap() };
}

#[test]
fn correct_hint_recycles_without_wrong_hint_tally() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(i32);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    let ptr = pool.get(64, false, Some(1)).unwrap();
    unsafe { pool.mark_unused(ptr, 64, Some(1)).unwrap() };
    let again = pool.get(64, false, Some(1)).unwrap();
    assert_eq!(ptr, again);

    assert_eq!(pool.shard_stats(1).wrong_hints, 0);
    assert_eq!(pool.shard_stats(1).recycle_hits, 1);

    unsafe { pool.mark_unused(again, 64, Some(1)).unwrap() };
}

#[test]
fn release_against_the_wrong_pool_is_fatal() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(i64);
    #[derive(Clone, Copy, Debug, Default)]
    struct Other(i64);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    let stranger = BufferPool::<Other, SystemHeap>::global();

    let foreign = stranger.get(8, false, None).unwrap();
    let err = unsafe {
        pool.mark_unused(foreign.cast::<Elem>(), 8, None)
            .unwrap_err()
    };
    assert!(matches!(err, RecycleError::UnknownBuffer { .. }));

    unsafe { stranger.mark_unused(foreign, 8, None).unwrap() };
}

#[test]
fn hint_out_of_range_is_rejected() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(u16);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    let err = pool.get(4, false, Some(4)).unwrap_err();
    assert_eq!(err, RecycleError::invalid_hint(4, 4));

    let ptr = pool.get(4, false, None).unwrap();
    let err = unsafe { pool.mark_unused(ptr, 4, Some(7)).unwrap_err() };
    assert_eq!(err, RecycleError::invalid_hint(7, 4));
    unsafe { pool.mark_unused(ptr, 4, None).unwrap() };
}

#[test]
fn extreme_counts_roundtrip() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(f64);

    let pool = BufferPool::<Elem, SystemHeap>::global();

    let tiny = pool.get(1, false, None).unwrap();
    let huge = pool.get(1 << 20, false, None).unwrap();
    unsafe {
        pool.mark_unused(tiny, 1, None).unwrap();
        pool.mark_unused(huge, 1 << 20, None).unwrap();
    }

    let tiny_again = pool.get(1, false, None).unwrap();
    let huge_again = pool.get(1 << 20, false, None).unwrap();
    assert_eq!(tiny, tiny_again);
    assert_eq!(huge, huge_again);
    unsafe {
        pool.mark_unused(tiny_again, 1, None).unwrap();
        pool.mark_unused(huge_again, 1 << 20, None).unwrap();
    }
}

#[test]
fn counts_survive_many_recycle_cycles() {
    four_shards();
    #[derive(Clone, Copy, Debug, Default)]
    struct Elem(u64);

    let pool = BufferPool::<Elem, SystemHeap>::global();
    let original = pool.get(48, false, None).unwrap();
    unsafe { pool.mark_unused(original, 48, None).unwrap() };

    for _ in 0..100 {
        let ptr = pool.get(48, false, None).unwrap();
        assert_eq!(ptr, original);
        unsafe { pool.mark_unused(ptr, 48, None).unwrap() };
    }

    let totals = pool.stats().totals();
    assert_eq!(totals.creations, 1);
    assert_eq!(totals.recycle_hits, 100);
}
