//! Round-trip a staging buffer through the aggressive pool and print the
//! pool's counter report.

use recyclebuf_core::backing::SystemHeap;
use recyclebuf_core::pool::BufferPool;

fn main() {
    let pool = BufferPool::<f64, SystemHeap>::global();
    let count = 1 << 16;

    let buffer = pool.get(count, true, None).expect("backing allocation failed");
    unsafe {
        for offset in 0..count {
            buffer.as_ptr().add(offset).write(offset as f64);
        }
        pool.mark_unused(buffer, count, None).expect("release failed");
    }

    // Same count, same pool: the released buffer comes back, contents and
    // all, because the aggressive flavour skips reinitialisation.
    let again = pool.get(count, true, None).expect("backing allocation failed");
    assert_eq!(buffer, again, "the pool should reuse the released buffer");
    unsafe {
        assert_eq!(*again.as_ptr().add(42), 42.0);
        pool.mark_unused(again, count, None).expect("release failed");
    }

    #[cfg(feature = "counters")]
    println!("{}", pool.stats());

    recyclebuf_core::cleanup();
}
