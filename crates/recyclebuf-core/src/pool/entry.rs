//! Bookkeeping record for one pooled buffer.

use std::ptr::{self, NonNull};

use crate::types::Element;

/// One buffer owned by a shard, either handed out or waiting on the free
/// list.
///
/// `count` never changes after creation; `location` records the shard that
/// created the entry (entries never migrate between shards). `constructed`
/// tracks whether the memory currently holds live elements that must be
/// destroyed before the raw allocation can be returned to the backing
/// allocator.
#[derive(Debug)]
pub(crate) struct BufferEntry<T> {
    ptr: NonNull<T>,
    count: usize,
    location: usize,
    constructed: bool,
}

// The entry exclusively owns its allocation; sending it to another thread
// transfers ownership of the backing memory with it.
unsafe impl<T: Send> Send for BufferEntry<T> {}

impl<T> BufferEntry<T> {
    pub(crate) fn new(ptr: NonNull<T>, count: usize, location: usize, constructed: bool) -> Self {
        Self {
            ptr,
            count,
            location,
            constructed,
        }
    }

    pub(crate) fn ptr(&self) -> NonNull<T> {
        self.ptr
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn location(&self) -> usize {
        self.location
    }

    pub(crate) fn is_constructed(&self) -> bool {
        self.constructed
    }
}

impl<T: Element> BufferEntry<T> {
    /// Write `T::default()` into every slot and mark the contents live.
    ///
    /// # Safety
    ///
    /// The buffer must not be handed out to a user: the pool must have
    /// exclusive access to the memory behind `ptr`.
    pub(crate) unsafe fn value_initialize(&mut self) {
        debug_assert!(!self.constructed);
        for offset in 0..self.count {
            // SAFETY: ptr is valid for count elements and exclusively owned.
            unsafe { self.ptr.as_ptr().add(offset).write(T::default()) };
        }
        self.constructed = true;
    }

    /// Drop every element in place and mark the memory raw.
    ///
    /// # Safety
    ///
    /// The elements must be live (`constructed`), and the pool must have
    /// exclusive access to the memory behind `ptr`.
    pub(crate) unsafe fn destroy_contents(&mut self) {
        debug_assert!(self.constructed);
        // SAFETY: ptr holds count live elements and is exclusively owned.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.count))
        };
        self.constructed = false;
    }
}
