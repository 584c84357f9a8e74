//! The fresh-allocation strategy.

use std::ptr::{self, NonNull};

use crate::layout::{allocate_block, block_base, block_capacity, release_block};
use crate::strategy::{AllocatorId, ArrayAllocator};

/// Growable-block strategy that never reallocates in place.
///
/// Growth allocates a fresh block, migrates the live elements and releases
/// the old allocation. This is the explicit-override counterpart to
/// [`ReallocAllocator`](crate::heap::ReallocAllocator), exercising the
/// element-migration path that `realloc` otherwise short-circuits.
pub struct MovingAllocator;

impl<T> ArrayAllocator<T> for MovingAllocator {
    const ID: AllocatorId = AllocatorId::Moving;
    const NAME: &'static str = "MovingAllocator";

    fn allocate(capacity: usize) -> Option<NonNull<T>> {
        allocate_block(<Self as ArrayAllocator<T>>::NAME, capacity)
    }

    unsafe fn grow(data: NonNull<T>, len: usize, new_capacity: usize) -> Option<NonNull<T>> {
        let new_data = <Self as ArrayAllocator<T>>::allocate(new_capacity)?;
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), new_data.as_ptr(), len);
            release_block(data);
        }
        Some(new_data)
    }

    unsafe fn deallocate(data: NonNull<T>) {
        unsafe { release_block(data) }
    }

    unsafe fn capacity(data: NonNull<T>) -> usize {
        unsafe { block_capacity(data) }
    }

    unsafe fn base(data: NonNull<T>) -> *mut u8 {
        unsafe { block_base(data) }
    }
}
