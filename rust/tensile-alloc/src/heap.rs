//! The `realloc`-backed allocation strategy.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use tensile_common::diag;
use tensile_common::error::Violation;

use crate::layout::{allocate_block, allocation_offset, block_align, block_base, block_size, release_block};
use crate::strategy::{AllocatorId, ArrayAllocator};

/// Growable-block strategy backed by the global allocator's `realloc`.
///
/// Growth hands the whole block to `realloc`, which relocates it as raw
/// bytes. Rust moves are untyped byte copies, so this is valid for every
/// element type; it is the default strategy of all growable operations.
pub struct ReallocAllocator;

impl<T> ArrayAllocator<T> for ReallocAllocator {
    const ID: AllocatorId = AllocatorId::Realloc;
    const NAME: &'static str = "ReallocAllocator";

    fn allocate(capacity: usize) -> Option<NonNull<T>> {
        allocate_block(<Self as ArrayAllocator<T>>::NAME, capacity)
    }

    unsafe fn grow(data: NonNull<T>, _len: usize, new_capacity: usize) -> Option<NonNull<T>> {
        let offset = allocation_offset::<T>();
        let failed = |bytes| {
            diag::report(Violation::ReallocationFailure {
                allocator: <Self as ArrayAllocator<T>>::NAME,
                bytes,
            });
            None
        };
        let Some(new_size) = block_size::<T>(new_capacity) else {
            return failed(usize::MAX);
        };
        if Layout::from_size_align(new_size, block_align::<T>()).is_err() {
            return failed(new_size);
        }
        unsafe {
            let base = block_base(data);
            let old_size = offset + base.cast::<usize>().read();
            let old_layout = Layout::from_size_align_unchecked(old_size, block_align::<T>());
            let new_base = alloc::realloc(base, old_layout, new_size);
            let Some(new_base) = NonNull::new(new_base) else {
                return failed(new_size);
            };
            new_base.cast::<usize>().write(new_size - offset);
            Some(NonNull::new_unchecked(new_base.as_ptr().add(offset).cast::<T>()))
        }
    }

    unsafe fn deallocate(data: NonNull<T>) {
        unsafe { release_block(data) }
    }

    unsafe fn capacity(data: NonNull<T>) -> usize {
        unsafe { crate::layout::block_capacity(data) }
    }

    unsafe fn base(data: NonNull<T>) -> *mut u8 {
        unsafe { block_base(data) }
    }
}
