//! Layout of a growable allocation block.
//!
//! The block starts with a `usize` capacity header, followed by padding up to
//! the element alignment, followed by the element slots. The header stores
//! the usable capacity of the slot region in bytes, which keeps the layout
//! independent of the element type and is what makes
//! `array_allocator_cast` possible.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use tensile_common::diag;
use tensile_common::error::Violation;

/// Minimum size of a growable block in bytes.
///
/// Small allocations are rounded up to this quantum so that the first growth
/// steps land on the global allocator's natural size buckets.
pub const MIN_ALLOCATION: usize = 2 * size_of::<usize>();

/// Returns the offset in bytes from the start of a block to slot 0.
///
/// The offset is at least the size of the capacity header and a multiple of
/// the element alignment, so both the header and the slots end up naturally
/// aligned.
#[inline]
pub const fn allocation_offset<T>() -> usize {
    if align_of::<T>() > size_of::<usize>() {
        align_of::<T>()
    } else {
        size_of::<usize>()
    }
}

/// Returns the alignment of a block holding elements of type `T`.
#[inline]
pub const fn block_align<T>() -> usize {
    if align_of::<T>() > align_of::<usize>() {
        align_of::<T>()
    } else {
        align_of::<usize>()
    }
}

/// Returns the total block size in bytes for `capacity` slots of `T`, or
/// `None` if the computation overflows.
#[inline]
pub fn block_size<T>(capacity: usize) -> Option<usize> {
    capacity
        .checked_mul(size_of::<T>())?
        .checked_add(allocation_offset::<T>())
}

/// Allocates a block for `capacity` slots of `T` and writes the capacity
/// header.
///
/// Returns a pointer to slot 0. On byte-size overflow or allocation failure
/// the condition is reported to the sink on behalf of `allocator` and `None`
/// is returned; no partial state is left behind.
pub fn allocate_block<T>(allocator: &'static str, capacity: usize) -> Option<NonNull<T>> {
    const {
        assert!(size_of::<T>() != 0, "zero-sized element types have no allocation layout");
    }
    let offset = allocation_offset::<T>();
    let failed = |bytes| {
        diag::report(Violation::AllocationFailure { allocator, bytes });
        None
    };
    let Some(size) = block_size::<T>(capacity) else {
        return failed(saturating_block_size::<T>(capacity));
    };
    let Ok(layout) = Layout::from_size_align(size, block_align::<T>()) else {
        return failed(size);
    };
    let base = unsafe { alloc::alloc(layout) };
    let Some(base) = NonNull::new(base) else {
        return failed(size);
    };
    unsafe {
        base.cast::<usize>().write(size - offset);
        Some(NonNull::new_unchecked(base.as_ptr().add(offset).cast::<T>()))
    }
}

/// Frees a block previously produced by [`allocate_block`] (or grown from
/// one), given its slot-0 pointer.
///
/// This releases raw memory only; element destruction is the caller's
/// responsibility beforehand.
///
/// # Safety
///
/// `data` must be the slot-0 pointer of a live block holding elements of
/// type `T`, and the block must not be used afterwards.
pub unsafe fn release_block<T>(data: NonNull<T>) {
    let offset = allocation_offset::<T>();
    unsafe {
        let base = data.as_ptr().cast::<u8>().sub(offset);
        let size = offset + base.cast::<usize>().read();
        let layout = Layout::from_size_align_unchecked(size, block_align::<T>());
        alloc::dealloc(base, layout);
    }
}

/// Reads the capacity header of a block, in elements of `T`.
///
/// # Safety
///
/// `data` must be the slot-0 pointer of a live block holding elements of
/// type `T`.
#[inline]
pub unsafe fn block_capacity<T>(data: NonNull<T>) -> usize {
    unsafe { block_base(data).cast::<usize>().read() / size_of::<T>() }
}

/// Returns the base pointer of the block `data` points into.
///
/// # Safety
///
/// `data` must be the slot-0 pointer of a live block holding elements of
/// type `T`.
#[inline]
pub unsafe fn block_base<T>(data: NonNull<T>) -> *mut u8 {
    unsafe { data.as_ptr().cast::<u8>().sub(allocation_offset::<T>()) }
}

/// The block size that was asked for, with the overflowing computation
/// saturated for reporting purposes.
fn saturating_block_size<T>(capacity: usize) -> usize {
    capacity
        .saturating_mul(size_of::<T>())
        .saturating_add(allocation_offset::<T>())
}
