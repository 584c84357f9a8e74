//! The allocator-strategy contract and its closed identifier set.

use std::ptr::NonNull;

use crate::heap::ReallocAllocator;
use crate::moving::MovingAllocator;

/// Identifies one of the concrete allocation strategies.
///
/// The set is closed and small on purpose: array handles tag their growable
/// allocations with an `AllocatorId` and operations compare the tag by
/// identity, avoiding any indirect calls on the hot append path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorId {
    /// [`ReallocAllocator`]
    Realloc,
    /// [`MovingAllocator`]
    Moving,
}

/// A strategy for producing, growing and releasing growable blocks holding
/// elements of type `T`.
///
/// All methods operate on slot-0 pointers as produced by
/// [`layout::allocate_block`](crate::layout::allocate_block); the capacity
/// header lives at [`Self::OFFSET`] bytes before the pointer.
///
/// Failure contract: `allocate` and `grow` report the condition to the sink
/// and return `None`, leaving the caller's state untouched. In particular, a
/// failed `grow` leaves the original block valid and live.
pub trait ArrayAllocator<T> {
    /// The identity of this strategy.
    const ID: AllocatorId;

    /// The strategy name used in failure reports.
    const NAME: &'static str;

    /// Bytes from the start of a block to slot 0.
    const OFFSET: usize = crate::layout::allocation_offset::<T>();

    /// Allocates a block for `capacity` elements and returns its slot-0
    /// pointer, or `None` (reported) on failure.
    fn allocate(capacity: usize) -> Option<NonNull<T>>;

    /// Grows the block to hold `new_capacity` elements, migrating the `len`
    /// live elements at its start, and returns the new slot-0 pointer.
    ///
    /// On failure reports and returns `None`; the original block is left
    /// untouched.
    ///
    /// # Safety
    ///
    /// `data` must be a slot-0 pointer of a live block owned by this
    /// strategy, `len` must not exceed its capacity, and `new_capacity` must
    /// be at least `len`. On success the old pointer is invalidated.
    unsafe fn grow(data: NonNull<T>, len: usize, new_capacity: usize) -> Option<NonNull<T>>;

    /// Frees the whole block. Element destruction is the caller's
    /// responsibility beforehand.
    ///
    /// # Safety
    ///
    /// `data` must be a slot-0 pointer of a live block owned by this
    /// strategy; the block must not be used afterwards.
    unsafe fn deallocate(data: NonNull<T>);

    /// Reads the capacity of the block, in elements.
    ///
    /// # Safety
    ///
    /// `data` must be a slot-0 pointer of a live block owned by this
    /// strategy.
    unsafe fn capacity(data: NonNull<T>) -> usize;

    /// Returns the base pointer of the block.
    ///
    /// # Safety
    ///
    /// `data` must be a slot-0 pointer of a live block owned by this
    /// strategy.
    unsafe fn base(data: NonNull<T>) -> *mut u8;
}

/// Reads the capacity of a block through the strategy identified by `id`.
///
/// # Safety
///
/// Same contract as [`ArrayAllocator::capacity`] for the identified
/// strategy.
#[inline]
pub unsafe fn capacity_for<T>(id: AllocatorId, data: NonNull<T>) -> usize {
    match id {
        AllocatorId::Realloc => unsafe { <ReallocAllocator as ArrayAllocator<T>>::capacity(data) },
        AllocatorId::Moving => unsafe { <MovingAllocator as ArrayAllocator<T>>::capacity(data) },
    }
}

/// Frees a block through the strategy identified by `id`.
///
/// # Safety
///
/// Same contract as [`ArrayAllocator::deallocate`] for the identified
/// strategy.
#[inline]
pub unsafe fn deallocate_for<T>(id: AllocatorId, data: NonNull<T>) {
    match id {
        AllocatorId::Realloc => unsafe {
            <ReallocAllocator as ArrayAllocator<T>>::deallocate(data)
        },
        AllocatorId::Moving => unsafe {
            <MovingAllocator as ArrayAllocator<T>>::deallocate(data)
        },
    }
}
