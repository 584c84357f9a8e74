//! Reinterpreting the element type of a growable array.

use tensile_alloc::layout;
use tensile_alloc::strategy::AllocatorId;
use tensile_common::check;
use tensile_common::error::Violation;

use crate::array::{Array, Deleter};

/// Reinterprets a growable array of `T` as an array of `U` over the same
/// bytes, without copying.
///
/// The capacity header of a [`ReallocAllocator`]-owned block counts bytes and
/// is oblivious to the element type, which is what makes the cast possible
/// and why it is limited to that strategy. Both element types must be plain
/// data (`bytemuck::NoUninit + AnyBitPattern`), the two block layouts must
/// agree, and the source byte length must divide evenly into `U` elements.
///
/// The canonical empty array casts to the canonical empty array regardless
/// of strategy. Any violated precondition is reported and the canonical
/// empty array is returned, with the source released as usual.
///
/// [`ReallocAllocator`]: tensile_alloc::heap::ReallocAllocator
pub fn array_allocator_cast<U, T>(mut array: Array<T>) -> Array<U>
where
    T: bytemuck::NoUninit + bytemuck::AnyBitPattern,
    U: bytemuck::NoUninit + bytemuck::AnyBitPattern,
{
    const {
        assert!(size_of::<U>() != 0, "zero-sized element types have no allocation layout");
    }
    if array.deleter() == Deleter::Unowned && array.is_empty() {
        return Array::new();
    }
    check!(
        array.deleter() == Deleter::Growable(AllocatorId::Realloc),
        Array::new(),
        Violation::CastAllocatorMismatch
    );
    check!(
        layout::allocation_offset::<T>() == layout::allocation_offset::<U>()
            && layout::block_align::<T>() == layout::block_align::<U>(),
        Array::new(),
        Violation::CastLayoutMismatch
    );
    let byte_len = array.len() * size_of::<T>();
    check!(
        byte_len % size_of::<U>() == 0,
        Array::new(),
        Violation::CastIndivisible {
            len: array.len(),
            from_size: size_of::<T>(),
            to_size: size_of::<U>(),
        }
    );
    let (ptr, _, deleter) = array.release();
    unsafe { Array::from_raw_parts(ptr.cast::<U>(), byte_len / size_of::<U>(), deleter) }
}
