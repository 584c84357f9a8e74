//! Growable operations over [`Array`] handles.
//!
//! Every operation first classifies the handle: it either already owns a
//! growable block under the requested strategy, or it does not (canonical
//! empty, exact-size, externally owned, or growable under a different
//! strategy). In the first case mutation happens in place while capacity
//! suffices and reallocates otherwise; in the second, the first
//! capacity-changing call moves the elements into a fresh growable block and
//! releases the previous storage.
//!
//! Each operation comes in two forms: the plain one using
//! [`ReallocAllocator`], and an `_in` form taking an explicit
//! [`ArrayAllocator`] strategy as its first type parameter.
//!
//! Preconditions are checked on every call. A violating call reports through
//! the sink ([`tensile_common::diag`]) and becomes a no-op; only the
//! single-element `array_append`/`array_insert`, which hand back a reference
//! to the new element, panic instead, as their signature admits no neutral
//! return value.

use std::mem::MaybeUninit;
use std::ops::Range;
use std::ptr::NonNull;

use tensile_alloc::heap::ReallocAllocator;
use tensile_alloc::layout::{self, MIN_ALLOCATION};
use tensile_alloc::strategy::{self, ArrayAllocator};
use tensile_common::check;
use tensile_common::diag;
use tensile_common::error::Violation;

use crate::array::{self, Array, Deleter};
use crate::lifecycle;
use crate::sanitizer;

/// Allocation byte sizes double up to this threshold and grow by 50% beyond
/// it.
const DOUBLING_CEILING: usize = 64;

/// Returns whether `array` owns a growable allocation under any strategy.
#[inline]
pub fn array_is_growable<T>(array: &Array<T>) -> bool {
    matches!(array.deleter(), Deleter::Growable(_))
}

/// Returns whether `array` owns a growable allocation under the strategy
/// `A`.
#[inline]
pub fn array_is_growable_in<A: ArrayAllocator<T>, T>(array: &Array<T>) -> bool {
    array.deleter() == Deleter::Growable(A::ID)
}

/// Returns the capacity of `array`, reading the header of a growable
/// allocation through whichever strategy owns it.
///
/// A non-growable array has no capacity beyond its count.
#[inline]
pub fn array_capacity<T>(array: &Array<T>) -> usize {
    match array.deleter() {
        Deleter::Growable(id) => unsafe { strategy::capacity_for(id, array.data) },
        _ => array.len(),
    }
}

/// Returns the capacity of `array` under the strategy `A`, or its count if
/// the allocation is not growable under `A`.
#[inline]
pub fn array_capacity_in<A: ArrayAllocator<T>, T>(array: &Array<T>) -> usize {
    if array_is_growable_in::<A, T>(array) {
        unsafe { A::capacity(array.data) }
    } else {
        array.len()
    }
}

/// Ensures `array` can hold at least `capacity` elements without
/// reallocating and returns the resulting capacity.
///
/// An explicit reserve allocates exactly the requested capacity, with no
/// growth-ratio padding. If the current capacity (or, for a non-growable
/// array, its count) already suffices, nothing happens. On allocation
/// failure the request is reported and the array is left untouched.
pub fn array_reserve<T>(array: &mut Array<T>, capacity: usize) -> usize {
    array_reserve_in::<ReallocAllocator, T>(array, capacity)
}

/// [`array_reserve`] with an explicit allocation strategy.
pub fn array_reserve_in<A: ArrayAllocator<T>, T>(array: &mut Array<T>, capacity: usize) -> usize {
    let len = array.len;
    if array_is_growable_in::<A, T>(array) {
        let current = unsafe { A::capacity(array.data) };
        if current >= capacity {
            return current;
        }
        sanitizer::annotate(array.data.as_ptr(), current, len, current);
        match unsafe { A::grow(array.data, len, capacity) } {
            Some(data) => {
                array.data = data;
                sanitizer::annotate(data.as_ptr(), capacity, capacity, len);
                capacity
            }
            None => {
                sanitizer::annotate(array.data.as_ptr(), current, current, len);
                current
            }
        }
    } else {
        if len >= capacity {
            return len;
        }
        let Some(data) = A::allocate(capacity) else {
            return len;
        };
        unsafe {
            lifecycle::relocate(array.data.as_ptr(), data.as_ptr(), len);
            discard_storage(array.data, len, array.deleter);
        }
        array.data = data;
        array.deleter = Deleter::Growable(A::ID);
        sanitizer::annotate(data.as_ptr(), capacity, capacity, len);
        capacity
    }
}

/// Sets the element count to `new_len`, default-constructing any new
/// elements.
///
/// Shrinking destroys the excess elements; a growable array keeps its
/// capacity, a non-growable one is converted to a growable allocation of
/// exactly `new_len`. Growing within capacity constructs in place; growing
/// beyond it reallocates to a capacity of exactly `new_len`. A call with the
/// current count does nothing.
pub fn array_resize<T: Default>(array: &mut Array<T>, new_len: usize) {
    array_resize_in::<ReallocAllocator, T>(array, new_len)
}

/// [`array_resize`] with an explicit allocation strategy.
pub fn array_resize_in<A: ArrayAllocator<T>, T: Default>(array: &mut Array<T>, new_len: usize) {
    resize_impl::<A, T>(array, new_len, |slots, count| unsafe {
        lifecycle::fill_default(slots, count)
    });
}

/// Like [`array_resize`], filling new elements with clones of `value`.
pub fn array_resize_filled<T: Clone>(array: &mut Array<T>, new_len: usize, value: T) {
    array_resize_filled_in::<ReallocAllocator, T>(array, new_len, value)
}

/// [`array_resize_filled`] with an explicit allocation strategy.
pub fn array_resize_filled_in<A: ArrayAllocator<T>, T: Clone>(
    array: &mut Array<T>,
    new_len: usize,
    value: T,
) {
    resize_impl::<A, T>(array, new_len, move |slots, count| unsafe {
        if count > 0 {
            lifecycle::fill_cloned(slots, count - 1, &value);
            slots.add(count - 1).write(value);
        }
    });
}

/// Like [`array_resize`], filling new elements with values produced by `f`.
pub fn array_resize_with<T>(array: &mut Array<T>, new_len: usize, f: impl FnMut() -> T) {
    array_resize_with_in::<ReallocAllocator, T>(array, new_len, f)
}

/// [`array_resize_with`] with an explicit allocation strategy.
pub fn array_resize_with_in<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    new_len: usize,
    f: impl FnMut() -> T,
) {
    resize_impl::<A, T>(array, new_len, |slots, count| unsafe {
        lifecycle::fill_with(slots, count, f)
    });
}

/// Like [`array_resize`], leaving new elements uninitialized.
///
/// # Safety
///
/// Every slot in `[old_len, new_len)` must be written before it is read,
/// including implicitly by the next operation that shifts, copies or drops
/// elements, and by the handle's own drop.
pub unsafe fn array_resize_noinit<T>(array: &mut Array<T>, new_len: usize) {
    unsafe { array_resize_noinit_in::<ReallocAllocator, T>(array, new_len) }
}

/// [`array_resize_noinit`] with an explicit allocation strategy.
///
/// # Safety
///
/// Same contract as [`array_resize_noinit`].
pub unsafe fn array_resize_noinit_in<A: ArrayAllocator<T>, T>(array: &mut Array<T>, new_len: usize) {
    resize_impl::<A, T>(array, new_len, |_, _| {});
}

/// Appends `value` and returns a reference to it, valid until the next
/// capacity-changing operation.
///
/// # Panics
///
/// Panics if the allocation fails (reported to the sink first).
pub fn array_append<T>(array: &mut Array<T>, value: T) -> &mut T {
    array_append_in::<ReallocAllocator, T>(array, value)
}

/// [`array_append`] with an explicit allocation strategy.
pub fn array_append_in<A: ArrayAllocator<T>, T>(array: &mut Array<T>, value: T) -> &mut T {
    let Some(slot) = grow_tail::<A, T>(array, 1) else {
        panic!("array_append: allocation failed");
    };
    array.len += 1;
    unsafe {
        slot.write(value);
        &mut *slot
    }
}

/// Appends clones of `values` and returns the newly appended range.
///
/// On allocation failure the request is reported and an empty slice is
/// returned with the array untouched.
pub fn array_append_slice<'a, T: Clone>(array: &'a mut Array<T>, values: &[T]) -> &'a mut [T] {
    array_append_slice_in::<ReallocAllocator, T>(array, values)
}

/// [`array_append_slice`] with an explicit allocation strategy.
pub fn array_append_slice_in<'a, A: ArrayAllocator<T>, T: Clone>(
    array: &'a mut Array<T>,
    values: &[T],
) -> &'a mut [T] {
    if values.is_empty() {
        return &mut [];
    }
    let Some(slots) = grow_tail::<A, T>(array, values.len()) else {
        return &mut [];
    };
    for (i, value) in values.iter().enumerate() {
        unsafe { slots.add(i).write(value.clone()) };
        array.len += 1;
    }
    unsafe { std::slice::from_raw_parts_mut(slots, values.len()) }
}

/// Appends clones of the array's own `source` range and returns the newly
/// appended range.
///
/// This is the supported way to append elements of the array to itself; the
/// source indices stay valid across the reallocation the append may trigger.
pub fn array_append_within<T: Clone>(array: &mut Array<T>, source: Range<usize>) -> &mut [T] {
    array_append_within_in::<ReallocAllocator, T>(array, source)
}

/// [`array_append_within`] with an explicit allocation strategy.
pub fn array_append_within_in<A: ArrayAllocator<T>, T: Clone>(
    array: &mut Array<T>,
    source: Range<usize>,
) -> &mut [T] {
    let len = array.len;
    check!(
        source.start <= source.end && source.end <= len,
        &mut [],
        Violation::OutOfRange {
            op: "array_append_within",
            index: source.start,
            count: source.end.saturating_sub(source.start),
            len,
        }
    );
    let count = source.end - source.start;
    if count == 0 {
        return &mut [];
    }
    let Some(slots) = grow_tail::<A, T>(array, count) else {
        return &mut [];
    };
    for i in 0..count {
        let value = unsafe { (*array.data.as_ptr().add(source.start + i)).clone() };
        unsafe { slots.add(i).write(value) };
        array.len += 1;
    }
    unsafe { std::slice::from_raw_parts_mut(slots, count) }
}

/// Appends `count` default-constructed elements and returns the newly
/// appended range.
pub fn array_append_default<T: Default>(array: &mut Array<T>, count: usize) -> &mut [T] {
    array_append_default_in::<ReallocAllocator, T>(array, count)
}

/// [`array_append_default`] with an explicit allocation strategy.
pub fn array_append_default_in<A: ArrayAllocator<T>, T: Default>(
    array: &mut Array<T>,
    count: usize,
) -> &mut [T] {
    array_append_with_in::<A, T>(array, count, T::default)
}

/// Appends `count` elements produced by `f` and returns the newly appended
/// range.
pub fn array_append_with<T>(array: &mut Array<T>, count: usize, f: impl FnMut() -> T) -> &mut [T] {
    array_append_with_in::<ReallocAllocator, T>(array, count, f)
}

/// [`array_append_with`] with an explicit allocation strategy.
pub fn array_append_with_in<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    count: usize,
    mut f: impl FnMut() -> T,
) -> &mut [T] {
    if count == 0 {
        return &mut [];
    }
    let Some(slots) = grow_tail::<A, T>(array, count) else {
        return &mut [];
    };
    for i in 0..count {
        unsafe { slots.add(i).write(f()) };
        array.len += 1;
    }
    unsafe { std::slice::from_raw_parts_mut(slots, count) }
}

/// Appends `count` uninitialized slots and returns them.
///
/// # Safety
///
/// Every returned slot must be written before it is read, including
/// implicitly by the next operation that shifts, copies or drops elements,
/// and by the handle's own drop.
pub unsafe fn array_append_noinit<T>(array: &mut Array<T>, count: usize) -> &mut [MaybeUninit<T>] {
    unsafe { array_append_noinit_in::<ReallocAllocator, T>(array, count) }
}

/// [`array_append_noinit`] with an explicit allocation strategy.
///
/// # Safety
///
/// Same contract as [`array_append_noinit`].
pub unsafe fn array_append_noinit_in<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    count: usize,
) -> &mut [MaybeUninit<T>] {
    let Some(slots) = grow_tail::<A, T>(array, count) else {
        return &mut [];
    };
    array.len += count;
    unsafe { std::slice::from_raw_parts_mut(slots.cast::<MaybeUninit<T>>(), count) }
}

/// Inserts `value` at `index`, shifting the tail right, and returns a
/// reference to it.
///
/// # Panics
///
/// Panics if `index` is out of range or the allocation fails (reported to
/// the sink first).
pub fn array_insert<T>(array: &mut Array<T>, index: usize, value: T) -> &mut T {
    array_insert_in::<ReallocAllocator, T>(array, index, value)
}

/// [`array_insert`] with an explicit allocation strategy.
pub fn array_insert_in<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    index: usize,
    value: T,
) -> &mut T {
    let len = array.len;
    if index > len {
        refuse(Violation::OutOfRange {
            op: "array_insert",
            index,
            count: 1,
            len,
        });
    }
    let Some(slot) = open_gap::<A, T>(array, index, 1) else {
        panic!("array_insert: allocation failed");
    };
    unsafe { slot.write(value) };
    array.len = len + 1;
    unsafe { &mut *slot }
}

/// Inserts clones of `values` at `index` and returns the newly inserted
/// range.
pub fn array_insert_slice<'a, T: Clone>(
    array: &'a mut Array<T>,
    index: usize,
    values: &[T],
) -> &'a mut [T] {
    array_insert_slice_in::<ReallocAllocator, T>(array, index, values)
}

/// [`array_insert_slice`] with an explicit allocation strategy.
pub fn array_insert_slice_in<'a, A: ArrayAllocator<T>, T: Clone>(
    array: &'a mut Array<T>,
    index: usize,
    values: &[T],
) -> &'a mut [T] {
    let len = array.len;
    check!(
        index <= len,
        &mut [],
        Violation::OutOfRange {
            op: "array_insert_slice",
            index,
            count: values.len(),
            len,
        }
    );
    if values.is_empty() {
        return &mut [];
    }
    let Some(slots) = open_gap::<A, T>(array, index, values.len()) else {
        return &mut [];
    };
    for (i, value) in values.iter().enumerate() {
        unsafe { slots.add(i).write(value.clone()) };
    }
    array.len = len + values.len();
    unsafe { std::slice::from_raw_parts_mut(slots, values.len()) }
}

/// Inserts clones of the array's own `source` range at `index` and returns
/// the newly inserted range.
///
/// The insertion point may touch either bound of the source range but must
/// not fall strictly inside it; such a self-overlapping insert is reported
/// and refused with no mutation.
pub fn array_insert_within<T: Clone>(
    array: &mut Array<T>,
    index: usize,
    source: Range<usize>,
) -> &mut [T] {
    array_insert_within_in::<ReallocAllocator, T>(array, index, source)
}

/// [`array_insert_within`] with an explicit allocation strategy.
pub fn array_insert_within_in<A: ArrayAllocator<T>, T: Clone>(
    array: &mut Array<T>,
    index: usize,
    source: Range<usize>,
) -> &mut [T] {
    let len = array.len;
    check!(
        source.start <= source.end && source.end <= len && index <= len,
        &mut [],
        Violation::OutOfRange {
            op: "array_insert_within",
            index,
            count: source.end.saturating_sub(source.start),
            len,
        }
    );
    check!(
        index <= source.start || index >= source.end,
        &mut [],
        Violation::SelfSlice {
            op: "array_insert_within",
            begin: source.start,
            end: source.end,
            index,
        }
    );
    let count = source.end - source.start;
    if count == 0 {
        return &mut [];
    }
    let Some(slots) = open_gap::<A, T>(array, index, count) else {
        return &mut [];
    };
    for i in 0..count {
        // Source elements at or past the insertion point sit `count` slots
        // further right after the shift.
        let at = source.start + i;
        let at = if at < index { at } else { at + count };
        let value = unsafe { (*array.data.as_ptr().add(at)).clone() };
        unsafe { slots.add(i).write(value) };
    }
    array.len = len + count;
    unsafe { std::slice::from_raw_parts_mut(slots, count) }
}

/// Inserts `count` default-constructed elements at `index` and returns the
/// newly inserted range.
pub fn array_insert_default<T: Default>(
    array: &mut Array<T>,
    index: usize,
    count: usize,
) -> &mut [T] {
    array_insert_default_in::<ReallocAllocator, T>(array, index, count)
}

/// [`array_insert_default`] with an explicit allocation strategy.
pub fn array_insert_default_in<A: ArrayAllocator<T>, T: Default>(
    array: &mut Array<T>,
    index: usize,
    count: usize,
) -> &mut [T] {
    array_insert_with_in::<A, T>(array, index, count, T::default)
}

/// Inserts `count` elements produced by `f` at `index` and returns the newly
/// inserted range.
pub fn array_insert_with<T>(
    array: &mut Array<T>,
    index: usize,
    count: usize,
    f: impl FnMut() -> T,
) -> &mut [T] {
    array_insert_with_in::<ReallocAllocator, T>(array, index, count, f)
}

/// [`array_insert_with`] with an explicit allocation strategy.
pub fn array_insert_with_in<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    index: usize,
    count: usize,
    mut f: impl FnMut() -> T,
) -> &mut [T] {
    let len = array.len;
    check!(
        index <= len,
        &mut [],
        Violation::OutOfRange {
            op: "array_insert_with",
            index,
            count,
            len,
        }
    );
    if count == 0 {
        return &mut [];
    }
    let Some(slots) = open_gap::<A, T>(array, index, count) else {
        return &mut [];
    };
    for i in 0..count {
        unsafe { slots.add(i).write(f()) };
    }
    array.len = len + count;
    unsafe { std::slice::from_raw_parts_mut(slots, count) }
}

/// Inserts `count` uninitialized slots at `index` and returns them.
///
/// # Safety
///
/// Every returned slot must be written before it is read, including
/// implicitly by the next operation that shifts, copies or drops elements,
/// and by the handle's own drop.
pub unsafe fn array_insert_noinit<T>(
    array: &mut Array<T>,
    index: usize,
    count: usize,
) -> &mut [MaybeUninit<T>] {
    unsafe { array_insert_noinit_in::<ReallocAllocator, T>(array, index, count) }
}

/// [`array_insert_noinit`] with an explicit allocation strategy.
///
/// # Safety
///
/// Same contract as [`array_insert_noinit`].
pub unsafe fn array_insert_noinit_in<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    index: usize,
    count: usize,
) -> &mut [MaybeUninit<T>] {
    let len = array.len;
    check!(
        index <= len,
        &mut [],
        Violation::OutOfRange {
            op: "array_insert_noinit",
            index,
            count,
            len,
        }
    );
    if count == 0 {
        return &mut [];
    }
    let Some(slots) = open_gap::<A, T>(array, index, count) else {
        return &mut [];
    };
    array.len = len + count;
    unsafe { std::slice::from_raw_parts_mut(slots.cast::<MaybeUninit<T>>(), count) }
}

/// Removes `count` elements starting at `index`, shifting the tail left and
/// preserving element order.
///
/// A non-growable array is promoted to a growable allocation of exactly the
/// surviving count first; a plain allocation has no way to mark the vacated
/// trailing slots dead. Out-of-range arguments are reported and the call is
/// a no-op.
pub fn array_remove<T>(array: &mut Array<T>, index: usize, count: usize) {
    array_remove_in::<ReallocAllocator, T>(array, index, count)
}

/// [`array_remove`] with an explicit allocation strategy.
pub fn array_remove_in<A: ArrayAllocator<T>, T>(array: &mut Array<T>, index: usize, count: usize) {
    let len = array.len;
    check!(
        index.checked_add(count).is_some_and(|end| end <= len),
        (),
        Violation::OutOfRange {
            op: "array_remove",
            index,
            count,
            len,
        }
    );
    if count == 0 {
        return;
    }
    if array_is_growable_in::<A, T>(array) {
        let capacity = unsafe { A::capacity(array.data) };
        unsafe {
            let p = array.data.as_ptr();
            lifecycle::drop_range(p.add(index), count);
            lifecycle::relocate_within(p.add(index + count), p.add(index), len - index - count);
        }
        array.len = len - count;
        sanitizer::annotate(array.data.as_ptr(), capacity, len, len - count);
    } else {
        remove_into_growable::<A, T>(array, index, count);
    }
}

/// Removes `count` elements starting at `index` by moving the last `count`
/// elements into the gap instead of shifting the whole tail.
///
/// O(count) rather than O(len - index), at the price of element order; the
/// surviving multiset is the same as with [`array_remove`].
pub fn array_remove_unordered<T>(array: &mut Array<T>, index: usize, count: usize) {
    array_remove_unordered_in::<ReallocAllocator, T>(array, index, count)
}

/// [`array_remove_unordered`] with an explicit allocation strategy.
pub fn array_remove_unordered_in<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    index: usize,
    count: usize,
) {
    let len = array.len;
    check!(
        index.checked_add(count).is_some_and(|end| end <= len),
        (),
        Violation::OutOfRange {
            op: "array_remove_unordered",
            index,
            count,
            len,
        }
    );
    if count == 0 {
        return;
    }
    if array_is_growable_in::<A, T>(array) {
        let capacity = unsafe { A::capacity(array.data) };
        unsafe {
            let p = array.data.as_ptr();
            lifecycle::drop_range(p.add(index), count);
            let tail = len - index - count;
            let moved = count.min(tail);
            lifecycle::relocate(p.add(len - moved), p.add(index), moved);
        }
        array.len = len - count;
        sanitizer::annotate(array.data.as_ptr(), capacity, len, len - count);
    } else {
        // The promotion copies into a fresh block anyway, so there is no
        // cheaper order-breaking variant here.
        remove_into_growable::<A, T>(array, index, count);
    }
}

/// Removes the last `count` elements.
pub fn array_remove_suffix<T>(array: &mut Array<T>, count: usize) {
    array_remove_suffix_in::<ReallocAllocator, T>(array, count)
}

/// [`array_remove_suffix`] with an explicit allocation strategy.
pub fn array_remove_suffix_in<A: ArrayAllocator<T>, T>(array: &mut Array<T>, count: usize) {
    let len = array.len;
    check!(
        count <= len,
        (),
        Violation::OutOfRange {
            op: "array_remove_suffix",
            index: len.saturating_sub(count),
            count,
            len,
        }
    );
    if count == 0 {
        return;
    }
    if array_is_growable_in::<A, T>(array) {
        let capacity = unsafe { A::capacity(array.data) };
        unsafe { lifecycle::drop_range(array.data.as_ptr().add(len - count), count) };
        array.len = len - count;
        sanitizer::annotate(array.data.as_ptr(), capacity, len, len - count);
    } else {
        remove_into_growable::<A, T>(array, len - count, count);
    }
}

/// Destroys all elements.
///
/// A growable array keeps its allocation and capacity for reuse; a
/// non-growable one is released entirely, back to the canonical empty state,
/// since emptied it has no capacity to be worth keeping.
pub fn array_clear<T>(array: &mut Array<T>) {
    array_clear_in::<ReallocAllocator, T>(array)
}

/// [`array_clear`] with an explicit allocation strategy.
pub fn array_clear_in<A: ArrayAllocator<T>, T>(array: &mut Array<T>) {
    if array_is_growable_in::<A, T>(array) {
        let capacity = unsafe { A::capacity(array.data) };
        let len = array.len;
        unsafe { lifecycle::drop_range(array.data.as_ptr(), len) };
        array.len = 0;
        sanitizer::annotate(array.data.as_ptr(), capacity, len, 0);
    } else {
        drop(std::mem::take(array));
    }
}

/// Reallocates `array` down to an exact-size, non-growable block of its
/// current count.
///
/// An empty growable array collapses to the canonical empty state. A
/// non-growable array is left untouched.
pub fn array_shrink<T>(array: &mut Array<T>) {
    array_shrink_in::<ReallocAllocator, T>(array)
}

/// [`array_shrink`] with an explicit allocation strategy.
pub fn array_shrink_in<A: ArrayAllocator<T>, T>(array: &mut Array<T>) {
    if !array_is_growable_in::<A, T>(array) {
        return;
    }
    let len = array.len;
    if len == 0 {
        unsafe { discard_storage(array.data, 0, array.deleter) };
        array.data = NonNull::dangling();
        array.deleter = Deleter::Unowned;
        return;
    }
    let data = array::alloc_exact::<T>(len);
    unsafe {
        lifecycle::relocate(array.data.as_ptr(), data.as_ptr(), len);
        discard_storage(array.data, len, array.deleter);
    }
    array.data = data;
    array.deleter = Deleter::Exact;
}

/// Computes the capacity to grow to when `required` elements no longer fit.
///
/// In terms of total block bytes: below [`MIN_ALLOCATION`] the block jumps
/// to that quantum, below [`DOUBLING_CEILING`] it doubles, beyond it grows by
/// 50%. This lands small blocks on the allocator's natural size buckets
/// while keeping appends amortized O(1).
fn grow_capacity<T>(current: usize, required: usize) -> usize {
    let offset = layout::allocation_offset::<T>();
    let current_bytes = offset + current * size_of::<T>();
    let grown_bytes = if current_bytes < MIN_ALLOCATION {
        MIN_ALLOCATION
    } else if current_bytes < DOUBLING_CEILING {
        current_bytes * 2
    } else {
        current_bytes + current_bytes / 2
    };
    required.max((grown_bytes - offset) / size_of::<T>())
}

/// Makes room for `count` more elements at the end of `array` and returns a
/// pointer to the first new slot, growing or promoting the allocation as
/// needed.
///
/// The new slots are uninitialized and not yet part of the count; the caller
/// fills them and then advances `array.len`. Returns `None` (reported) if
/// the allocation fails, leaving the array untouched.
fn grow_tail<A: ArrayAllocator<T>, T>(array: &mut Array<T>, count: usize) -> Option<*mut T> {
    let len = array.len;
    if count == 0 {
        return Some(unsafe { array.data.as_ptr().add(len) });
    }
    let Some(needed) = len.checked_add(count) else {
        diag::report(Violation::AllocationFailure {
            allocator: A::NAME,
            bytes: usize::MAX,
        });
        return None;
    };
    if array_is_growable_in::<A, T>(array) {
        let capacity = unsafe { A::capacity(array.data) };
        if needed <= capacity {
            sanitizer::annotate(array.data.as_ptr(), capacity, len, needed);
            return Some(unsafe { array.data.as_ptr().add(len) });
        }
        let new_capacity = grow_capacity::<T>(capacity, needed);
        sanitizer::annotate(array.data.as_ptr(), capacity, len, capacity);
        match unsafe { A::grow(array.data, len, new_capacity) } {
            Some(data) => {
                array.data = data;
                sanitizer::annotate(data.as_ptr(), new_capacity, new_capacity, needed);
                Some(unsafe { data.as_ptr().add(len) })
            }
            None => {
                sanitizer::annotate(array.data.as_ptr(), capacity, capacity, len);
                None
            }
        }
    } else {
        let new_capacity = grow_capacity::<T>(len, needed);
        let data = A::allocate(new_capacity)?;
        unsafe {
            lifecycle::relocate(array.data.as_ptr(), data.as_ptr(), len);
            discard_storage(array.data, len, array.deleter);
        }
        array.data = data;
        array.deleter = Deleter::Growable(A::ID);
        sanitizer::annotate(data.as_ptr(), new_capacity, new_capacity, needed);
        Some(unsafe { data.as_ptr().add(len) })
    }
}

/// Opens a gap of `count` uninitialized slots at `index`, shifting the tail
/// right, and returns a pointer to the first gap slot.
///
/// On return `array.len` is rolled back to `index`: the gap and the shifted
/// tail are untracked until the caller fills the gap and commits the new
/// count, so a panicking fill can at worst leak, never double-drop. The
/// caller must have validated `index <= array.len` and `count > 0`.
fn open_gap<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    index: usize,
    count: usize,
) -> Option<*mut T> {
    let len = array.len;
    let Some(needed) = len.checked_add(count) else {
        diag::report(Violation::AllocationFailure {
            allocator: A::NAME,
            bytes: usize::MAX,
        });
        return None;
    };
    if array_is_growable_in::<A, T>(array) {
        let capacity = unsafe { A::capacity(array.data) };
        if needed > capacity {
            let new_capacity = grow_capacity::<T>(capacity, needed);
            sanitizer::annotate(array.data.as_ptr(), capacity, len, capacity);
            match unsafe { A::grow(array.data, len, new_capacity) } {
                Some(data) => {
                    array.data = data;
                    sanitizer::annotate(data.as_ptr(), new_capacity, new_capacity, needed);
                }
                None => {
                    sanitizer::annotate(array.data.as_ptr(), capacity, capacity, len);
                    return None;
                }
            }
        } else {
            sanitizer::annotate(array.data.as_ptr(), capacity, len, needed);
        }
        unsafe {
            let p = array.data.as_ptr();
            lifecycle::relocate_within(p.add(index), p.add(index + count), len - index);
        }
        array.len = index;
        Some(unsafe { array.data.as_ptr().add(index) })
    } else {
        let new_capacity = grow_capacity::<T>(len, needed);
        let data = A::allocate(new_capacity)?;
        unsafe {
            lifecycle::relocate(array.data.as_ptr(), data.as_ptr(), index);
            lifecycle::relocate(
                array.data.as_ptr().add(index),
                data.as_ptr().add(index + count),
                len - index,
            );
            discard_storage(array.data, len, array.deleter);
        }
        array.data = data;
        array.deleter = Deleter::Growable(A::ID);
        sanitizer::annotate(data.as_ptr(), new_capacity, new_capacity, needed);
        array.len = index;
        Some(unsafe { data.as_ptr().add(index) })
    }
}

/// Shared shrinking core of [`array_resize`] and friends.
fn resize_impl<A: ArrayAllocator<T>, T>(
    array: &mut Array<T>,
    new_len: usize,
    fill: impl FnOnce(*mut T, usize),
) {
    let len = array.len;
    if new_len == len {
        return;
    }
    if new_len < len {
        if array_is_growable_in::<A, T>(array) {
            let capacity = unsafe { A::capacity(array.data) };
            unsafe { lifecycle::drop_range(array.data.as_ptr().add(new_len), len - new_len) };
            array.len = new_len;
            sanitizer::annotate(array.data.as_ptr(), capacity, len, new_len);
        } else {
            let Some(data) = A::allocate(new_len) else {
                return;
            };
            unsafe {
                lifecycle::relocate(array.data.as_ptr(), data.as_ptr(), new_len);
                lifecycle::drop_range(array.data.as_ptr().add(new_len), len - new_len);
                discard_storage(array.data, len, array.deleter);
            }
            array.data = data;
            array.len = new_len;
            array.deleter = Deleter::Growable(A::ID);
        }
        return;
    }
    // Growing; a reallocation sizes the block to exactly `new_len`.
    if array_is_growable_in::<A, T>(array) {
        let capacity = unsafe { A::capacity(array.data) };
        if capacity >= new_len {
            sanitizer::annotate(array.data.as_ptr(), capacity, len, new_len);
            fill(unsafe { array.data.as_ptr().add(len) }, new_len - len);
            array.len = new_len;
            return;
        }
        sanitizer::annotate(array.data.as_ptr(), capacity, len, capacity);
        match unsafe { A::grow(array.data, len, new_len) } {
            Some(data) => {
                array.data = data;
                fill(unsafe { data.as_ptr().add(len) }, new_len - len);
                array.len = new_len;
            }
            None => sanitizer::annotate(array.data.as_ptr(), capacity, capacity, len),
        }
    } else {
        let Some(data) = A::allocate(new_len) else {
            return;
        };
        unsafe {
            lifecycle::relocate(array.data.as_ptr(), data.as_ptr(), len);
            discard_storage(array.data, len, array.deleter);
        }
        array.data = data;
        array.deleter = Deleter::Growable(A::ID);
        fill(unsafe { data.as_ptr().add(len) }, new_len - len);
        array.len = new_len;
    }
}

/// Moves the surviving elements into a fresh growable block of exactly the
/// surviving count, destroying the removed range and releasing the previous
/// storage.
///
/// Removal always promotes a non-growable array: without the capacity
/// header there is no reliable way to know which trailing slots are dead.
fn remove_into_growable<A: ArrayAllocator<T>, T>(array: &mut Array<T>, index: usize, count: usize) {
    let len = array.len;
    let remaining = len - count;
    let Some(data) = A::allocate(remaining) else {
        return;
    };
    unsafe {
        let p = array.data.as_ptr();
        lifecycle::relocate(p, data.as_ptr(), index);
        lifecycle::relocate(
            p.add(index + count),
            data.as_ptr().add(index),
            len - index - count,
        );
        lifecycle::drop_range(p.add(index), count);
        discard_storage(array.data, len, array.deleter);
    }
    array.data = data;
    array.len = remaining;
    array.deleter = Deleter::Growable(A::ID);
}

/// Releases a block without touching element lifetimes; the live elements
/// are assumed to have been relocated elsewhere (or destroyed) already.
unsafe fn discard_storage<T>(data: NonNull<T>, len: usize, deleter: Deleter) {
    match deleter {
        Deleter::Unowned => {}
        Deleter::Exact => unsafe { array::dealloc_exact(data, len) },
        Deleter::Growable(id) => unsafe {
            let capacity = strategy::capacity_for(id, data);
            sanitizer::annotate(data.as_ptr(), capacity, len, capacity);
            strategy::deallocate_for(id, data);
        },
    }
}

/// Reports a violation an operation cannot recover from and panics with the
/// same message.
#[cold]
fn refuse(violation: Violation) -> ! {
    let message = violation.to_string();
    diag::report(violation);
    panic!("{message}");
}
