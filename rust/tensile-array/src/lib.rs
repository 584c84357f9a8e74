//! A growable array built on plain heap allocations.
//!
//! [`Array<T>`] is an exclusive-ownership handle over a contiguous run of
//! elements. On its own it behaves like a boxed slice; the free operations in
//! [`growable`] (`array_append`, `array_insert`, `array_remove`,
//! `array_reserve`, …) promote it on demand to a *growable* allocation that
//! carries a hidden capacity header, giving amortized O(1) appends without
//! the handle tracking capacity separately.
//!
//! Element lifecycles are managed precisely: every slot is constructed and
//! destroyed exactly once, across reallocation, tail shifting and partial
//! removal. The allocation strategy is pluggable per call through the `_in`
//! operation variants (see [`tensile_alloc`]).

pub mod array;
pub mod cast;
pub mod growable;
pub mod lifecycle;
mod sanitizer;

pub use array::{Array, Deleter};
pub use cast::array_allocator_cast;
pub use growable::{
    array_append, array_append_default, array_append_default_in, array_append_in,
    array_append_noinit, array_append_noinit_in, array_append_slice, array_append_slice_in,
    array_append_with, array_append_with_in, array_append_within, array_append_within_in,
    array_capacity, array_capacity_in, array_clear, array_clear_in, array_insert,
    array_insert_default, array_insert_default_in, array_insert_in, array_insert_noinit,
    array_insert_noinit_in, array_insert_slice, array_insert_slice_in, array_insert_with,
    array_insert_with_in, array_insert_within, array_insert_within_in, array_is_growable,
    array_is_growable_in, array_remove, array_remove_in, array_remove_suffix,
    array_remove_suffix_in, array_remove_unordered, array_remove_unordered_in, array_reserve,
    array_reserve_in, array_resize, array_resize_filled, array_resize_filled_in,
    array_resize_in, array_resize_noinit, array_resize_noinit_in, array_resize_with,
    array_resize_with_in, array_shrink, array_shrink_in,
};
