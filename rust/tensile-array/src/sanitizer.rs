//! AddressSanitizer annotations for the unused capacity tail.
//!
//! A growable block keeps `capacity - len` slots of constructed-but-unused
//! storage past the visible end. With the `asan` feature enabled (and the
//! binary built with `-Zsanitizer=address`), every mutating operation moves
//! the accessible/poisoned boundary along, so stray reads into the reserved
//! tail are caught by the tool. Without the feature this module compiles to
//! nothing; functional behavior is identical either way.

#[cfg(feature = "asan")]
unsafe extern "C" {
    fn __sanitizer_annotate_contiguous_container(
        beg: *const core::ffi::c_void,
        end: *const core::ffi::c_void,
        old_mid: *const core::ffi::c_void,
        new_mid: *const core::ffi::c_void,
    );
}

/// Moves the accessible/poisoned boundary of the block at `data` from
/// `old_len` to `new_len` live elements.
///
/// For a freshly obtained block pass `old_len == capacity` (nothing is
/// poisoned yet); before handing a block to `realloc` or freeing it, pass
/// `new_len == capacity` to unpoison the whole region.
#[inline]
pub(crate) fn annotate<T>(data: *const T, capacity: usize, old_len: usize, new_len: usize) {
    #[cfg(feature = "asan")]
    unsafe {
        __sanitizer_annotate_contiguous_container(
            data.cast(),
            data.add(capacity).cast(),
            data.add(old_len).cast(),
            data.add(new_len).cast(),
        );
    }
    #[cfg(not(feature = "asan"))]
    {
        let _ = (data, capacity, old_len, new_len);
    }
}
