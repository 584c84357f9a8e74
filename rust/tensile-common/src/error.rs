use thiserror::Error;

/// A violated precondition of one of the array operations.
///
/// Violations are not threaded through return values; they are delivered to
/// the report sink (see [`crate::diag`]) and the offending call becomes a
/// no-op, returning a neutral value where its signature requires one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{op}: index {index} and count {count} out of range for size {len}")]
    OutOfRange {
        op: &'static str,
        index: usize,
        count: usize,
        len: usize,
    },

    #[error("{op}: can't insert a slice [{begin}..{end}] of the array into itself at index {index}")]
    SelfSlice {
        op: &'static str,
        begin: usize,
        end: usize,
        index: usize,
    },

    #[error("{allocator}: can't allocate {bytes} bytes")]
    AllocationFailure {
        allocator: &'static str,
        bytes: usize,
    },

    #[error("{allocator}: can't reallocate {bytes} bytes")]
    ReallocationFailure {
        allocator: &'static str,
        bytes: usize,
    },

    #[error("array_allocator_cast: the array has to use the realloc-backed allocator")]
    CastAllocatorMismatch,

    #[error(
        "array_allocator_cast: can't reinterpret {len} {from_size}-byte elements into a {to_size}-byte type"
    )]
    CastIndivisible {
        len: usize,
        from_size: usize,
        to_size: usize,
    },

    #[error("array_allocator_cast: source and destination element types have different allocation layouts")]
    CastLayoutMismatch,
}
