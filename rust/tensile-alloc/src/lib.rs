//! Allocation-block layout and the allocator strategies backing growable
//! arrays.
//!
//! A growable block is a single heap allocation of the shape
//! `[ capacity header | padding | element slots... ]`, where the header is a
//! `usize` holding the usable byte capacity of the slot region. The handle
//! that owns such a block points directly at slot 0; the header lives at a
//! fixed, type-dependent offset before it (see [`layout`]).
//!
//! Two strategies produce and grow these blocks: [`heap::ReallocAllocator`]
//! hands the whole block to the global allocator's `realloc`, while
//! [`moving::MovingAllocator`] always allocates fresh storage and migrates
//! the live elements.

pub mod heap;
pub mod layout;
pub mod moving;
pub mod strategy;

pub use heap::ReallocAllocator;
pub use moving::MovingAllocator;
pub use strategy::{AllocatorId, ArrayAllocator};
