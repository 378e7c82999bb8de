use std::alloc::{Layout, alloc, dealloc};
use std::ptr::NonNull;

/// One contiguously allocated block of raw slots.
///
/// The chunk owns its allocation but knows nothing about what the caller keeps in it: no slot is
/// ever constructed or destroyed here, and dropping the chunk releases the memory as-is. Whoever
/// placed objects into the chunk must drop them first.
#[derive(Debug)]
pub(crate) struct Chunk {
    base: NonNull<u8>,

    /// Number of slots this chunk contributes to the arena's index space.
    slot_count: usize,

    /// The exact layout handed to `alloc`, retained because `dealloc` must be called with the
    /// same layout.
    block_layout: Layout,
}

impl Chunk {
    /// Allocates a chunk able to hold `slot_count` slots.
    ///
    /// `block_layout` must already account for slot stride times count; the arena computes it and
    /// checks it for overflow before calling here. Returns `None` if the system allocator declines
    /// the request.
    pub(crate) fn allocate(block_layout: Layout, slot_count: usize) -> Option<Self> {
        debug_assert!(block_layout.size() > 0, "chunks are never zero-sized");

        // SAFETY: The layout is non-zero-sized, as guaranteed by the caller and checked above.
        let base = NonNull::new(unsafe { alloc(block_layout) })?;

        Some(Self {
            base,
            slot_count,
            block_layout,
        })
    }

    #[must_use]
    pub(crate) fn base(&self) -> NonNull<u8> {
        self.base
    }

    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub(crate) fn slot_count(&self) -> usize {
        self.slot_count
    }

    #[must_use]
    pub(crate) fn byte_size(&self) -> usize {
        self.block_layout.size()
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: `base` came from `alloc` with `block_layout` and is released exactly once,
        // with the layout matching between alloc and dealloc.
        unsafe {
            dealloc(self.base.as_ptr(), self.block_layout);
        }
    }
}

// SAFETY: The chunk is raw memory owned exclusively by this value; nothing about it is tied
// to a particular thread.
unsafe impl Send for Chunk {}
