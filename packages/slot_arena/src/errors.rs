use thiserror::Error;

/// Errors surfaced by arena storage operations.
///
/// Neither variant is ever recovered from internally; the operation that hit the error leaves
/// the arena exactly as it was before the call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArenaError {
    /// The requested chunk, or the arena's resulting total size, does not fit the addressable
    /// byte range of the index type.
    #[error("storage request of {requested_slots} slots does not fit the addressable byte range")]
    CapacityOverflow {
        /// Number of slots in the rejected request.
        requested_slots: usize,
    },

    /// The system allocator declined the chunk request.
    #[error("system allocator declined a request of {byte_size} bytes ({slot_count} slots)")]
    AllocationFailed {
        /// Number of slots in the failed request.
        slot_count: usize,

        /// Byte size of the failed request.
        byte_size: usize,
    },
}
