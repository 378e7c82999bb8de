use slot_arena::ArenaError;
use thiserror::Error;

/// Errors surfaced by fallible pool operations.
///
/// Every failure leaves the pool exactly as it was before the call; nothing is retried
/// internally.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The pool already holds as many slots as its handle type can index, so it cannot grow.
    #[error("pool has reached the handle-space limit of {limit} slots")]
    CapacityOverflow {
        /// The handle type's capacity ceiling.
        limit: u32,
    },

    /// The backing arena could not provide a new chunk.
    #[error(transparent)]
    Arena(#[from] ArenaError),
}
