//! A chunked raw-memory arena that hands out stable slot addresses across growth.
//!
//! This crate provides [`SlotArena`] and its fixed-page sibling [`PagedSlotArena`]: containers of
//! raw, uninitialized, alignment-correct storage slots. The arena grows by appending whole chunks
//! instead of reallocating, so the address of a slot never changes for as long as its chunk exists.
//! Slots across all chunks are addressed through a single contiguous index space.
//!
//! The arena is pure address-space management. It never constructs or destroys objects; whoever
//! writes an object into a slot is responsible for dropping it before the chunk is released. The
//! typical consumer is an object pool layered on top, which tracks occupancy and performs the
//! placement writes and drops.
//!
//! # Key Features
//!
//! - **Stable addresses**: appending a chunk never moves existing slots
//! - **One index space**: a global slot index resolves across all chunks
//! - **Stack-discipline shrinking**: the most recently appended chunk can be released
//! - **Accounting hooks**: an [`ArenaObserver`] receives a notification for every chunk
//!   allocated or released, with slot-count and byte-size deltas
//! - **No hidden construction**: memory is handed out uninitialized and released as-is
//!
//! # Example
//!
//! ```rust
//! use std::num::NonZero;
//!
//! use slot_arena::SlotArena;
//!
//! let mut arena = SlotArena::for_type::<u64>();
//! assert_eq!(arena.storage_count(), 0);
//!
//! arena.try_allocate(NonZero::new(512).unwrap()).unwrap();
//! arena.try_allocate(NonZero::new(256).unwrap()).unwrap();
//! assert_eq!(arena.storage_count(), 2);
//! assert_eq!(arena.len(), 768);
//!
//! // Write and read a slot through its raw address.
//! let slot = arena.slot_ptr(600).cast::<u64>();
//! // SAFETY: The index is in bounds and the slot is ours to use; u64 needs no drop.
//! unsafe {
//!     slot.write(42);
//!     assert_eq!(slot.read(), 42);
//! }
//!
//! arena.deallocate();
//! assert_eq!(arena.len(), 512);
//! ```

mod arena;
mod chunk;
mod errors;
mod observer;
mod paged;

pub use arena::*;
pub(crate) use chunk::*;
pub use errors::*;
pub use observer::*;
pub use paged::*;
