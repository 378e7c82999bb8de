//! Basic usage of the `slot_arena` crate:
//!
//! * Creating an arena.
//! * Growing it by whole chunks.
//! * Writing and reading slots through stable addresses.
//! * Shrinking it back down.

use std::num::NonZero;

use slot_arena::SlotArena;

fn main() {
    let mut arena = SlotArena::for_type::<u64>();

    // An arena starts with no storage at all; every chunk is an explicit request.
    arena
        .try_allocate(NonZero::new(512).unwrap())
        .expect("initial chunk allocation failed");

    println!(
        "Arena holds {} slots in {} chunk(s), {} bytes apart",
        arena.len(),
        arena.storage_count(),
        arena.slot_stride()
    );

    // The arena hands out raw slot addresses; initializing them is our job.
    for index in 0..arena.len() {
        let slot = arena.slot_ptr(index).cast::<u64>();

        // SAFETY: The index is in bounds, the slot is uninitialized raw memory that
        // only we touch, and u64 does not need to be dropped.
        unsafe {
            slot.write(index as u64 * 7);
        }
    }

    let watched = arena.slot_ptr(100);

    // Growth appends a chunk. Nothing moves: the address of slot 100 is unchanged.
    arena
        .try_allocate(NonZero::new(512).unwrap())
        .expect("growth allocation failed");
    assert_eq!(arena.slot_ptr(100), watched);

    println!(
        "After growth: {} slots in {} chunk(s)",
        arena.len(),
        arena.storage_count()
    );

    // The most recent chunk can be released again (nothing live is in it).
    arena.deallocate();
    println!(
        "After shrink: {} slots in {} chunk(s)",
        arena.len(),
        arena.storage_count()
    );
}
