use std::alloc::Layout;
use std::any::type_name;
use std::num::NonZero;
use std::ptr::NonNull;

use crate::{ArenaError, ArenaObserver, Chunk, NoOpObserver};

/// The element-type label used by arenas created without type information.
pub const UNTYPED_LABEL: &str = "<untyped>";

/// A growable arena of raw storage slots, organized as a sequence of chunks.
///
/// Every chunk holds some number of element-sized, alignment-correct slots. Appending a chunk
/// with [`try_allocate()`][Self::try_allocate] extends a single global index space without moving
/// any existing slot, so an address obtained from [`slot_ptr()`][Self::slot_ptr] stays valid until
/// the owning chunk is released. Only the most recently appended chunk can be released
/// ([`deallocate()`][Self::deallocate]), giving the chunk sequence stack discipline.
///
/// The arena manages addresses, not objects: slots are handed out uninitialized and released
/// without any destructor running. A caller that placement-writes objects into slots must drop
/// them in place before the backing chunk goes away.
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
///
/// use slot_arena::SlotArena;
///
/// let mut arena = SlotArena::for_type::<u32>();
/// arena.try_allocate(NonZero::new(512).unwrap()).unwrap();
///
/// let first = arena.slot_ptr(0);
/// arena.try_allocate(NonZero::new(512).unwrap()).unwrap();
///
/// // Growth appends a chunk; it never relocates slot 0.
/// assert_eq!(arena.slot_ptr(0), first);
/// assert_eq!(arena.len(), 1024);
/// ```
#[derive(Debug)]
pub struct SlotArena<O = NoOpObserver>
where
    O: ArenaObserver,
{
    /// Append-only except for the removal of the most recent entry.
    chunks: Vec<Chunk>,

    /// Size and alignment of one slot, fixed for the arena's lifetime.
    slot_layout: Layout,

    /// Distance in bytes between consecutive slots: `slot_layout` padded to its own alignment,
    /// exactly as array elements are spaced.
    slot_stride: usize,

    /// Sum of the chunk slot counts; the exclusive upper bound of the index space.
    total_slots: usize,

    type_label: &'static str,

    observer: O,
}

impl SlotArena {
    /// Creates an empty arena for slots of the given layout, with no chunks and the default
    /// (no-op) observer.
    ///
    /// # Panics
    ///
    /// Panics if the layout is zero-sized.
    #[must_use]
    pub fn new(slot_layout: Layout) -> Self {
        Self::with_observer(slot_layout, UNTYPED_LABEL, NoOpObserver)
    }

    /// Creates an empty arena whose slot layout and type label are derived from `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn for_type<T>() -> Self {
        Self::with_observer(Layout::new::<T>(), type_name::<T>(), NoOpObserver)
    }
}

impl<O> SlotArena<O>
where
    O: ArenaObserver,
{
    /// Creates an empty arena with a caller-supplied type label and observer.
    ///
    /// The observer receives one [`storage_changed()`][ArenaObserver::storage_changed]
    /// notification per chunk allocated or released for the rest of the arena's life.
    ///
    /// # Panics
    ///
    /// Panics if the layout is zero-sized.
    #[must_use]
    pub fn with_observer(slot_layout: Layout, type_label: &'static str, observer: O) -> Self {
        assert!(
            slot_layout.size() > 0,
            "SlotArena must have non-zero slot size"
        );

        Self {
            chunks: Vec::new(),
            slot_layout,
            slot_stride: slot_layout.pad_to_align().size(),
            total_slots: 0,
            type_label,
            observer,
        }
    }

    /// Appends one chunk able to hold `slot_count` additional slots of uninitialized memory.
    ///
    /// On success the new slots occupy indexes `len() - slot_count .. len()` and the observer
    /// is notified with positive deltas. On failure the arena is left exactly as it was.
    ///
    /// # Errors
    ///
    /// [`ArenaError::CapacityOverflow`] if the chunk's byte size, or the arena's resulting total
    /// byte size, does not fit `usize`; [`ArenaError::AllocationFailed`] if the system allocator
    /// declines the request.
    pub fn try_allocate(&mut self, slot_count: NonZero<usize>) -> Result<(), ArenaError> {
        let block_layout = self.chunk_layout(slot_count.get())?;

        let chunk = Chunk::allocate(block_layout, slot_count.get()).ok_or(
            ArenaError::AllocationFailed {
                slot_count: slot_count.get(),
                byte_size: block_layout.size(),
            },
        )?;

        self.total_slots = self
            .total_slots
            .checked_add(slot_count.get())
            .expect("guarded by the resulting-size check in chunk_layout()");
        self.chunks.push(chunk);

        self.notify_storage_changed(slot_count.get(), block_layout.size(), 1);

        Ok(())
    }

    /// Releases the most recently appended chunk and shrinks the index space accordingly.
    ///
    /// The caller must guarantee that no slot in that chunk still holds a live object; the arena
    /// releases the memory without running any destructor. The observer is notified with
    /// negative deltas.
    ///
    /// # Panics
    ///
    /// Panics if the arena has no chunks.
    pub fn deallocate(&mut self) {
        let chunk = self
            .chunks
            .pop()
            .expect("deallocate() called on an arena with no storage");

        self.total_slots = self
            .total_slots
            .checked_sub(chunk.slot_count())
            .expect("total slot count is the sum of chunk slot counts");

        self.notify_storage_changed(chunk.slot_count(), chunk.byte_size(), -1);
    }

    /// Resolves a global slot index to the address of that slot.
    ///
    /// The returned address is stable: it does not change across later [`try_allocate()`] calls,
    /// only becoming invalid when the owning chunk is released.
    ///
    /// [`try_allocate()`]: Self::try_allocate
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn slot_ptr(&self, index: usize) -> NonNull<u8> {
        assert!(
            index < self.total_slots,
            "slot index {index} out of bounds in arena of {} ({} slots)",
            self.type_label,
            self.total_slots
        );

        let mut remaining = index;

        for chunk in &self.chunks {
            if remaining < chunk.slot_count() {
                // Cannot overflow because the offset stays within the chunk's byte size,
                // which a successful allocation proved to fit usize.
                let offset = remaining.wrapping_mul(self.slot_stride);

                // SAFETY: `remaining < slot_count`, so the offset is within the chunk's
                // allocation, which was sized as stride times slot count.
                return unsafe { chunk.base().add(offset) };
            }

            remaining = remaining.wrapping_sub(chunk.slot_count());
        }

        unreachable!("total slot count is the sum of chunk slot counts")
    }

    /// The number of chunks currently backing the arena.
    #[must_use]
    pub fn storage_count(&self) -> usize {
        self.chunks.len()
    }

    /// The total number of slots across all chunks.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub fn len(&self) -> usize {
        self.total_slots
    }

    /// Whether the arena currently holds no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_slots == 0
    }

    /// The layout of one slot.
    #[must_use]
    pub fn slot_layout(&self) -> Layout {
        self.slot_layout
    }

    /// The distance in bytes between consecutive slots.
    #[must_use]
    pub fn slot_stride(&self) -> usize {
        self.slot_stride
    }

    /// The element-type label used in observer notifications.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        self.type_label
    }

    /// The observer receiving this arena's notifications.
    #[must_use]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Computes the allocation layout for a chunk of `slot_count` slots, rejecting any request
    /// whose own size or resulting arena size would overflow the index type.
    fn chunk_layout(&self, slot_count: usize) -> Result<Layout, ArenaError> {
        let overflow = || ArenaError::CapacityOverflow {
            requested_slots: slot_count,
        };

        let byte_size = self
            .slot_stride
            .checked_mul(slot_count)
            .ok_or_else(overflow)?;

        // The combined arena must stay addressable too, not just the one chunk.
        let resulting_slots = self
            .total_slots
            .checked_add(slot_count)
            .ok_or_else(overflow)?;
        resulting_slots
            .checked_mul(self.slot_stride)
            .ok_or_else(overflow)?;

        Layout::from_size_align(byte_size, self.slot_layout.align()).map_err(|_| overflow())
    }

    #[cfg_attr(test, mutants::skip)] // Accounting only; correctness is asserted via observers in tests.
    fn notify_storage_changed(&self, slot_count: usize, byte_size: usize, sign: i64) {
        let slot_delta = i64::try_from(slot_count)
            .expect("a chunk's slot count cannot exceed the signed 64-bit range");
        let byte_delta = i64::try_from(byte_size)
            .expect("a chunk's byte size cannot exceed the signed 64-bit range");

        self.observer.storage_changed(
            self.type_label,
            slot_delta.wrapping_mul(sign),
            byte_delta.wrapping_mul(sign),
        );
    }
}

impl<O> Drop for SlotArena<O>
where
    O: ArenaObserver,
{
    fn drop(&mut self) {
        // Release through deallocate() so the observer sees the final negative deltas too.
        while !self.chunks.is_empty() {
            self.deallocate();
        }
    }
}
