use std::alloc::Layout;
use std::any::type_name;
use std::num::NonZero;
use std::ptr::NonNull;

use num_integer::Integer;

use crate::{ArenaError, ArenaObserver, Chunk, NoOpObserver, UNTYPED_LABEL};

/// A [`SlotArena`][crate::SlotArena] variant in which every chunk is one page of a size fixed at
/// construction.
///
/// Growing always appends exactly one page, so [`try_allocate()`][Self::try_allocate] takes no
/// size argument and a global index resolves to a (page, offset) pair with a single division
/// instead of a walk over the chunk list. Everything else matches the variable-chunk arena:
/// stable addresses, stack-discipline shrinking, observer accounting, and no construction or
/// destruction of objects.
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
///
/// use slot_arena::PagedSlotArena;
///
/// let mut arena = PagedSlotArena::for_type::<u32>(NonZero::new(512).unwrap());
/// arena.try_allocate().unwrap();
/// assert_eq!(arena.len(), 512);
///
/// arena.try_allocate().unwrap();
/// assert_eq!(arena.storage_count(), 2);
/// assert_eq!(arena.len(), 1024);
/// ```
#[derive(Debug)]
pub struct PagedSlotArena<O = NoOpObserver>
where
    O: ArenaObserver,
{
    /// Append-only except for the removal of the most recent entry. Every entry holds exactly
    /// `page_slots` slots.
    pages: Vec<Chunk>,

    slot_layout: Layout,

    /// Distance in bytes between consecutive slots within a page.
    slot_stride: usize,

    /// The uniform page size, fixed at construction.
    page_slots: NonZero<usize>,

    type_label: &'static str,

    observer: O,
}

impl PagedSlotArena {
    /// Creates an empty paged arena for slots of the given layout.
    ///
    /// # Panics
    ///
    /// Panics if the layout is zero-sized.
    #[must_use]
    pub fn new(slot_layout: Layout, page_slots: NonZero<usize>) -> Self {
        Self::with_observer(slot_layout, page_slots, UNTYPED_LABEL, NoOpObserver)
    }

    /// Creates an empty paged arena whose slot layout and type label are derived from `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn for_type<T>(page_slots: NonZero<usize>) -> Self {
        Self::with_observer(
            Layout::new::<T>(),
            page_slots,
            type_name::<T>(),
            NoOpObserver,
        )
    }
}

impl<O> PagedSlotArena<O>
where
    O: ArenaObserver,
{
    /// Creates an empty paged arena with a caller-supplied type label and observer.
    ///
    /// # Panics
    ///
    /// Panics if the layout is zero-sized.
    #[must_use]
    pub fn with_observer(
        slot_layout: Layout,
        page_slots: NonZero<usize>,
        type_label: &'static str,
        observer: O,
    ) -> Self {
        assert!(
            slot_layout.size() > 0,
            "PagedSlotArena must have non-zero slot size"
        );

        Self {
            pages: Vec::new(),
            slot_layout,
            slot_stride: slot_layout.pad_to_align().size(),
            page_slots,
            type_label,
            observer,
        }
    }

    /// Appends one page of uninitialized memory.
    ///
    /// On failure the arena is left exactly as it was.
    ///
    /// # Errors
    ///
    /// [`ArenaError::CapacityOverflow`] if the page's byte size, or the arena's resulting total
    /// byte size, does not fit `usize`; [`ArenaError::AllocationFailed`] if the system allocator
    /// declines the request.
    pub fn try_allocate(&mut self) -> Result<(), ArenaError> {
        let block_layout = self.page_layout()?;

        let chunk = Chunk::allocate(block_layout, self.page_slots.get()).ok_or(
            ArenaError::AllocationFailed {
                slot_count: self.page_slots.get(),
                byte_size: block_layout.size(),
            },
        )?;

        self.pages.push(chunk);

        self.notify_storage_changed(block_layout.size(), 1);

        Ok(())
    }

    /// Releases the most recently appended page.
    ///
    /// The caller must guarantee that no slot in that page still holds a live object.
    ///
    /// # Panics
    ///
    /// Panics if the arena has no pages.
    pub fn deallocate(&mut self) {
        let page = self
            .pages
            .pop()
            .expect("deallocate() called on an arena with no storage");

        self.notify_storage_changed(page.byte_size(), -1);
    }

    /// Resolves a global slot index to the address of that slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn slot_ptr(&self, index: usize) -> NonNull<u8> {
        assert!(
            index < self.len(),
            "slot index {index} out of bounds in arena of {} ({} slots)",
            self.type_label,
            self.len()
        );

        let (page_index, index_in_page) = index.div_rem(&self.page_slots.get());

        let page = self
            .pages
            .get(page_index)
            .expect("guarded by bounds check above");

        // Cannot overflow because the offset stays within the page's byte size, which a
        // successful allocation proved to fit usize.
        let offset = index_in_page.wrapping_mul(self.slot_stride);

        // SAFETY: `index_in_page < page_slots`, so the offset is within the page's allocation.
        unsafe { page.base().add(offset) }
    }

    /// The number of pages currently backing the arena.
    #[must_use]
    pub fn storage_count(&self) -> usize {
        self.pages.len()
    }

    /// The total number of slots across all pages.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub fn len(&self) -> usize {
        self.pages
            .len()
            .checked_mul(self.page_slots.get())
            .expect("every allocation checked the resulting total size")
    }

    /// Whether the arena currently holds no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The uniform number of slots per page.
    #[must_use]
    pub fn page_slots(&self) -> NonZero<usize> {
        self.page_slots
    }

    /// The layout of one slot.
    #[must_use]
    pub fn slot_layout(&self) -> Layout {
        self.slot_layout
    }

    /// The distance in bytes between consecutive slots within a page.
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

    /// Computes the allocation layout for one page, rejecting growth whose own size or resulting
    /// arena size would overflow the index type.
    fn page_layout(&self) -> Result<Layout, ArenaError> {
        let overflow = || ArenaError::CapacityOverflow {
            requested_slots: self.page_slots.get(),
        };

        let byte_size = self
            .slot_stride
            .checked_mul(self.page_slots.get())
            .ok_or_else(overflow)?;

        let resulting_pages = self
            .pages
            .len()
            .checked_add(1)
            .ok_or_else(overflow)?;
        resulting_pages
            .checked_mul(byte_size)
            .ok_or_else(overflow)?;

        Layout::from_size_align(byte_size, self.slot_layout.align()).map_err(|_| overflow())
    }

    #[cfg_attr(test, mutants::skip)] // Accounting only; correctness is asserted via observers in tests.
    fn notify_storage_changed(&self, byte_size: usize, sign: i64) {
        let slot_delta = i64::try_from(self.page_slots.get())
            .expect("a page's slot count cannot exceed the signed 64-bit range");
        let byte_delta = i64::try_from(byte_size)
            .expect("a page's byte size cannot exceed the signed 64-bit range");

        self.observer.storage_changed(
            self.type_label,
            slot_delta.wrapping_mul(sign),
            byte_delta.wrapping_mul(sign),
        );
    }
}

impl<O> Drop for PagedSlotArena<O>
where
    O: ArenaObserver,
{
    fn drop(&mut self) {
        // Release through deallocate() so the observer sees the final negative deltas too.
        while !self.pages.is_empty() {
            self.deallocate();
        }
    }
}
