/// Receives storage accounting and fault notifications from an arena.
///
/// The arena invokes [`storage_changed()`][Self::storage_changed] once for every chunk it
/// allocates or releases, including the releases performed when the arena itself is dropped.
/// The deltas are positive for allocation and negative for release, so an embedding application
/// can maintain a running total per element type.
///
/// [`fault()`][Self::fault] carries human-readable diagnostics from internal fault paths, such
/// as a pool being asked to remove an object through a handle that maps to nothing.
///
/// Both methods default to doing nothing, and the default [`NoOpObserver`] keeps it that way;
/// call sites compile down to nothing when the default is used. Implementations must not panic:
/// the arena calls these hooks while its own bookkeeping is mid-update.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::num::NonZero;
///
/// use slot_arena::{ArenaObserver, SlotArena};
///
/// #[derive(Debug, Default)]
/// struct ByteMeter {
///     bytes: Cell<i64>,
/// }
///
/// impl ArenaObserver for ByteMeter {
///     fn storage_changed(&self, _type_label: &str, _slot_delta: i64, byte_delta: i64) {
///         self.bytes.set(self.bytes.get() + byte_delta);
///     }
/// }
///
/// let layout = std::alloc::Layout::new::<u32>();
/// let mut arena = SlotArena::with_observer(layout, "u32", ByteMeter::default());
/// arena.try_allocate(NonZero::new(128).unwrap()).unwrap();
/// assert!(arena.observer().bytes.get() >= 128 * 4);
///
/// arena.deallocate();
/// assert_eq!(arena.observer().bytes.get(), 0);
/// ```
pub trait ArenaObserver {
    /// Called after a chunk is allocated (positive deltas) or released (negative deltas).
    ///
    /// `type_label` identifies the element type the arena was created for, falling back to
    /// [`UNTYPED_LABEL`][crate::UNTYPED_LABEL] when no type information was supplied.
    fn storage_changed(&self, type_label: &str, slot_delta: i64, byte_delta: i64) {
        _ = type_label;
        _ = slot_delta;
        _ = byte_delta;
    }

    /// Called with a human-readable message when a caller-facing fault is detected, for example
    /// an operation invoked with a handle that maps to no live object.
    fn fault(&self, type_label: &str, message: &str) {
        _ = type_label;
        _ = message;
    }
}

/// The default observer: ignores every notification.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NoOpObserver;

impl ArenaObserver for NoOpObserver {}
