use std::fmt;

/// The identifier a pool hands out for a constructed object.
///
/// A handle is nothing more than the object's global slot index, carried in whatever type the
/// pool's user prefers. The canonical representation is `u32`: every handle type converts to and
/// from that index space losslessly. `u32` itself implements the trait, and a newtype wrapper
/// takes a few lines:
///
/// ```rust
/// use handle_pool::PoolHandle;
///
/// #[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// struct UnitId(u32);
///
/// impl PoolHandle for UnitId {
///     fn from_index(index: u32) -> Self {
///         Self(index)
///     }
///
///     fn index(self) -> u32 {
///         self.0
///     }
/// }
/// ```
///
/// # Handle reuse
///
/// Handles carry no generation tag. When an object is removed, its slot index is offered to the
/// next construction, so a stale handle held across a remove may silently refer to an unrelated
/// new object. Detecting that is explicitly not a service this pool provides; callers who need
/// it must layer their own tagging on top.
pub trait PoolHandle: Copy + Eq + fmt::Debug {
    /// The largest slot index this handle type can represent. Doubles as the pool's capacity
    /// ceiling: growth stops once the pool holds this many slots.
    const MAX_INDEX: u32 = u32::MAX;

    /// Wraps a global slot index in this handle type.
    #[must_use]
    fn from_index(index: u32) -> Self;

    /// The global slot index this handle refers to.
    #[must_use]
    fn index(self) -> u32;
}

impl PoolHandle for u32 {
    fn from_index(index: u32) -> Self {
        index
    }

    fn index(self) -> u32 {
        self
    }
}
