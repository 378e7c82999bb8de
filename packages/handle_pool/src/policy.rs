/// Compile-time customization contract for an [`ObjectPool`][crate::ObjectPool], supplied by the
/// element type's owner.
///
/// A policy decides three things, all resolved statically so the hot construct and iterate paths
/// pay nothing for customization they do not use:
///
/// * whether the pool mirrors each object's handle into the object itself
///   ([`STORE_HANDLE_IN_OBJECT`][Self::STORE_HANDLE_IN_OBJECT] plus the
///   [`set_handle()`][Self::set_handle] / [`get_handle()`][Self::get_handle] accessors);
/// * whether [`clear()`][crate::ObjectPool::clear] shrinks storage back to the pool's original
///   size ([`SHRINK_AFTER_CLEAR`][Self::SHRINK_AFTER_CLEAR]);
/// * which live objects iteration yields ([`is_visible()`][Self::is_visible]).
///
/// The visibility predicate enables a second kind of "removed": an object can stay constructed
/// and occupy its slot, yet disappear from iteration because its own state says so (for example
/// a health field reaching zero). [`DefaultPolicy`] keeps all the defaults: no mirroring, no
/// shrinking, everything visible.
///
/// # Example
///
/// ```rust
/// use handle_pool::{ObjectPool, PoolPolicy};
///
/// struct Unit {
///     hp: u32,
/// }
///
/// /// Units with no health left are skipped by iteration but stay in their slots.
/// struct LiveUnitsOnly;
///
/// impl PoolPolicy<Unit> for LiveUnitsOnly {
///     fn is_visible(value: &Unit) -> bool {
///         value.hp != 0
///     }
/// }
///
/// let mut pool = ObjectPool::<Unit, u32, LiveUnitsOnly>::builder()
///     .initial_capacity(32)
///     .build();
///
/// pool.construct(Unit { hp: 10 });
/// pool.construct(Unit { hp: 0 });
/// pool.construct(Unit { hp: 3 });
///
/// assert_eq!(pool.len(), 3);
/// assert_eq!(pool.iter().count(), 2);
/// ```
pub trait PoolPolicy<T> {
    /// Whether the pool writes each object's handle into the object right after construction,
    /// through [`set_handle()`][Self::set_handle].
    const STORE_HANDLE_IN_OBJECT: bool = false;

    /// Whether [`clear()`][crate::ObjectPool::clear] releases every storage chunk beyond the
    /// first, returning the pool to its construction-time capacity.
    const SHRINK_AFTER_CLEAR: bool = false;

    /// Whether iteration yields this live object. Must be a pure function of the object's value.
    #[must_use]
    fn is_visible(value: &T) -> bool {
        _ = value;
        true
    }

    /// Writes the object's own slot index into the object. Only called when
    /// [`STORE_HANDLE_IN_OBJECT`][Self::STORE_HANDLE_IN_OBJECT] is `true`.
    fn set_handle(value: &mut T, handle: u32) {
        _ = value;
        _ = handle;
    }

    /// Reads back the slot index previously mirrored into the object. Only meaningful when
    /// [`STORE_HANDLE_IN_OBJECT`][Self::STORE_HANDLE_IN_OBJECT] is `true`.
    #[must_use]
    fn get_handle(value: &T) -> u32 {
        _ = value;
        0
    }
}

/// The default policy: no handle mirroring, no shrink on clear, every live object visible.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DefaultPolicy;

impl<T> PoolPolicy<T> for DefaultPolicy {}
