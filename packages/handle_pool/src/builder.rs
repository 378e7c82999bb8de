use std::any::type_name;
use std::marker::PhantomData;
use std::num::NonZero;

use slot_arena::{ArenaObserver, NoOpObserver};

use crate::{DefaultPolicy, ObjectPool, PoolError, PoolHandle, PoolPolicy};

/// Builder for creating an instance of [`ObjectPool`].
///
/// The initial capacity is mandatory: the pool eagerly allocates its first storage chunk at that
/// size, and every later growth step uses the same size. The element-type label and the observer
/// are optional.
///
/// # Examples
///
/// ```
/// use handle_pool::ObjectPool;
///
/// let pool = ObjectPool::<String>::builder().initial_capacity(512).build();
///
/// assert_eq!(pool.capacity(), 512);
/// assert!(pool.is_empty());
/// ```
///
/// With an observer receiving allocation accounting:
///
/// ```
/// use slot_arena::ArenaObserver;
///
/// use handle_pool::ObjectPool;
///
/// #[derive(Debug)]
/// struct StdoutMeter;
///
/// impl ArenaObserver for StdoutMeter {
///     fn storage_changed(&self, type_label: &str, slot_delta: i64, byte_delta: i64) {
///         println!("storage of {type_label}: {slot_delta} slots, {byte_delta} bytes");
///     }
/// }
///
/// let pool = ObjectPool::<u64>::builder()
///     .initial_capacity(128)
///     .observer(StdoutMeter)
///     .build();
/// # drop(pool);
/// ```
#[must_use]
pub struct ObjectPoolBuilder<T, H = u32, P = DefaultPolicy, O = NoOpObserver> {
    initial_capacity: Option<NonZero<usize>>,
    type_label: Option<&'static str>,
    observer: O,

    _item: PhantomData<T>,
    _handle: PhantomData<H>,
    _policy: PhantomData<P>,
}

impl<T, H, P, O> std::fmt::Debug for ObjectPoolBuilder<T, H, P, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPoolBuilder")
            .field("item_type", &std::format_args!("{}", type_name::<T>()))
            .field("initial_capacity", &self.initial_capacity)
            .field("type_label", &self.type_label)
            .finish_non_exhaustive()
    }
}

impl<T, H, P> ObjectPoolBuilder<T, H, P> {
    pub(crate) fn new() -> Self {
        Self {
            initial_capacity: None,
            type_label: None,
            observer: NoOpObserver,
            _item: PhantomData,
            _handle: PhantomData,
            _policy: PhantomData,
        }
    }
}

impl<T, H, P, O> ObjectPoolBuilder<T, H, P, O> {
    /// Sets the pool's initial capacity in slots. Mandatory.
    ///
    /// The pool allocates one chunk of exactly this many slots up front, and grows by the same
    /// amount whenever it runs out of room.
    ///
    /// # Panics
    ///
    /// Panics if `slots` is zero.
    pub fn initial_capacity(mut self, slots: usize) -> Self {
        self.initial_capacity =
            Some(NonZero::new(slots).expect("ObjectPool must have non-zero initial capacity"));
        self
    }

    /// Overrides the element-type label used in observer notifications.
    ///
    /// The default label is `std::any::type_name::<T>()`.
    pub fn type_label(mut self, label: &'static str) -> Self {
        self.type_label = Some(label);
        self
    }

    /// Injects an observer that will receive storage-accounting and fault notifications from
    /// the pool and its arena.
    ///
    /// The default observer ignores everything at zero cost.
    pub fn observer<O2>(self, observer: O2) -> ObjectPoolBuilder<T, H, P, O2>
    where
        O2: ArenaObserver,
    {
        ObjectPoolBuilder {
            initial_capacity: self.initial_capacity,
            type_label: self.type_label,
            observer,
            _item: PhantomData,
            _handle: PhantomData,
            _policy: PhantomData,
        }
    }

    /// Builds the pool, eagerly allocating its first storage chunk.
    ///
    /// # Errors
    ///
    /// [`PoolError::CapacityOverflow`] if the initial capacity exceeds what the handle type can
    /// index; [`PoolError::Arena`] if the initial chunk cannot be allocated.
    ///
    /// # Panics
    ///
    /// Panics if `initial_capacity()` was not called, or if `T` is zero-sized.
    pub fn try_build(self) -> Result<ObjectPool<T, H, P, O>, PoolError>
    where
        H: PoolHandle,
        P: PoolPolicy<T>,
        O: ArenaObserver,
    {
        let initial_capacity = self
            .initial_capacity
            .expect("initial capacity is mandatory: call initial_capacity() before building");

        ObjectPool::new_inner(
            initial_capacity,
            self.type_label.unwrap_or_else(type_name::<T>),
            self.observer,
        )
    }

    /// Builds the pool, eagerly allocating its first storage chunk.
    ///
    /// # Panics
    ///
    /// Panics if `initial_capacity()` was not called, if `T` is zero-sized, if the initial
    /// capacity exceeds what the handle type can index, or if the initial chunk cannot be
    /// allocated. Use [`try_build()`][Self::try_build] to handle the fallible cases instead.
    #[must_use]
    pub fn build(self) -> ObjectPool<T, H, P, O>
    where
        H: PoolHandle,
        P: PoolPolicy<T>,
        O: ArenaObserver,
    {
        self.try_build()
            .expect("failed to allocate the pool's initial storage")
    }
}
