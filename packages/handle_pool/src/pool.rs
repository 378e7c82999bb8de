use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::num::NonZero;
use std::ops::{Index, IndexMut};
use std::ptr::{self, NonNull};

use slot_arena::{ArenaObserver, NoOpObserver, SlotArena};

use crate::{DefaultPolicy, ObjectPoolBuilder, PoolError, PoolHandle, PoolPolicy};

/// An object pool that hands out stable integer handles for dynamically constructed and
/// destroyed objects.
///
/// The pool is backed by a [`SlotArena`]: storage grows by appending whole chunks, never by
/// reallocating, so the address of an object and the meaning of its handle survive any amount of
/// growth. Freed slots are recycled through a free list before new storage is touched, and a
/// high-water mark tracks how far into the arena the pool has ever constructed.
///
/// Three collaborators parameterize the pool:
///
/// * `H`: the handle type ([`PoolHandle`]), `u32` by default;
/// * `P`: the policy ([`PoolPolicy`]) controlling handle mirroring, shrink-on-clear and
///   iteration visibility;
/// * `O`: the observer ([`ArenaObserver`]) receiving storage accounting and fault
///   notifications, no-op by default.
///
/// # Handle reuse
///
/// A removed object's slot index is offered to the very next construction. Handles carry no
/// generation tag, so a handle held across a remove may afterwards refer to an unrelated new
/// object; detecting that is out of scope by design.
///
/// # Thread safety
///
/// The pool is single-threaded by design: no internal locking, no atomics. It is thread-mobile
/// ([`Send`]) when its items are, but never [`Sync`]; sharing requires external mutual
/// exclusion.
///
/// # Example
///
/// ```rust
/// use handle_pool::ObjectPool;
///
/// let mut pool = ObjectPool::<String>::builder().initial_capacity(512).build();
///
/// let (first, _) = pool.construct("eins".to_string());
/// let (second, _) = pool.construct("zwei".to_string());
/// assert_eq!(pool.len(), 2);
///
/// pool.remove(first);
/// assert_eq!(pool.count(first), 0);
///
/// // The freed slot is recycled before fresh storage is used.
/// let (third, _) = pool.construct("drei".to_string());
/// assert_eq!(third, first);
/// assert_eq!(pool[second], "zwei");
/// assert_eq!(pool[third], "drei");
/// ```
pub struct ObjectPool<T, H = u32, P = DefaultPolicy, O = NoOpObserver>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    storage: SlotArena<O>,

    /// Indexes of previously used, now-vacant slots, recycled LIFO so the most recently freed
    /// (and most likely still cached) slot is reused first.
    free_list: Vec<u32>,

    /// One flag per slot in `[0, high_water)`. The arena hands out raw memory and must stay
    /// ignorant of what lives in it, so occupancy is tracked here.
    occupied: Vec<bool>,

    /// Exclusive upper bound of the slot range ever constructed into. Slots at or above this
    /// mark are untouched arena memory; every slot below is either occupied or on the free list.
    high_water: u32,

    /// Number of slots currently holding a constructed object, whether or not the policy makes
    /// it visible to iteration.
    live_count: usize,

    /// Size of every growth step, equal to the pool's initial capacity.
    growth_step: NonZero<usize>,

    _item: PhantomData<T>,
    _handle: PhantomData<H>,
    _policy: PhantomData<P>,
}

impl<T, H, P> ObjectPool<T, H, P>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
{
    /// Starts building a new [`ObjectPool`].
    ///
    /// The initial capacity is mandatory; see [`ObjectPoolBuilder`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use handle_pool::ObjectPool;
    ///
    /// let pool = ObjectPool::<u64>::builder().initial_capacity(64).build();
    ///
    /// assert_eq!(pool.capacity(), 64);
    /// ```
    pub fn builder() -> ObjectPoolBuilder<T, H, P> {
        ObjectPoolBuilder::new()
    }
}

impl<T, H, P, O> ObjectPool<T, H, P, O>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    pub(crate) fn new_inner(
        initial_capacity: NonZero<usize>,
        type_label: &'static str,
        observer: O,
    ) -> Result<Self, PoolError> {
        assert!(size_of::<T>() > 0, "ObjectPool must have non-zero item size");

        let mut storage =
            SlotArena::with_observer(std::alloc::Layout::new::<T>(), type_label, observer);

        if initial_capacity.get() > Self::max_slots() {
            return Err(PoolError::CapacityOverflow {
                limit: H::MAX_INDEX,
            });
        }

        storage.try_allocate(initial_capacity)?;

        Ok(Self {
            storage,
            free_list: Vec::new(),
            occupied: Vec::new(),
            high_water: 0,
            live_count: 0,
            growth_step: initial_capacity,
            _item: PhantomData,
            _handle: PhantomData,
            _policy: PhantomData,
        })
    }

    /// The number of objects currently in the pool, counting ones the policy hides from
    /// iteration.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Whether the pool holds no objects at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// The number of objects the pool can hold without growing its storage.
    ///
    /// Starts at the builder's initial capacity and moves in steps of that same size, up to
    /// [`max_size()`][Self::max_size].
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// The largest capacity this pool can ever reach: the highest slot index representable by
    /// the handle type.
    #[must_use]
    pub fn max_size(&self) -> usize {
        Self::max_slots()
    }

    /// The backing arena, exposed for introspection: chunk count, total slots, slot layout.
    ///
    /// # Example
    ///
    /// ```rust
    /// use handle_pool::ObjectPool;
    ///
    /// let pool = ObjectPool::<u64>::builder().initial_capacity(256).build();
    ///
    /// assert_eq!(pool.storage().storage_count(), 1);
    /// assert_eq!(pool.storage().len(), 256);
    /// ```
    #[must_use]
    pub fn storage(&self) -> &SlotArena<O> {
        &self.storage
    }

    /// The element-type label used in observer notifications.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        self.storage.type_label()
    }

    /// Constructs an object in the pool and returns its handle together with a reference to the
    /// freshly placed object.
    ///
    /// Slot selection order: a freed slot from the free list if any, else the next never-used
    /// slot, else the pool grows by one chunk first. When the policy mirrors handles, the
    /// object's handle field is set before this returns.
    ///
    /// # Panics
    ///
    /// Panics if the pool cannot grow (handle space exhausted or allocation failure). Use
    /// [`try_construct()`][Self::try_construct] to handle those cases instead.
    pub fn construct(&mut self, value: T) -> (H, &mut T) {
        self.try_construct(value)
            .expect("failed to grow pool storage")
    }

    /// Constructs a defaulted object in the pool.
    ///
    /// Shorthand for `construct(T::default())`, useful for slot-reserving placeholder objects.
    ///
    /// # Panics
    ///
    /// Panics if the pool cannot grow (handle space exhausted or allocation failure).
    pub fn construct_default(&mut self) -> (H, &mut T)
    where
        T: Default,
    {
        self.construct(T::default())
    }

    /// Fallible version of [`construct()`][Self::construct].
    ///
    /// # Errors
    ///
    /// [`PoolError::CapacityOverflow`] if the pool is full and already holds
    /// [`max_size()`][Self::max_size] slots; [`PoolError::Arena`] if growing fails. The pool is
    /// unchanged on error.
    pub fn try_construct(&mut self, value: T) -> Result<(H, &mut T), PoolError> {
        // SAFETY: The closure writes a complete value into the slot.
        unsafe {
            self.try_construct_with(move |slot| {
                slot.write(value);
            })
        }
    }

    /// Constructs an object in place, letting the closure initialize the uninitialized slot.
    ///
    /// This can avoid moving a large value when [`construct()`][Self::construct] would copy it
    /// into the slot.
    ///
    /// # Panics
    ///
    /// Panics if the pool cannot grow (handle space exhausted or allocation failure).
    ///
    /// # Safety
    ///
    /// The closure must fully initialize the slot before returning.
    pub unsafe fn construct_with(&mut self, init: impl FnOnce(&mut MaybeUninit<T>)) -> (H, &mut T) {
        // SAFETY: Forwarding the initialization requirement to our own caller.
        unsafe { self.try_construct_with(init) }.expect("failed to grow pool storage")
    }

    /// Fallible version of [`construct_with()`][Self::construct_with].
    ///
    /// # Errors
    ///
    /// [`PoolError::CapacityOverflow`] if the pool is full and already holds
    /// [`max_size()`][Self::max_size] slots; [`PoolError::Arena`] if growing fails. The pool is
    /// unchanged on error and the closure is not called.
    ///
    /// # Safety
    ///
    /// The closure must fully initialize the slot before returning.
    pub unsafe fn try_construct_with(
        &mut self,
        init: impl FnOnce(&mut MaybeUninit<T>),
    ) -> Result<(H, &mut T), PoolError> {
        let index = self.reserve_slot()?;
        let slot = self.slot(index);

        // SAFETY: The slot is vacant arena memory of the right layout; nothing aliases it.
        unsafe {
            let mut uninit = slot.cast::<MaybeUninit<T>>();
            init(uninit.as_mut());
        }

        self.mark_occupied(index);
        self.live_count = self
            .live_count
            .checked_add(1)
            .expect("live count is bounded by capacity, which fits usize");

        // SAFETY: The closure initialized the slot; the exclusive borrow of the pool makes this
        // the only reference to it.
        let object = unsafe { &mut *slot.as_ptr() };

        if P::STORE_HANDLE_IN_OBJECT {
            P::set_handle(object, index);
        }

        Ok((H::from_index(index), object))
    }

    /// Destroys the object the handle refers to and recycles its slot.
    ///
    /// If the handle does not map to a live object, nothing is destroyed: the observer receives
    /// a [`fault()`][ArenaObserver::fault] notification and the call returns. Use
    /// [`count()`][Self::count] to probe a handle beforehand.
    pub fn remove(&mut self, handle: H) {
        let index = handle.index();

        if !self.is_occupied(index) {
            self.storage.observer().fault(
                self.storage.type_label(),
                &format!("remove() called with a handle ({index}) that maps to no live object"),
            );
            return;
        }

        let slot = self.slot(index);

        // SAFETY: The slot is occupied, so it holds an initialized object nothing else
        // references (we hold the exclusive pool borrow).
        unsafe {
            ptr::drop_in_place(slot.as_ptr());
        }

        self.set_vacant(index);
        self.free_list.push(index);
        self.live_count = self
            .live_count
            .checked_sub(1)
            .expect("an occupied slot implies a non-zero live count");
    }

    /// Returns 1 if the handle maps to a live object and 0 otherwise.
    ///
    /// A cheap existence probe that never touches the object itself.
    #[must_use]
    pub fn count(&self, handle: H) -> usize {
        usize::from(self.is_occupied(handle.index()))
    }

    /// A shared reference to the object the handle refers to.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not map to a live object.
    #[must_use]
    pub fn get(&self, handle: H) -> &T {
        let index = handle.index();
        assert!(
            self.is_occupied(index),
            "get({index}) handle maps to no live object in pool of {}",
            self.storage.type_label()
        );

        let slot = self.slot(index);

        // SAFETY: The slot is occupied, so it holds an initialized object; the shared pool
        // borrow prevents mutation for as long as the reference lives.
        unsafe { slot.as_ref() }
    }

    /// An exclusive reference to the object the handle refers to.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not map to a live object.
    #[must_use]
    pub fn get_mut(&mut self, handle: H) -> &mut T {
        let index = handle.index();
        assert!(
            self.is_occupied(index),
            "get_mut({index}) handle maps to no live object in pool of {}",
            self.storage.type_label()
        );

        let mut slot = self.slot(index);

        // SAFETY: The slot is occupied; the exclusive pool borrow makes this the only
        // reference to it.
        unsafe { slot.as_mut() }
    }

    /// Destroys every object in the pool and resets it to the freshly built state.
    ///
    /// The free list empties and handle assignment restarts from 0. When the policy sets
    /// [`SHRINK_AFTER_CLEAR`][PoolPolicy::SHRINK_AFTER_CLEAR], every storage chunk beyond the
    /// first is released, returning [`capacity()`][Self::capacity] to the initial capacity;
    /// otherwise the capacity is retained for reuse.
    pub fn clear(&mut self) {
        for index in 0..self.high_water_usize() {
            let occupied = *self
                .occupied
                .get(index)
                .expect("every slot below the high-water mark has an occupancy flag");

            if occupied {
                let slot = self.storage.slot_ptr(index).cast::<T>();

                // SAFETY: The slot is occupied, so it holds an initialized object nothing else
                // references (we hold the exclusive pool borrow).
                unsafe {
                    ptr::drop_in_place(slot.as_ptr());
                }
            }
        }

        self.occupied.clear();
        self.free_list.clear();
        self.high_water = 0;
        self.live_count = 0;

        if P::SHRINK_AFTER_CLEAR {
            while self.storage.storage_count() > 1 {
                self.storage.deallocate();
            }
        }
    }

    /// Iterates over the live, policy-visible objects in ascending handle order.
    ///
    /// An object is yielded only if its slot is occupied *and* the policy's visibility
    /// predicate accepts its current value. Objects hidden by the predicate stay in their
    /// slots and keep counting toward [`len()`][Self::len]; they are merely skipped here.
    ///
    /// # Example
    ///
    /// ```rust
    /// use handle_pool::{ObjectPool, PoolPolicy};
    ///
    /// struct NonZeroOnly;
    ///
    /// impl PoolPolicy<i32> for NonZeroOnly {
    ///     fn is_visible(value: &i32) -> bool {
    ///         *value != 0
    ///     }
    /// }
    ///
    /// let mut pool = ObjectPool::<i32, u32, NonZeroOnly>::builder()
    ///     .initial_capacity(8)
    ///     .build();
    ///
    /// pool.construct(1);
    /// pool.construct(0);
    /// pool.construct(3);
    ///
    /// let visible: Vec<i32> = pool.iter().copied().collect();
    /// assert_eq!(visible, [1, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T, H, P, O> {
        Iter {
            pool: self,
            next_index: 0,
        }
    }

    /// The first object iteration would yield, or `None` when no object is visible.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.iter().next()
    }

    /// The last object iteration would yield, or `None` when no object is visible.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        let mut index = self.high_water;

        while index > 0 {
            index = index.wrapping_sub(1);

            if !self.is_occupied(index) {
                continue;
            }

            let slot = self.slot(index);

            // SAFETY: The slot is occupied, so it holds an initialized object; the shared pool
            // borrow prevents mutation for as long as the reference lives.
            let object = unsafe { slot.as_ref() };

            if P::is_visible(object) {
                return Some(object);
            }
        }

        None
    }

    /// Walks the free list and the occupied set and asserts that together they exactly
    /// partition the slot range below the high-water mark.
    ///
    /// Verified: no index is both free and occupied, no index appears on the free list twice,
    /// every free index lies below the high-water mark, the live count matches the occupied
    /// count, and mirrored handles equal their slot index. Intended for test interleavings of
    /// construct and remove, not for production use; only available in debug builds.
    ///
    /// # Panics
    ///
    /// Panics if any of the above does not hold.
    #[cfg(debug_assertions)]
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    pub fn debug_check_internal_consistency(&self) {
        let high_water = self.high_water_usize();

        assert!(
            self.occupied.len() == high_water,
            "occupancy map covers {} slots but the high-water mark is {high_water}",
            self.occupied.len()
        );

        let mut on_free_list = vec![false; high_water];

        for &free_index in &self.free_list {
            let index = usize::try_from(free_index).expect("u32 fits usize on supported targets");

            assert!(
                index < high_water,
                "free-list index {index} is not below the high-water mark {high_water}"
            );

            let seen = on_free_list
                .get_mut(index)
                .expect("guarded by the bounds assertion above");
            assert!(!*seen, "free-list index {index} appears twice");
            *seen = true;
        }

        let mut observed_live = 0_usize;

        for index in 0..high_water {
            let occupied = *self.occupied.get(index).expect("guarded by loop range");
            let free = *on_free_list.get(index).expect("guarded by loop range");

            assert!(
                occupied != free,
                "slot {index} must be exactly one of occupied or free"
            );

            if occupied {
                observed_live = observed_live
                    .checked_add(1)
                    .expect("bounded by the high-water mark");

                if P::STORE_HANDLE_IN_OBJECT {
                    let slot = self.storage.slot_ptr(index).cast::<T>();

                    // SAFETY: The slot is occupied, so it holds an initialized object.
                    let object = unsafe { slot.as_ref() };

                    let mirrored = P::get_handle(object);
                    let expected = u32::try_from(index)
                        .expect("slot indexes are bounded by the u32 handle space");
                    assert!(
                        mirrored == expected,
                        "slot {index} mirrors handle {mirrored} instead of its own index"
                    );
                }
            }
        }

        assert!(
            observed_live == self.live_count,
            "live count {} does not match the observed occupied count {observed_live}",
            self.live_count
        );
    }

    /// Picks the slot the next construction will use, growing the arena when necessary.
    ///
    /// The reserved slot's occupancy flag stays `false` until the object is actually in place,
    /// so a panicking initializer leaks the slot instead of tricking `clear()` into dropping
    /// uninitialized memory.
    fn reserve_slot(&mut self) -> Result<u32, PoolError> {
        if let Some(index) = self.free_list.pop() {
            return Ok(index);
        }

        if self.high_water_usize() == self.capacity() {
            self.grow()?;
        }

        let index = self.high_water;
        self.high_water = self
            .high_water
            .checked_add(1)
            .expect("the high-water mark is bounded by max_size(), which fits u32");
        self.occupied.push(false);

        Ok(index)
    }

    /// Appends one growth step of storage, clamped so capacity never passes the handle space.
    fn grow(&mut self) -> Result<(), PoolError> {
        let headroom = Self::max_slots()
            .checked_sub(self.capacity())
            .expect("capacity never exceeds max_size()");

        let Some(headroom) = NonZero::new(headroom) else {
            return Err(PoolError::CapacityOverflow {
                limit: H::MAX_INDEX,
            });
        };

        self.storage
            .try_allocate(self.growth_step.min(headroom))?;

        Ok(())
    }

    fn mark_occupied(&mut self, index: u32) {
        let index = usize::try_from(index).expect("u32 fits usize on supported targets");

        let flag = self
            .occupied
            .get_mut(index)
            .expect("a reserved slot lies below the high-water mark");
        debug_assert!(!*flag, "reserved slot was already occupied");
        *flag = true;
    }

    fn set_vacant(&mut self, index: u32) {
        let index = usize::try_from(index).expect("u32 fits usize on supported targets");

        let flag = self
            .occupied
            .get_mut(index)
            .expect("an occupied slot lies below the high-water mark");
        *flag = false;
    }

    fn is_occupied(&self, index: u32) -> bool {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.occupied.get(index))
            .copied()
            .unwrap_or(false)
    }

    fn slot(&self, index: u32) -> NonNull<T> {
        let index = usize::try_from(index).expect("u32 fits usize on supported targets");
        self.storage.slot_ptr(index).cast::<T>()
    }

    fn high_water_usize(&self) -> usize {
        usize::try_from(self.high_water).expect("u32 fits usize on supported targets")
    }

    fn max_slots() -> usize {
        usize::try_from(H::MAX_INDEX).expect("u32 fits usize on supported targets")
    }
}

impl<T, H, P, O> Drop for ObjectPool<T, H, P, O>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    fn drop(&mut self) {
        // Destroy the remaining objects; the arena then releases the chunks and notifies the
        // observer about each.
        self.clear();
    }
}

impl<T, H, P, O> Index<H> for ObjectPool<T, H, P, O>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    type Output = T;

    fn index(&self, handle: H) -> &T {
        self.get(handle)
    }
}

impl<T, H, P, O> IndexMut<H> for ObjectPool<T, H, P, O>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    fn index_mut(&mut self, handle: H) -> &mut T {
        self.get_mut(handle)
    }
}

impl<T, H, P, O> fmt::Debug for ObjectPool<T, H, P, O>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field(
                "item_type",
                &format_args!("{}", self.storage.type_label()),
            )
            .field("len", &self.live_count)
            .field("capacity", &self.capacity())
            .field("storage_count", &self.storage.storage_count())
            .field("free_list_len", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<'p, T, H, P, O> IntoIterator for &'p ObjectPool<T, H, P, O>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    type Item = &'p T;
    type IntoIter = Iter<'p, T, H, P, O>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A lazy, forward-only, restartable iterator over the live, policy-visible objects of an
/// [`ObjectPool`], in ascending handle order.
///
/// Created by [`ObjectPool::iter()`].
pub struct Iter<'p, T, H = u32, P = DefaultPolicy, O = NoOpObserver>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    pool: &'p ObjectPool<T, H, P, O>,
    next_index: u32,
}

impl<'p, T, H, P, O> Iterator for Iter<'p, T, H, P, O>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    type Item = &'p T;

    fn next(&mut self) -> Option<&'p T> {
        while self.next_index < self.pool.high_water {
            let index = self.next_index;

            // Cannot overflow because the high-water mark bounds it from above.
            self.next_index = index.wrapping_add(1);

            if !self.pool.is_occupied(index) {
                continue;
            }

            let slot = self.pool.slot(index);

            // SAFETY: The slot is occupied, so it holds an initialized object; the shared pool
            // borrow held by the iterator prevents mutation for as long as `'p` lives.
            let object = unsafe { slot.as_ref() };

            if P::is_visible(object) {
                return Some(object);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining_slots = self
            .pool
            .high_water
            .saturating_sub(self.next_index);

        (
            0,
            Some(usize::try_from(remaining_slots).expect("u32 fits usize on supported targets")),
        )
    }
}

impl<T, H, P, O> fmt::Debug for Iter<'_, T, H, P, O>
where
    H: PoolHandle,
    P: PoolPolicy<T>,
    O: ArenaObserver,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::indexing_slicing,
        clippy::cast_possible_truncation,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    /// A three-field record with a health sentinel: the policies below hide units whose `hp`
    /// reached zero without freeing their slots.
    #[derive(Debug, Eq, PartialEq)]
    struct Unit {
        name: &'static str,
        hp: u32,
        mp: u32,
    }

    struct LiveUnitPolicy;

    impl PoolPolicy<Unit> for LiveUnitPolicy {
        fn is_visible(value: &Unit) -> bool {
            value.hp != 0
        }
    }

    struct LiveUnitShrinkPolicy;

    impl PoolPolicy<Unit> for LiveUnitShrinkPolicy {
        const SHRINK_AFTER_CLEAR: bool = true;

        fn is_visible(value: &Unit) -> bool {
            value.hp != 0
        }
    }

    /// A record that carries its own handle; handle 0 marks the reserved null object.
    #[derive(Debug)]
    struct Note {
        id: u32,
        text: String,
    }

    impl Default for Note {
        fn default() -> Self {
            Self {
                id: 0,
                text: String::new(),
            }
        }
    }

    struct NotePolicy;

    impl PoolPolicy<Note> for NotePolicy {
        const STORE_HANDLE_IN_OBJECT: bool = true;
        const SHRINK_AFTER_CLEAR: bool = true;

        fn is_visible(value: &Note) -> bool {
            value.id != 0
        }

        fn set_handle(value: &mut Note, handle: u32) {
            value.id = handle;
        }

        fn get_handle(value: &Note) -> u32 {
            value.id
        }
    }

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct NoteId(u32);

    impl PoolHandle for NoteId {
        fn from_index(index: u32) -> Self {
            Self(index)
        }

        fn index(self) -> u32 {
            self.0
        }
    }

    /// A handle type with a deliberately tiny index space, so the handle-space ceiling is
    /// reachable in a test.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct TinyHandle(u32);

    impl PoolHandle for TinyHandle {
        const MAX_INDEX: u32 = 7;

        fn from_index(index: u32) -> Self {
            Self(index)
        }

        fn index(self) -> u32 {
            self.0
        }
    }

    /// Observer that records every notification into logs shared with the test body.
    #[derive(Clone, Debug, Default)]
    struct Recorder {
        storage_events: Rc<RefCell<Vec<(i64, i64)>>>,
        faults: Rc<RefCell<Vec<String>>>,
    }

    impl ArenaObserver for Recorder {
        fn storage_changed(&self, _type_label: &str, slot_delta: i64, byte_delta: i64) {
            self.storage_events
                .borrow_mut()
                .push((slot_delta, byte_delta));
        }

        fn fault(&self, _type_label: &str, message: &str) {
            self.faults.borrow_mut().push(message.to_string());
        }
    }

    fn unit_pool<P: PoolPolicy<Unit>>(initial: usize) -> ObjectPool<Unit, u32, P> {
        ObjectPool::<Unit, u32, P>::builder()
            .initial_capacity(initial)
            .build()
    }

    #[test]
    fn smoke_test() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(512).build();

        assert_eq!(pool.len(), 0);
        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 512);

        let (handle_a, _) = pool.construct(42);
        let (handle_b, _) = pool.construct(43);
        let (handle_c, _) = pool.construct(44);

        assert_eq!(pool.len(), 3);
        assert!(!pool.is_empty());

        assert_eq!(pool[handle_a], 42);
        assert_eq!(pool[handle_b], 43);
        assert_eq!(pool[handle_c], 44);

        pool.remove(handle_b);

        let (handle_d, _) = pool.construct(45);

        assert_eq!(pool[handle_a], 42);
        assert_eq!(pool[handle_c], 44);
        assert_eq!(pool[handle_d], 45);
    }

    #[test]
    fn handles_start_at_zero_and_increment() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(512).build();

        for expected in 0..4_u32 {
            let (handle, _) = pool.construct(expected);
            assert_eq!(handle, expected);
        }
    }

    #[test]
    fn construct_returns_reference_to_new_object() {
        let mut pool = ObjectPool::<String>::builder().initial_capacity(8).build();

        let (handle, text) = pool.construct("to be".to_string());
        text.push_str(" extended");

        assert_eq!(pool[handle], "to be extended");
    }

    #[test]
    fn construct_default_places_default_value() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(8).build();

        let (handle, _) = pool.construct_default();

        assert_eq!(pool[handle], 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn construct_with_initializes_in_place() {
        let mut pool = ObjectPool::<[u64; 4]>::builder().initial_capacity(8).build();

        // SAFETY: The closure fully initializes the slot.
        let (handle, _) = unsafe {
            pool.construct_with(|slot| {
                slot.write([1, 2, 3, 4]);
            })
        };

        assert_eq!(pool[handle], [1, 2, 3, 4]);
    }

    #[test]
    fn freed_slot_is_recycled_first() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(8).build();

        let (handle_a, _) = pool.construct(10);
        let (handle_b, _) = pool.construct(20);
        let (handle_c, _) = pool.construct(30);

        pool.remove(handle_b);

        let (handle_d, _) = pool.construct(99);

        // The freed index is reused before the high-water mark advances, and the slot reflects
        // only the newest construction.
        assert_eq!(handle_d, handle_b);
        assert_eq!(pool.count(handle_d), 1);
        assert_eq!(pool[handle_d], 99);
        assert_eq!(pool[handle_a], 10);
        assert_eq!(pool[handle_c], 30);
    }

    #[test]
    fn count_reports_occupancy() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(8).build();

        let (handle, _) = pool.construct(7);
        assert_eq!(pool.count(handle), 1);

        pool.remove(handle);
        assert_eq!(pool.count(handle), 0);

        // Never-used and out-of-range indexes probe as absent rather than panicking.
        assert_eq!(pool.count(3), 0);
        assert_eq!(pool.count(1_000_000), 0);
    }

    #[test]
    fn remove_unknown_handle_is_noop_and_faults() {
        let recorder = Recorder::default();
        let mut pool = ObjectPool::<u32>::builder()
            .initial_capacity(8)
            .observer(recorder.clone())
            .build();

        let (handle, _) = pool.construct(1);

        pool.remove(4); // Vacant slot.
        pool.remove(handle);
        pool.remove(handle); // Already removed.

        assert_eq!(pool.len(), 0);
        assert_eq!(recorder.faults.borrow().len(), 2);
    }

    #[test]
    #[should_panic]
    fn get_vacant_panics() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(8).build();

        _ = pool.construct(1234);

        _ = pool.get(1);
    }

    #[test]
    #[should_panic]
    fn get_mut_vacant_panics() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(8).build();

        _ = pool.construct(1234);

        _ = pool.get_mut(1);
    }

    #[test]
    fn capacity_grows_in_initial_size_steps() {
        let mut pool = unit_pool::<LiveUnitShrinkPolicy>(512);

        assert_eq!(pool.capacity(), 512);

        for _ in 0..512 {
            _ = pool.construct(Unit {
                name: "filler",
                hp: 5,
                mp: 5,
            });
        }
        assert_eq!(pool.capacity(), 512);
        assert_eq!(pool.storage().storage_count(), 1);

        // The 513th object forces one growth step of exactly the initial size.
        _ = pool.construct(Unit {
            name: "straw",
            hp: 5,
            mp: 5,
        });
        assert_eq!(pool.capacity(), 1024);
        assert_eq!(pool.storage().storage_count(), 2);
    }

    #[test]
    fn clear_with_shrink_restores_initial_capacity() {
        let mut pool = unit_pool::<LiveUnitShrinkPolicy>(512);

        for _ in 0..513 {
            _ = pool.construct(Unit {
                name: "filler",
                hp: 5,
                mp: 5,
            });
        }
        assert_eq!(pool.capacity(), 1024);

        pool.clear();

        assert_eq!(pool.len(), 0);
        assert_eq!(pool.capacity(), 512);
        assert_eq!(pool.storage().storage_count(), 1);
    }

    #[test]
    fn clear_without_shrink_keeps_capacity() {
        let mut pool = unit_pool::<LiveUnitPolicy>(512);

        for _ in 0..513 {
            _ = pool.construct(Unit {
                name: "filler",
                hp: 5,
                mp: 5,
            });
        }
        assert_eq!(pool.capacity(), 1024);

        pool.clear();

        assert_eq!(pool.len(), 0);
        assert_eq!(pool.capacity(), 1024);
        assert_eq!(pool.storage().storage_count(), 2);

        // Handle assignment restarts from the beginning.
        let (handle, _) = pool.construct(Unit {
            name: "anew",
            hp: 1,
            mp: 0,
        });
        assert_eq!(handle, 0);
    }

    fn construct_units(pool: &mut ObjectPool<Unit, u32, LiveUnitPolicy>, hps: [u32; 4]) {
        for (index, hp) in hps.into_iter().enumerate() {
            _ = pool.construct(Unit {
                name: ["a", "b", "c", "d"][index],
                hp,
                mp: 1,
            });
        }
    }

    #[test]
    fn iteration_skips_invisible_wherever_it_sits() {
        // The zero-hp unit is hidden whether it sits at the start, the middle or the end.
        for hps in [[0, 5, 6, 3], [5, 0, 6, 3], [5, 6, 0, 3], [5, 6, 3, 0]] {
            let mut pool = unit_pool::<LiveUnitPolicy>(32);
            construct_units(&mut pool, hps);

            assert_eq!(pool.len(), 4);

            let visible_hps: Vec<u32> = pool.iter().map(|unit| unit.hp).collect();
            let expected: Vec<u32> = hps.into_iter().filter(|&hp| hp != 0).collect();
            assert_eq!(visible_hps, expected);
        }
    }

    #[test]
    fn iteration_with_nothing_visible_is_empty() {
        let mut pool = unit_pool::<LiveUnitPolicy>(32);
        construct_units(&mut pool, [0, 0, 0, 0]);

        assert_eq!(pool.len(), 4);
        assert_eq!(pool.iter().count(), 0);
        assert!(pool.front().is_none());
        assert!(pool.back().is_none());
    }

    #[test]
    fn iteration_is_restartable() {
        let mut pool = unit_pool::<LiveUnitPolicy>(32);
        construct_units(&mut pool, [5, 0, 6, 3]);

        let first_pass: Vec<u32> = pool.iter().map(|unit| unit.hp).collect();
        let second_pass: Vec<u32> = pool.iter().map(|unit| unit.hp).collect();

        assert_eq!(first_pass, [5, 6, 3]);
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn iteration_skips_freed_slots() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(16).build();

        let mut handles = Vec::new();
        for value in 0..10_u32 {
            handles.push(pool.construct(1 << value).0);
        }

        for handle in handles.iter().step_by(2) {
            pool.remove(*handle);
        }

        assert_eq!(pool.len(), 5);

        let remaining: Vec<u32> = pool.iter().copied().collect();
        assert_eq!(remaining, [2, 8, 32, 128, 512]);
    }

    #[test]
    fn front_and_back_are_first_and_last_visible() {
        let mut pool = unit_pool::<LiveUnitPolicy>(32);
        construct_units(&mut pool, [0, 5, 6, 0]);

        assert_eq!(pool.front().map(|unit| unit.hp), Some(5));
        assert_eq!(pool.back().map(|unit| unit.hp), Some(6));
    }

    #[test]
    fn for_loop_over_pool_reference() {
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(8).build();
        _ = pool.construct(1);
        _ = pool.construct(2);

        let mut total = 0;
        for value in &pool {
            total += value;
        }

        assert_eq!(total, 3);
    }

    #[test]
    fn mirrored_handles_match_slot_indexes() {
        let mut pool = ObjectPool::<Note, u32, NotePolicy>::builder()
            .initial_capacity(512)
            .build();

        // Handle 0 marks invalid notes in this scheme, so a null object claims slot 0 first.
        _ = pool.construct_default();
        assert_eq!(pool.iter().count(), 0);

        let (first, _) = pool.construct(Note {
            id: 0,
            text: "the unexamined life is not worth living".to_string(),
        });
        let (second, _) = pool.construct(Note {
            id: 0,
            text: "i know that i know nothing".to_string(),
        });

        assert_eq!(pool[first].id, first);
        assert_eq!(pool[second].id, second);
        assert_eq!(pool.iter().count(), 2);

        #[cfg(debug_assertions)]
        pool.debug_check_internal_consistency();
    }

    #[test]
    fn custom_handle_type_round_trips() {
        let mut pool = ObjectPool::<Note, NoteId, NotePolicy>::builder()
            .initial_capacity(64)
            .build();

        _ = pool.construct_default();
        let (handle, _) = pool.construct(Note {
            id: 0,
            text: "quoted".to_string(),
        });

        assert_eq!(handle, NoteId(1));
        assert_eq!(pool[handle].id, handle.index());
    }

    #[test]
    fn handle_space_exhaustion_is_capacity_overflow() {
        let mut pool = ObjectPool::<u32, TinyHandle>::builder()
            .initial_capacity(4)
            .build();

        // Growth is clamped at the handle-space ceiling: 4 slots, then 3 more.
        for value in 0..7_u32 {
            _ = pool.construct(value);
        }
        assert_eq!(pool.len(), 7);
        assert_eq!(pool.capacity(), 7);
        assert_eq!(pool.max_size(), 7);
        assert_eq!(pool.storage().storage_count(), 2);

        let result = pool.try_construct(7);

        assert!(matches!(result, Err(PoolError::CapacityOverflow { .. })));
        assert_eq!(pool.len(), 7);
        assert_eq!(pool.capacity(), 7);

        // Recycling still works at the ceiling.
        pool.remove(TinyHandle(3));
        let (handle, _) = pool.construct(33);
        assert_eq!(handle, TinyHandle(3));
    }

    #[test]
    fn initial_capacity_beyond_handle_space_is_rejected() {
        let result = ObjectPool::<u32, TinyHandle>::builder()
            .initial_capacity(8)
            .try_build();

        assert!(matches!(result, Err(PoolError::CapacityOverflow { .. })));
    }

    #[test]
    fn remove_and_clear_run_destructors() {
        struct Droppable {
            drops: Rc<Cell<usize>>,
        }

        impl Drop for Droppable {
            fn drop(&mut self) {
                self.drops.set(self.drops.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let make = |drops: &Rc<Cell<usize>>| Droppable {
            drops: Rc::clone(drops),
        };

        let mut pool = ObjectPool::<Droppable>::builder().initial_capacity(8).build();

        let (handle, _) = pool.construct(make(&drops));
        _ = pool.construct(make(&drops));
        _ = pool.construct(make(&drops));

        pool.remove(handle);
        assert_eq!(drops.get(), 1);

        pool.clear();
        assert_eq!(drops.get(), 3);

        _ = pool.construct(make(&drops));
        drop(pool);
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn observer_sees_the_whole_allocation_lifecycle() {
        let recorder = Recorder::default();

        {
            let mut pool = ObjectPool::<Unit, u32, LiveUnitShrinkPolicy>::builder()
                .initial_capacity(512)
                .observer(recorder.clone())
                .build();

            assert_eq!(recorder.storage_events.borrow().len(), 1);
            assert_eq!(recorder.storage_events.borrow()[0].0, 512);

            for _ in 0..513 {
                _ = pool.construct(Unit {
                    name: "filler",
                    hp: 5,
                    mp: 5,
                });
            }
            assert_eq!(recorder.storage_events.borrow().len(), 2);

            pool.clear();
            assert_eq!(recorder.storage_events.borrow().len(), 3);
            assert_eq!(recorder.storage_events.borrow()[2].0, -512);
        }

        // Dropping the pool released the remaining chunk; the account balances to zero.
        let events = recorder.storage_events.borrow();
        assert_eq!(events.len(), 4);
        let net_slots: i64 = events.iter().map(|(slots, _)| slots).sum();
        let net_bytes: i64 = events.iter().map(|(_, bytes)| bytes).sum();
        assert_eq!(net_slots, 0);
        assert_eq!(net_bytes, 0);
    }

    #[test]
    fn debug_format_mentions_shape_not_contents() {
        let mut pool = ObjectPool::<u32>::builder()
            .initial_capacity(8)
            .type_label("counter")
            .build();
        _ = pool.construct(42);

        let formatted = format!("{pool:?}");

        assert!(formatted.contains("counter"));
        assert!(formatted.contains("len: 1"));
        assert!(!formatted.contains("42"));
    }

    #[test]
    fn max_size_is_the_handle_index_space() {
        let pool = ObjectPool::<u32>::builder().initial_capacity(8).build();

        assert_eq!(pool.max_size(), u32::MAX as usize);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn consistency_holds_across_random_interleavings() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut pool = ObjectPool::<u32>::builder().initial_capacity(8).build();
        let mut handles: Vec<u32> = Vec::new();

        pool.debug_check_internal_consistency();

        for round in 0..200_u32 {
            // Construct well more often than we remove, so the pool is forced to grow.
            if handles.is_empty() || rng.random_range(0..5) > 0 {
                let (handle, _) = pool.construct(round);
                handles.push(handle);
            } else {
                let victim = rng.random_range(0..handles.len());
                pool.remove(handles.swap_remove(victim));
            }

            pool.debug_check_internal_consistency();

            for &handle in &handles {
                assert_eq!(pool.count(handle), 1);
            }

            assert_eq!(pool.len(), handles.len());
        }

        assert!(pool.capacity() > 8, "the interleaving must have forced growth");
    }

    #[test]
    fn in_refcell_works_fine() {
        let pool = RefCell::new(ObjectPool::<u32>::builder().initial_capacity(8).build());

        let handle_a = {
            let mut pool = pool.borrow_mut();
            let (handle_a, _) = pool.construct(42);
            let (handle_b, _) = pool.construct(43);

            pool.remove(handle_b);
            handle_a
        };

        let pool = pool.borrow();
        assert_eq!(pool[handle_a], 42);
    }

    #[test]
    fn multithreaded_via_mutex() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        let pool = Arc::new(Mutex::new(
            ObjectPool::<u32>::builder().initial_capacity(8).build(),
        ));

        let handle_a;
        let handle_b;

        {
            let mut pool = pool.lock().unwrap();
            handle_a = pool.construct(42).0;
            handle_b = pool.construct(43).0;
        }

        let worker = thread::spawn({
            let pool = Arc::clone(&pool);
            move || {
                let mut pool = pool.lock().unwrap();
                pool.remove(handle_b);
                pool.construct(44).0
            }
        });

        let handle_c = worker.join().unwrap();

        let pool = pool.lock().unwrap();
        assert_eq!(pool[handle_a], 42);
        assert_eq!(pool[handle_c], 44);
    }

    #[test]
    #[should_panic]
    fn zst_is_panic() {
        drop(ObjectPool::<()>::builder().initial_capacity(8).build());
    }

    #[test]
    #[should_panic]
    fn zero_initial_capacity_is_panic() {
        drop(ObjectPool::<u32>::builder().initial_capacity(0).build());
    }
}
