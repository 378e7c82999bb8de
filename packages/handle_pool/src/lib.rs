//! An object pool that recycles integer handles and never relocates its items, backed by a
//! chunked slot arena.
//!
//! This crate provides [`ObjectPool`], a growable pool of dynamically constructed and destroyed
//! objects. Each construction returns a stable integer-like handle; each removal recycles the
//! object's slot through a free list. Storage comes from a [`slot_arena::SlotArena`], which
//! grows by appending chunks instead of reallocating, so addresses and handles stay valid no
//! matter how large the pool becomes.
//!
//! # Key Features
//!
//! - **Stable handles and addresses**: growth never moves an object or invalidates a handle
//! - **Slot recycling**: freed slots are reused before fresh storage is touched
//! - **Uniform growth**: capacity moves in steps of the initial capacity, up to the handle
//!   type's index space
//! - **Policy customization**: per-element-type control over handle mirroring, shrink-on-clear
//!   and iteration visibility, resolved at compile time ([`PoolPolicy`])
//! - **Custom handle types**: any cheap wrapper around a `u32` index ([`PoolHandle`])
//! - **Accounting hooks**: an injected [`slot_arena::ArenaObserver`] sees every storage chunk
//!   come and go, and every caller-facing fault
//!
//! # Two kinds of "removed"
//!
//! Iteration skips two different things: slots freed by [`remove()`][ObjectPool::remove], and
//! objects whose own state makes the policy's visibility predicate reject them. The latter stay
//! constructed in their slots and keep counting toward [`len()`][ObjectPool::len]; they are
//! simply not yielded. This supports object models where a sentinel field value (a zeroed id, an
//! exhausted health stat) means "not really there" without the bookkeeping of a removal.
//!
//! # Example
//!
//! ```rust
//! use handle_pool::ObjectPool;
//!
//! let mut pool = ObjectPool::<String>::builder().initial_capacity(512).build();
//!
//! let (first, _) = pool.construct("alpha".to_string());
//! let (second, _) = pool.construct("beta".to_string());
//!
//! assert_eq!(pool[first], "alpha");
//! assert_eq!(pool.len(), 2);
//!
//! pool.remove(first);
//!
//! // The freed slot (and with it, the handle value) is recycled immediately.
//! let (third, _) = pool.construct("gamma".to_string());
//! assert_eq!(third, first);
//!
//! let contents: Vec<&str> = pool.iter().map(String::as_str).collect();
//! assert_eq!(contents, ["gamma", "beta"]);
//! # drop(second);
//! ```
//!
//! # Thread safety
//!
//! The pool is single-threaded by design: no locking, no atomics, no operation that may be
//! called concurrently with another mutating operation on the same instance. It is
//! thread-mobile ([`Send`]) when its items are; wrap it in a mutex to share it.

mod builder;
mod errors;
mod handle;
mod policy;
mod pool;

pub use builder::*;
pub use errors::*;
pub use handle::*;
pub use policy::*;
pub use pool::*;
