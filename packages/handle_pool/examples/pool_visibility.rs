//! Policy-driven iteration visibility:
//!
//! * A policy that hides objects based on their own state.
//! * Objects that stay constructed while being skipped by iteration.
//! * Shrink-on-clear controlled by the same policy.

use handle_pool::{ObjectPool, PoolPolicy};

#[derive(Debug)]
struct Unit {
    name: &'static str,
    hp: u32,
}

/// Units whose health reached zero are "not really there": they keep their slot and their
/// handle, but iteration does not yield them.
struct LiveUnitsOnly;

impl PoolPolicy<Unit> for LiveUnitsOnly {
    const SHRINK_AFTER_CLEAR: bool = true;

    fn is_visible(value: &Unit) -> bool {
        value.hp != 0
    }
}

fn main() {
    let mut pool = ObjectPool::<Unit, u32, LiveUnitsOnly>::builder()
        .initial_capacity(64)
        .build();

    pool.construct(Unit {
        name: "knight",
        hp: 5,
    });
    let (ghost, _) = pool.construct(Unit {
        name: "ghost",
        hp: 0,
    });
    pool.construct(Unit {
        name: "archer",
        hp: 3,
    });

    // The ghost occupies a slot and counts toward len()...
    println!("Constructed objects: {}", pool.len());
    assert_eq!(pool.count(ghost), 1);

    // ...but iteration only sees the living.
    for unit in &pool {
        println!("Visible: {} ({} hp)", unit.name, unit.hp);
    }
    assert_eq!(pool.iter().count(), 2);

    // State changes flip visibility without any pool bookkeeping.
    pool[ghost].hp = 1;
    assert_eq!(pool.iter().count(), 3);

    // This policy also shrinks storage on clear, returning capacity to the initial size.
    pool.clear();
    println!(
        "After clear: {} objects, capacity {}",
        pool.len(),
        pool.capacity()
    );
}
