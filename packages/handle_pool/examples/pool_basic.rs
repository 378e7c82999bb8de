//! Basic usage of the `handle_pool` crate:
//!
//! * Creating a pool.
//! * Constructing objects and holding their handles.
//! * Looking objects up and removing them.
//! * Watching freed handles get recycled.

use handle_pool::ObjectPool;

fn main() {
    let mut pool = ObjectPool::<String>::builder().initial_capacity(512).build();

    // Constructing an object returns its handle and a reference to the fresh object.
    let (alice, _) = pool.construct("Alice".to_string());
    let (bob, _) = pool.construct("Bob".to_string());
    let (charlie, _) = pool.construct("Charlie".to_string());

    println!(
        "Pool contains {} objects, with capacity for {}",
        pool.len(),
        pool.capacity()
    );

    // Handle lookup is an index resolution, similar to `Vec[index]`.
    println!("Retrieved object: {}", pool[alice]);

    pool.remove(bob);
    println!("After removal, count(bob) = {}", pool.count(bob));

    // The freed slot is recycled by the very next construction, so the new object
    // receives the same numeric handle that Bob had.
    let (dora, _) = pool.construct("Dora".to_string());
    assert_eq!(dora, bob);

    // Iteration yields objects in ascending handle order, skipping freed slots.
    for name in &pool {
        println!("Visiting: {name}");
    }

    // Objects can be modified in place through their handle.
    pool[charlie].push_str(" III");
    println!("Modified object: {}", pool[charlie]);
}
