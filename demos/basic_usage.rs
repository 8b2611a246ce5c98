//! Basic usage of the persistent trie.

use std::ops::ControlFlow;

use persistent_int_trie::{Edit, Editor, IntTrie, SharedTrie};

fn main() {
    example_persistence();
    example_batches();
    example_shared();
}

fn example_persistence() {
    println!("=== Persistent updates ===\n");

    let v1: IntTrie<&str> = IntTrie::new().put(None, 5, "five");
    // 37 shares the lowest slice with 5, so both move one level down.
    let v2 = v1.clone().put(None, 37, "thirty-seven");
    let v3 = v2.clone().remove(None, 5);

    println!("v1 = {:?}", v1);
    println!("v2 = {:?}", v2);
    println!("v3 = {:?}", v3);
    println!("v2 stats: {:?}\n", v2.stats());
}

fn example_batches() {
    println!("=== One editor per batch ===\n");

    let editor = Editor::new();
    let mut trie: IntTrie<u64> = IntTrie::new();
    for i in 0..10_000 {
        trie = trie.put(Some(&editor), i * 7, i as u64);
    }
    trie = trie.update_with(Some(&editor), 0, |v| match v {
        Some(_) => Edit::Keep,
        None => Edit::Set(0),
    });

    let first_big = trie.reduce(|key, value| {
        if *value > 5_000 {
            ControlFlow::Break(key)
        } else {
            ControlFlow::Continue(())
        }
    });
    println!("Count: {}", trie.len());
    println!("First visited key with value > 5000: {:?}", first_big);
    println!("Stats: {:?}\n", trie.stats());
}

fn example_shared() {
    println!("=== Shared root ===\n");

    let shared: SharedTrie<String> = SharedTrie::default();
    let before = shared.snapshot();
    shared.batch(|b| {
        b.put(1, "one".to_string());
        b.put(33, "thirty-three".to_string());
    });

    let stale = before.clone().put(None, 2, "two".to_string());
    match shared.compare_and_set(&before, stale) {
        Ok(()) => println!("published"),
        Err(_) => println!("conflict: another batch published first"),
    }
    println!("current = {:?}", shared.snapshot());
}
