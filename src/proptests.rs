use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn key_strategy() -> impl Strategy<Value = i32> {
    // Mix dense keys (many shallow collisions), keys differing only in high
    // slices (long chains), negatives and anything at all.
    prop_oneof![
        4 => -512i32..512,
        2 => (0i32..64).prop_map(|k| k << 20),
        1 => (0i32..8).prop_map(|k| k << 29),
        2 => any::<i32>(),
    ]
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Put(#[proptest(strategy = "key_strategy()")] i32, u32),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "key_strategy()")] i32),
    #[proptest(weight = 2)]
    Get(#[proptest(strategy = "key_strategy()")] i32),
    /// Keep the current version and check it is untouched at the end.
    Snapshot,
    /// Switch to a fresh editor.
    NewEditor,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=1000)
}

fn entries(t: &IntTrie<u32>) -> BTreeMap<i32, u32> {
    t.iter().map(|(k, v)| (k, *v)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut editor = Editor::new();
        let mut t: IntTrie<u32> = IntTrie::new();
        let mut m: BTreeMap<i32, u32> = BTreeMap::new();
        let mut snapshots: Vec<(IntTrie<u32>, BTreeMap<i32, u32>)> = Vec::new();

        for op in ops {
            match op {
                Op::Put(key, value) => {
                    t = t.put(Some(&editor), key, value);
                    m.insert(key, value);
                }
                Op::Remove(key) => {
                    t = t.remove(Some(&editor), key);
                    m.remove(&key);
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(key), m.get(&key));
                }
                Op::Snapshot => snapshots.push((t.clone(), m.clone())),
                Op::NewEditor => editor = Editor::new(),
            }

            prop_assert_eq!(t.len(), m.len());
        }

        prop_assert_eq!(t.check_invariants(), Ok(()));
        prop_assert_eq!(entries(&t), m);
        for (snapshot, expected) in snapshots {
            prop_assert_eq!(snapshot.check_invariants(), Ok(()));
            prop_assert_eq!(entries(&snapshot), expected);
        }
    }

    #[test]
    fn prop_order_independent(keys in prop::collection::btree_set(key_strategy(), 0..300)) {
        let forward: IntTrie<i32> = keys.iter().map(|&k| (k, k)).collect();
        let backward: IntTrie<i32> = keys.iter().rev().map(|&k| (k, k)).collect();
        prop_assert_eq!(&forward, &backward);

        // Same key set, same shape: the trie is canonical.
        let f: Vec<i32> = forward.iter().map(|(k, _)| k).collect();
        let b: Vec<i32> = backward.iter().map(|(k, _)| k).collect();
        prop_assert_eq!(f, b);
        prop_assert_eq!(forward.stats().nodes, backward.stats().nodes);
    }

    #[test]
    fn prop_remove_all_empties(keys in prop::collection::vec(key_strategy(), 0..300)) {
        let editor = Editor::new();
        let mut t: IntTrie<()> = keys.iter().map(|&k| (k, ())).collect();
        for &k in &keys {
            t = t.remove(Some(&editor), k);
            prop_assert_eq!(t.check_invariants(), Ok(()));
        }
        prop_assert!(t.is_empty());
        prop_assert_eq!(t.stats().nodes, 0);
    }

    #[test]
    fn prop_reduce_stops_after_n(keys in prop::collection::btree_set(key_strategy(), 1..300), n in 1usize..300) {
        let t: IntTrie<()> = keys.iter().map(|&k| (k, ())).collect();
        let n = n.min(keys.len());
        let mut visited = 0;
        let flow = t.reduce(|_, _| {
            visited += 1;
            if visited == n { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        prop_assert_eq!(flow, ControlFlow::Break(()));
        prop_assert_eq!(visited, n);
    }

    #[test]
    fn prop_plain_round_trip(pairs in prop::collection::hash_map(key_strategy(), any::<u32>(), 0..300)) {
        let t = IntTrie::from_plain_map(pairs.clone());
        prop_assert_eq!(t.len(), pairs.len());
        prop_assert_eq!(t.to_plain_map(), pairs);
    }
}

#[test]
fn exhaustive_remove_order_small_collision_set() {
    // Keys chosen to share slices at several depths.
    let keys = [0, 32, 1024, 1 << 20, 5, 37];

    let base: IntTrie<usize> = keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
    assert_eq!(base.check_invariants(), Ok(()));

    for perm in removal_orders(&keys) {
        let editor = Editor::new();
        let mut t = base.clone();
        let mut remaining: BTreeMap<i32, usize> = keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        for k in perm {
            t = t.remove(Some(&editor), k);
            remaining.remove(&k);
            assert_eq!(t.check_invariants(), Ok(()));
            let got: BTreeMap<i32, usize> = t.iter().map(|(k, v)| (k, *v)).collect();
            assert_eq!(got, remaining);
        }
        assert!(t.is_empty());
    }

    // The shared base is never modified by the batches above.
    assert_eq!(base.len(), keys.len());
    assert_eq!(base.check_invariants(), Ok(()));
}

/// Every ordering of `keys`, walking index permutations in lexicographic order.
fn removal_orders(keys: &[i32]) -> Vec<Vec<i32>> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    let mut orders = Vec::new();
    loop {
        orders.push(order.iter().map(|&i| keys[i]).collect());
        let Some(pivot) = (1..order.len()).rev().find(|&i| order[i - 1] < order[i]) else {
            return orders;
        };
        let successor = (pivot..order.len())
            .rev()
            .find(|&j| order[j] > order[pivot - 1])
            .unwrap();
        order.swap(pivot - 1, successor);
        order[pivot..].reverse();
    }
}

#[test]
fn removal_orders_cover_every_permutation() {
    let orders = removal_orders(&[1, 2, 3, 4]);
    assert_eq!(orders.len(), 24);
    let distinct: std::collections::BTreeSet<Vec<i32>> = orders.iter().cloned().collect();
    assert_eq!(distinct.len(), 24);
    assert_eq!(orders[0], vec![1, 2, 3, 4]);
    assert_eq!(orders[23], vec![4, 3, 2, 1]);
    assert_eq!(removal_orders(&[]), vec![Vec::<i32>::new()]);
}
