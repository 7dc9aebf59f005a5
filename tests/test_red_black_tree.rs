use rand::Rng;
use redblack_set::key::Natural;
use redblack_set::red_black_tree::{RedBlackSet, RedBlackTree};
use std::collections::BTreeSet;

const NUM_OF_OPERATIONS: usize = 10_000;

#[test]
fn int_test_tree() {
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([1, 1, 1, 1]);
    let mut tree = RedBlackTree::new(Natural);
    let mut expected = BTreeSet::new();

    for _ in 0..NUM_OF_OPERATIONS {
        let key = rng.gen_range(0, 2_000u32);

        if rng.gen() {
            let inserted = tree.insert(&key, true).unwrap().is_inserted();
            assert_eq!(inserted, expected.insert(key));
        } else {
            match tree.search(&key) {
                Some(node) => {
                    assert!(expected.remove(&key));
                    tree.delete_node(node);
                },
                None => assert!(!expected.contains(&key)),
            }
        }

        assert!(tree.black_height().is_some());
        assert_eq!(tree.len(), expected.len());
    }

    assert_eq!(
        tree.iter().collect::<Vec<&u32>>(),
        expected.iter().collect::<Vec<&u32>>(),
    );

    let mut node = tree.max();
    let mut reversed = Vec::new();
    while let Some(curr) = node {
        reversed.push(*tree.key(curr));
        node = tree.predecessor(curr);
    }
    assert_eq!(reversed, expected.iter().rev().cloned().collect::<Vec<u32>>());
}

#[test]
fn int_test_set() {
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([2, 2, 2, 2]);
    let mut set = RedBlackSet::new();
    let mut expected = BTreeSet::new();

    for _ in 0..NUM_OF_OPERATIONS {
        let key = rng.gen_range(0, 1_000u32);

        match rng.gen_range(0, 3) {
            0 => {
                assert!(set.insert(&key));
                expected.insert(key);
            },
            1 => {
                assert_eq!(set.delete(&key), expected.remove(&key));
                assert!(!set.contains(&key));
                assert!(!set.delete(&key));
            },
            _ => {
                if let Some(popped) = set.pop() {
                    assert!(expected.remove(&popped));
                } else {
                    assert!(expected.is_empty());
                }
            },
        }

        assert_eq!(set.len(), expected.len());
        assert_eq!(set.is_empty(), expected.is_empty());
        assert!(set.tree().black_height().is_some());
    }

    set.reset_iterator();
    let walked: Vec<u32> = std::iter::from_fn(|| set.iterate()).collect();
    assert_eq!(walked, expected.iter().cloned().collect::<Vec<u32>>());
}

#[test]
fn int_test_iterate_with_concurrent_deletes() {
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([3, 3, 3, 3]);
    let mut set = RedBlackSet::new();
    for key in 0..500u32 {
        set.insert(&key);
    }

    set.reset_iterator();
    let mut visited: Vec<u32> = Vec::new();
    while let Some(key) = set.iterate() {
        if let Some(last) = visited.last() {
            assert!(*last < key);
        }
        visited.push(key);

        // drop a nearby key, possibly the one under the cursor
        let victim = key + rng.gen_range(0, 3);
        set.delete(&victim);
    }

    for key in set.iter() {
        assert!(visited.binary_search(key).is_ok());
    }
}

#[test]
fn int_test_pop_drains_everything() {
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([4, 4, 4, 4]);
    let mut set = RedBlackSet::new();
    let mut expected = BTreeSet::new();

    for _ in 0..NUM_OF_OPERATIONS {
        let key = rng.next_u32();
        set.insert(&key);
        expected.insert(key);
    }
    assert_eq!(set.len(), expected.len());

    let mut popped = Vec::new();
    while let Some(key) = set.pop() {
        popped.push(key);
    }
    popped.sort();

    assert_eq!(popped, expected.into_iter().collect::<Vec<u32>>());
    assert!(set.is_empty());
    assert_eq!(set.pop(), None);
}

#[test]
fn int_test_bincode_round_trip() {
    let set: RedBlackSet<String> = vec!["pear", "apple", "fig"]
        .into_iter()
        .map(String::from)
        .collect();

    let bytes = bincode::serialize(&set).unwrap();
    let decoded: RedBlackSet<String> = bincode::deserialize(&bytes).unwrap();

    assert_eq!(decoded, set);
    assert_eq!(
        decoded.iter().map(String::as_str).collect::<Vec<&str>>(),
        vec!["apple", "fig", "pear"],
    );
}
