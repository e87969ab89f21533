use proptest::prelude::*;
use token_graph::model::{GroupMeta, Meta, Node};
use token_graph::order::{key_between, n_keys_between, validate_key};
use token_graph::NodeStore;

proptest! {
    /// Inserting at random positions keeps every key distinct and in order.
    #[test]
    fn random_insertions_stay_sorted(positions in prop::collection::vec(any::<prop::sample::Index>(), 1..120)) {
        let mut keys: Vec<String> = Vec::new();
        for pos in positions {
            let at = pos.index(keys.len() + 1);
            let lower = at.checked_sub(1).map(|i| keys[i].as_str());
            let upper = keys.get(at).map(String::as_str);
            let key = key_between(lower, upper).unwrap();
            prop_assert!(validate_key(&key).is_ok());
            if let Some(lower) = lower {
                prop_assert!(lower < key.as_str());
            }
            if let Some(upper) = upper {
                prop_assert!(key.as_str() < upper);
            }
            keys.insert(at, key);
        }
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    /// Repeatedly splitting against a fixed upper neighbour yields N interleaved keys.
    #[test]
    fn repeated_splits_between_fixed_neighbours(n in 1usize..150) {
        let lower = "a0";
        let upper = "a1";
        let mut inserted: Vec<String> = vec![lower.to_string(), upper.to_string()];
        let mut right = upper.to_string();
        for _ in 0..n {
            let k = key_between(Some(lower), Some(&right)).unwrap();
            prop_assert!(!inserted.contains(&k));
            inserted.push(k.clone());
            right = k;
        }
        inserted.sort();
        inserted.dedup();
        prop_assert_eq!(inserted.len(), n + 2);
    }

    #[test]
    fn bulk_keys_fit_between_bounds(n in 0usize..64, gap in 1u8..40) {
        let lower = key_between(None, None).unwrap();
        let mut upper = lower.clone();
        for _ in 0..gap {
            upper = key_between(Some(&upper), None).unwrap();
        }
        let keys = n_keys_between(Some(&lower), Some(&upper), n).unwrap();
        prop_assert_eq!(keys.len(), n);
        prop_assert!(keys.iter().all(|k| lower < *k && *k < upper));
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn appended_children_come_back_in_order() {
    let mut store = NodeStore::new();
    for i in 0..30 {
        let key = store.key_after_last_child(None).unwrap();
        let node = Node::new(format!("g{i}"), None, key, Meta::Group(GroupMeta::new(format!("g{i}"))));
        store
            .transact(|tx| {
                tx.set(node);
                Ok::<_, std::convert::Infallible>(())
            })
            .unwrap();
    }
    let names: Vec<String> = store.get_children(None).iter().map(|n| n.name().to_string()).collect();
    let expected: Vec<String> = (0..30).map(|i| format!("g{i}")).collect();
    assert_eq!(names, expected);

    let front = store.key_before_first_child(None).unwrap();
    assert!(front.as_str() < store.get_children(None)[0].order.as_str());
}
