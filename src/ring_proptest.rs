#![cfg(test)]

// Property tests for HashRing kept inside the crate so they can check the
// ordered sequence against the node table directly.

use crate::error::RingError;
use crate::ring::HashRing;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

// Pool-indexed operations: indices shrink to earlier identifiers, pool length
// shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Add(usize),
    Remove(usize),
    Get(String),
    Contains(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("node-[a-z0-9]{1,6}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            idx.clone().prop_map(OpI::Add),
            idx.clone().prop_map(OpI::Remove),
            "[a-z:0-9]{0,12}".prop_map(OpI::Get),
            idx.clone().prop_map(OpI::Contains),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn expected_owner(model: &BTreeMap<u64, String>, hash: u64) -> Option<&String> {
    model
        .range(hash..)
        .next()
        .or_else(|| model.iter().next())
        .map(|(_, id)| id)
}

// Property: state-machine equivalence against a BTreeMap<position, identifier>.
// Invariants exercised across random operation sequences:
// - Adds succeed iff the position is free; failures leave len unchanged.
// - Removes succeed iff the position is held and return the registered id.
// - Lookups return the clockwise successor, wrapping to the smallest position.
// - After every op the ordered sequence is strictly ascending and equals the
//   model's key set, and the table holds exactly those positions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let ring: HashRing<str> = HashRing::new();
        let mut model: BTreeMap<u64, String> = BTreeMap::new();

        for op in ops {
            match op {
                OpI::Add(i) => {
                    let id = &pool[i];
                    let pos = ring.hash_key(id).unwrap();
                    let held = model.contains_key(&pos);
                    match ring.add_node(Arc::from(id.as_str())) {
                        Ok(()) => {
                            prop_assert!(!held, "add must fail on an occupied position");
                            model.insert(pos, id.clone());
                        }
                        Err(RingError::HashCollision { existing, hash, .. }) => {
                            prop_assert!(held, "collision only when position is held");
                            prop_assert_eq!(hash, pos);
                            prop_assert_eq!(Some(&existing), model.get(&pos));
                        }
                        Err(e) => {
                            prop_assert!(false, "unexpected error: {}", e);
                        }
                    }
                }
                OpI::Remove(i) => {
                    let id = &pool[i];
                    let pos = ring.hash_key(id).unwrap();
                    match ring.remove_node(id.as_str()) {
                        Ok(node) => {
                            let mid = model.remove(&pos);
                            prop_assert_eq!(mid.as_deref(), Some(&*node));
                        }
                        Err(RingError::NodeNotFound { identifier }) => {
                            prop_assert!(!model.contains_key(&pos));
                            prop_assert_eq!(&identifier, id);
                        }
                        Err(e) => {
                            prop_assert!(false, "unexpected error: {}", e);
                        }
                    }
                }
                OpI::Get(key) => {
                    let hash = ring.hash_key(&key).unwrap();
                    match (ring.get_node(&key), expected_owner(&model, hash)) {
                        (Ok(node), Some(want)) => {
                            prop_assert_eq!(&*node, want.as_str());
                        }
                        (Err(RingError::NoNodesAvailable), None) => {}
                        (got, want) => {
                            prop_assert!(false, "got {:?}, want {:?}", got, want);
                        }
                    }
                }
                OpI::Contains(i) => {
                    let pos = ring.hash_key(&pool[i]).unwrap();
                    prop_assert_eq!(ring.contains(pool[i].as_str()).unwrap(), model.contains_key(&pos));
                }
            }

            let positions = ring.positions();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]), "not strictly ascending");
            let model_keys: Vec<u64> = model.keys().copied().collect();
            prop_assert_eq!(&positions, &model_keys);
            prop_assert_eq!(ring.len(), model.len());
            let listed: Vec<u64> = ring.nodes().into_iter().map(|(p, _)| p).collect();
            prop_assert_eq!(listed, model_keys);
        }
    }
}

// Property: removing one node only moves the keys it owned, and they move to
// its clockwise successor.
proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_minimal_disruption(
        n in 2usize..16,
        victim in any::<prop::sample::Index>(),
        keys in proptest::collection::vec("[a-z:0-9]{1,10}", 1..64),
    ) {
        let ring: HashRing<str> = HashRing::new();
        let ids: Vec<String> = (0..n).map(|i| format!("node-{i}")).collect();
        for id in &ids {
            ring.add_node(Arc::from(id.as_str())).unwrap();
        }
        let victim = &ids[victim.index(n)];

        let before: Vec<Arc<str>> = keys.iter().map(|k| ring.get_node(k).unwrap()).collect();
        let order: Vec<Arc<str>> = ring.nodes().into_iter().map(|(_, n)| n).collect();
        let vi = order.iter().position(|n| &**n == victim.as_str()).unwrap();
        let successor = Arc::clone(&order[(vi + 1) % order.len()]);

        ring.remove_node(victim.as_str()).unwrap();

        for (k, b) in keys.iter().zip(before) {
            let a = ring.get_node(k).unwrap();
            prop_assert!(&*a != victim.as_str());
            if &*b == victim.as_str() {
                prop_assert_eq!(&*a, &*successor);
            } else {
                prop_assert_eq!(&*a, &*b);
            }
        }
    }
}
