//! HashRing: consistent hash ring over shared node handles.

use crate::config::RingConfig;
use crate::error::RingError;
use crate::hasher::{DefaultHashBuilder, HashFunction};
use crate::node::Node;
use crate::node_table::{InsertError, NodeTable};
use crate::positions::Positions;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::info;

// Table and positions change together under one write guard; readers never
// see one updated without the other.
struct RingState<N: ?Sized> {
    table: NodeTable<N>,
    positions: Positions,
}

/// Maps string keys to registered nodes by consistent hashing.
///
/// Each node occupies one position, `hash(identifier)`. A key belongs to the
/// node at the first position at or after `hash(key)`, wrapping around to
/// the smallest position. Adding or removing a node only moves the keys in
/// the arc that node owns.
///
/// All methods take `&self`; share the ring with `Arc<HashRing<..>>`.
/// Lookups hold a read lock, membership changes a write lock.
pub struct HashRing<N: ?Sized, H = DefaultHashBuilder> {
    hash_function: H,
    verbose: bool,
    state: RwLock<RingState<N>>,
}

impl<N: Node + ?Sized> HashRing<N> {
    /// Empty ring with FNV-1a hashing and logging off.
    pub fn new() -> Self {
        Self::with_config(RingConfig::default())
    }
}

impl<N: Node + ?Sized> Default for HashRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, H> HashRing<N, H>
where
    N: Node + ?Sized,
    H: HashFunction,
{
    pub fn with_config(config: RingConfig<H>) -> Self {
        Self {
            hash_function: config.hash_function,
            verbose: config.verbose_logging,
            state: RwLock::new(RingState {
                table: NodeTable::new(),
                positions: Positions::new(),
            }),
        }
    }

    pub fn with_hasher(hash_function: H) -> Self {
        Self::with_config(RingConfig::with_hasher(hash_function))
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn hash(&self, input: &str) -> Result<u64, RingError> {
        self.hash_function
            .hash_bytes(input.as_bytes())
            .map_err(|source| RingError::Hashing {
                input: input.to_owned(),
                source,
            })
    }

    /// Ring position of an arbitrary key.
    pub fn hash_key(&self, key: &str) -> Result<u64, RingError> {
        self.hash(key)
    }

    /// Ring position `node` occupies (or would occupy).
    pub fn position_of(&self, node: &N) -> Result<u64, RingError> {
        self.hash(node.identifier())
    }

    /// Register `node` at `hash(node.identifier())`.
    ///
    /// Fails with [`RingError::HashCollision`] when that position is already
    /// taken, whether by the same identifier or by a different one that hashes
    /// identically. A failed call leaves the ring untouched.
    pub fn add_node(&self, node: Arc<N>) -> Result<(), RingError> {
        let identifier = node.identifier().to_owned();
        let pos = self.hash(&identifier)?;

        {
            let mut state = self.state.write();
            if let Some(h) = state.table.find(pos) {
                let existing = state
                    .table
                    .get(h)
                    .map(|e| e.identifier.clone())
                    .unwrap_or_default();
                return Err(RingError::HashCollision {
                    identifier,
                    existing,
                    hash: pos,
                });
            }
            let inserted = state.table.insert(pos, identifier.clone(), node);
            match inserted {
                Ok(_) => {
                    state.positions.insert(pos);
                    debug_assert_eq!(state.positions.len(), state.table.len());
                }
                Err(InsertError::Occupied(existing)) => {
                    return Err(RingError::HashCollision {
                        identifier,
                        existing,
                        hash: pos,
                    })
                }
            }
        }

        if self.verbose {
            info!(node = %identifier, hash = pos, "added node");
        }
        Ok(())
    }

    /// The node responsible for `key`: the first position at or after
    /// `hash(key)`, wrapping to the smallest position.
    pub fn get_node(&self, key: &str) -> Result<Arc<N>, RingError> {
        let hash = self.hash(key)?;

        let state = self.state.read();
        let pos = state
            .positions
            .successor(hash)
            .and_then(|idx| state.positions.get(idx))
            .ok_or(RingError::NoNodesAvailable)?;
        let entry = state
            .table
            .find(pos)
            .and_then(|h| state.table.get(h))
            .ok_or_else(|| RingError::NodeNotFound {
                identifier: key.to_owned(),
            })?;

        if self.verbose {
            info!(key, hash, node = %entry.identifier, node_hash = pos, "mapped key to node");
        }
        Ok(Arc::clone(&entry.node))
    }

    /// Unregister the node at `hash(node.identifier())` and return the handle
    /// the ring held.
    ///
    /// The handle is released after the ring is unlocked, so dropping it may
    /// call back into the ring.
    pub fn remove_node(&self, node: &N) -> Result<Arc<N>, RingError> {
        let identifier = node.identifier();
        let pos = self.hash(identifier)?;

        let entry = {
            let mut state = self.state.write();
            let entry = state
                .table
                .remove(pos)
                .ok_or_else(|| RingError::NodeNotFound {
                    identifier: identifier.to_owned(),
                })?;
            let unlinked = state.positions.remove(pos);
            debug_assert!(unlinked, "position {pos} missing from ordered sequence");
            debug_assert_eq!(state.positions.len(), state.table.len());
            entry
        };

        if self.verbose {
            info!(node = %entry.identifier, hash = pos, "removed node");
        }
        Ok(entry.node)
    }

    /// Whether the position `node` hashes to is occupied.
    pub fn contains(&self, node: &N) -> Result<bool, RingError> {
        let pos = self.hash(node.identifier())?;
        Ok(self.state.read().table.contains(pos))
    }

    pub fn len(&self) -> usize {
        self.state.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the occupied positions, ascending.
    pub fn positions(&self) -> Vec<u64> {
        self.state.read().positions.as_slice().to_vec()
    }

    /// Snapshot of the registered nodes in ring order.
    pub fn nodes(&self) -> Vec<(u64, Arc<N>)> {
        let state = self.state.read();
        state
            .positions
            .as_slice()
            .iter()
            .filter_map(|&pos| {
                let h = state.table.find(pos)?;
                state.table.get(h).map(|e| (pos, Arc::clone(&e.node)))
            })
            .collect()
    }
}

impl<N: ?Sized, H> fmt::Debug for HashRing<N, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("HashRing")
            .field("positions", &state.positions.as_slice())
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hasher::HashError;
    use std::collections::HashMap;
    use std::sync::Weak;

    /// Hash function with hand-picked positions; unknown inputs fail.
    struct Table(HashMap<&'static str, u64>);

    impl Table {
        fn new(entries: &[(&'static str, u64)]) -> Self {
            Table(entries.iter().copied().collect())
        }
    }

    impl HashFunction for Table {
        fn hash_bytes(&self, bytes: &[u8]) -> Result<u64, HashError> {
            let s = std::str::from_utf8(bytes).map_err(|e| HashError::new(e.to_string()))?;
            self.0
                .get(s)
                .copied()
                .ok_or_else(|| HashError::new(format!("no position for {s}")))
        }
    }

    fn node(id: &str) -> Arc<str> {
        Arc::from(id)
    }

    fn placed() -> HashRing<str, Table> {
        let ring = HashRing::with_hasher(Table::new(&[
            ("a", 100),
            ("b", 200),
            ("c", 300),
            ("k50", 50),
            ("k100", 100),
            ("k150", 150),
            ("k250", 250),
            ("k301", 301),
            ("kmax", u64::MAX),
        ]));
        for id in ["c", "a", "b"] {
            ring.add_node(node(id)).unwrap();
        }
        ring
    }

    /// Invariant: lookups land on the first position at or after the key's hash.
    #[test]
    fn successor_lookup() {
        let ring = placed();
        assert_eq!(&*ring.get_node("k50").unwrap(), "a");
        assert_eq!(&*ring.get_node("k100").unwrap(), "a");
        assert_eq!(&*ring.get_node("k150").unwrap(), "b");
        assert_eq!(&*ring.get_node("k250").unwrap(), "c");
    }

    /// Invariant: a key hashing past the largest position wraps to the smallest.
    #[test]
    fn wraps_to_smallest_position() {
        let ring = placed();
        assert_eq!(&*ring.get_node("k301").unwrap(), "a");
        assert_eq!(&*ring.get_node("kmax").unwrap(), "a");
    }

    /// Invariant: empty ring reports NoNodesAvailable on lookup and
    /// NodeNotFound on removal.
    #[test]
    fn empty_ring_errors() {
        let ring: HashRing<str> = HashRing::new();
        assert!(ring.is_empty());
        assert_eq!(
            ring.get_node("user:123").unwrap_err(),
            RingError::NoNodesAvailable
        );
        assert_eq!(
            ring.remove_node("node-1").unwrap_err().kind(),
            ErrorKind::NodeNotFound
        );
    }

    /// Invariant: a second add at an occupied position fails and leaves
    /// membership unchanged.
    #[test]
    fn duplicate_add_rejected() {
        let ring: HashRing<str> = HashRing::new();
        let n = node("node-1");
        ring.add_node(Arc::clone(&n)).unwrap();
        match ring.add_node(Arc::clone(&n)) {
            Err(RingError::HashCollision {
                identifier,
                existing,
                ..
            }) => {
                assert_eq!(identifier, "node-1");
                assert_eq!(existing, "node-1");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.positions().len(), 1);
    }

    /// Invariant: distinct identifiers on the same position collide; the error
    /// names the occupant.
    #[test]
    fn distinct_identifiers_same_hash_collide() {
        let ring = HashRing::with_hasher(Table::new(&[("x", 7), ("y", 7)]));
        ring.add_node(node("x")).unwrap();
        match ring.add_node(node("y")) {
            Err(RingError::HashCollision {
                identifier,
                existing,
                hash,
            }) => {
                assert_eq!(identifier, "y");
                assert_eq!(existing, "x");
                assert_eq!(hash, 7);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(ring.len(), 1);
    }

    /// Invariant: removal drops exactly one position, keeps order, and the
    /// removed node's keys move to its successor.
    #[test]
    fn remove_moves_keys_to_successor() {
        let ring = placed();
        let removed = ring.remove_node("b").unwrap();
        assert_eq!(&*removed, "b");
        assert_eq!(ring.positions(), vec![100, 300]);
        assert_eq!(&*ring.get_node("k150").unwrap(), "c");
        assert_eq!(&*ring.get_node("k50").unwrap(), "a");
        assert!(!ring.contains("b").unwrap());

        assert_eq!(
            ring.remove_node("b").unwrap_err(),
            RingError::NodeNotFound {
                identifier: "b".into()
            }
        );
    }

    /// Invariant: remove hands back the very handle that was registered.
    #[test]
    fn remove_returns_registered_handle() {
        let ring: HashRing<str> = HashRing::new();
        let n = node("node-1");
        ring.add_node(Arc::clone(&n)).unwrap();
        let back = ring.remove_node("node-1").unwrap();
        assert!(Arc::ptr_eq(&n, &back));
        assert_eq!(Arc::strong_count(&n), 2);
    }

    /// Invariant: a failing hash function surfaces as Hashing from every
    /// operation and never mutates the ring.
    #[test]
    fn hashing_failure_is_reported() {
        let ring = placed();
        let before = ring.positions();

        let err = ring.add_node(node("unknown")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Hashing);
        assert_eq!(ring.get_node("nope").unwrap_err().kind(), ErrorKind::Hashing);
        assert_eq!(ring.remove_node("zzz").unwrap_err().kind(), ErrorKind::Hashing);
        assert_eq!(ring.contains("zzz").unwrap_err().kind(), ErrorKind::Hashing);

        assert_eq!(ring.positions(), before);
    }

    /// Invariant: snapshots list members in ascending position order.
    #[test]
    fn nodes_in_ring_order() {
        let ring = placed();
        let ids: Vec<(u64, String)> = ring
            .nodes()
            .into_iter()
            .map(|(p, n)| (p, n.to_string()))
            .collect();
        assert_eq!(
            ids,
            vec![(100, "a".into()), (200, "b".into()), (300, "c".into())]
        );
        assert_eq!(ring.position_of("b").unwrap(), 200);
        assert_eq!(ring.hash_key("k150").unwrap(), 150);
    }

    /// Invariant: node code never runs while the ring is locked. A rejected
    /// duplicate whose drop reads the ring must not deadlock.
    #[test]
    fn rejected_node_dropped_outside_lock() {
        struct Probe {
            id: &'static str,
            ring: Weak<HashRing<Probe>>,
        }
        impl Node for Probe {
            fn identifier(&self) -> &str {
                self.id
            }
        }
        impl Drop for Probe {
            fn drop(&mut self) {
                if let Some(r) = self.ring.upgrade() {
                    let _ = r.len();
                }
            }
        }

        let ring: Arc<HashRing<Probe>> = Arc::new(HashRing::new());
        let mk = |id| {
            Arc::new(Probe {
                id,
                ring: Arc::downgrade(&ring),
            })
        };
        ring.add_node(mk("p")).unwrap();
        assert!(ring.add_node(mk("p")).is_err());

        // Removed handle is the last reference; dropping it re-enters.
        let removed = ring.remove_node(&Probe {
            id: "p",
            ring: Weak::new(),
        });
        drop(removed);
        assert!(ring.is_empty());
    }

    #[test]
    fn trait_object_nodes() {
        struct Shard(String);
        impl Node for Shard {
            fn identifier(&self) -> &str {
                &self.0
            }
        }

        let ring: HashRing<dyn Node> = HashRing::new();
        ring.add_node(Arc::new(Shard("db-1".into()))).unwrap();
        ring.add_node(Arc::new(String::from("db-2"))).unwrap();
        let got = ring.get_node("user:1").unwrap();
        assert!(["db-1", "db-2"].contains(&got.identifier()));
        assert_eq!(ring.len(), 2);
    }
}
