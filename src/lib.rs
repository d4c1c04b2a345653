//! chash: a thread-safe consistent hash ring that maps string keys to a
//! dynamic set of named nodes.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: when a node joins or leaves, only the keys in the arc that node
//!   owns are remapped; every other key keeps its owner.
//! - Layers:
//!   - Positions: strictly ascending `Vec<u64>` of occupied ring positions
//!     with the single ordered-search policy (leftmost `>=`, wrap to 0).
//!   - NodeTable<N>: position -> node storage; a hashbrown `HashTable`
//!     index keyed by the position itself over slotmap-backed entries.
//!   - HashRing<N, H>: public API; keeps Positions and NodeTable in step
//!     under one `RwLock` and hashes with a pluggable `HashFunction`.
//!
//! Constraints
//! - One position per node: `hash(node.identifier())`. No virtual nodes,
//!   no weights.
//! - Uniqueness is by position. Two identifiers with the same 64-bit hash
//!   are treated as the same node; the second add fails with
//!   `RingError::HashCollision`, which names both identifiers.
//! - Deterministic: the same key against unchanged membership always
//!   resolves to the same node. The default FNV-1a hash is stable across
//!   processes and runs.
//!
//! Locking
//! - Lookups and snapshots take the read lock; add/remove take the write
//!   lock. The table and the ordered sequence are only ever observed
//!   together.
//! - Hashing runs before the lock is taken, and node handles released by
//!   the ring are dropped after it is released, so node code (identifier,
//!   `Drop`) and hash functions never run under the lock.
//!
//! Errors
//! - Every failure is a `RingError` variant returned to the caller. Failed
//!   calls leave the ring unchanged.
//!
//! Logging
//! - With `RingConfig::verbose_logging` set, successful operations emit
//!   `tracing` events at `INFO`. The crate installs no subscriber.
//!
//! Notes and non-goals
//! - No persistence, rebalancing, replication or batch operations.
//! - Identifiers must not change while registered; the ring keeps keying
//!   the node on the hash it computed at `add_node`.
//!
//! ```
//! use chash::HashRing;
//! use std::sync::Arc;
//!
//! let ring: HashRing<str> = HashRing::new();
//! for id in ["node-1", "node-2", "node-3"] {
//!     ring.add_node(Arc::from(id)).unwrap();
//! }
//! let owner = ring.get_node("user:123").unwrap();
//! assert_eq!(ring.get_node("user:123").unwrap(), owner);
//! ```

mod config;
mod error;
mod hasher;
mod node;
mod node_table;
mod positions;
mod ring;
mod ring_proptest;

// Public surface
pub use config::RingConfig;
pub use error::{ErrorKind, RingError};
pub use hasher::{DefaultHashBuilder, HashError, HashFunction};
pub use node::Node;
pub use ring::HashRing;
