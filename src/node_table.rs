//! NodeTable: ring position -> node storage with stable handles.
//!
//! Positions are already 64-bit hashes, so the index uses the position itself
//! as the table hash and never re-hashes anything. Entries live in a slotmap;
//! the index only stores slot keys.

use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Handle(DefaultKey);

#[derive(Debug)]
pub(crate) struct Entry<N: ?Sized> {
    pub(crate) pos: u64,
    // Identifier as seen at registration time.
    pub(crate) identifier: String,
    pub(crate) node: Arc<N>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum InsertError {
    /// Position already held; carries the occupant's identifier.
    Occupied(String),
}

pub(crate) struct NodeTable<N: ?Sized> {
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<N>>,
}

impl<N: ?Sized> Default for NodeTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: ?Sized> NodeTable<N> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn find(&self, pos: u64) -> Option<Handle> {
        self.index
            .find(pos, |&k| self.slots.get(k).map(|e| e.pos == pos).unwrap_or(false))
            .map(|&k| Handle(k))
    }

    pub(crate) fn contains(&self, pos: u64) -> bool {
        self.find(pos).is_some()
    }

    pub(crate) fn get(&self, h: Handle) -> Option<&Entry<N>> {
        self.slots.get(h.0)
    }

    pub(crate) fn insert(
        &mut self,
        pos: u64,
        identifier: String,
        node: Arc<N>,
    ) -> Result<Handle, InsertError> {
        match self.index.entry(
            pos,
            |&kk| self.slots.get(kk).map(|e| e.pos == pos).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|e| e.pos).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(o) => {
                let existing = self
                    .slots
                    .get(*o.get())
                    .map(|e| e.identifier.clone())
                    .unwrap_or_default();
                Err(InsertError::Occupied(existing))
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let k = self.slots.insert(Entry {
                    pos,
                    identifier,
                    node,
                });
                let _ = v.insert(k);
                Ok(Handle(k))
            }
        }
    }

    /// Unlink the entry at `pos` and hand it back. Dropping the returned
    /// node handle is left to the caller.
    pub(crate) fn remove(&mut self, pos: u64) -> Option<Entry<N>> {
        let slots = &self.slots;
        let occupied = self
            .index
            .find_entry(pos, |&k| slots.get(k).map(|e| e.pos == pos).unwrap_or(false))
            .ok()?;
        let (k, _) = occupied.remove();
        self.slots.remove(k)
    }
}
