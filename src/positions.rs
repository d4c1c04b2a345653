//! Positions: the ordered sequence of occupied ring positions.
//!
//! Kept strictly ascending (unsigned order) with no duplicates. The owner is
//! responsible for keeping it in step with the node table.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Positions {
    sorted: Vec<u64>,
}

impl Positions {
    pub(crate) fn new() -> Self {
        Self { sorted: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.sorted.len()
    }

    pub(crate) fn as_slice(&self) -> &[u64] {
        &self.sorted
    }

    /// Index of the leftmost position `>= target`, wrapping to 0 when every
    /// position is smaller. `None` only when empty.
    pub(crate) fn successor(&self, target: u64) -> Option<usize> {
        if self.sorted.is_empty() {
            return None;
        }
        let idx = self.sorted.partition_point(|&p| p < target);
        if idx == self.sorted.len() {
            Some(0)
        } else {
            Some(idx)
        }
    }

    pub(crate) fn get(&self, idx: usize) -> Option<u64> {
        self.sorted.get(idx).copied()
    }

    /// Caller guarantees `pos` is not already present.
    pub(crate) fn insert(&mut self, pos: u64) {
        debug_assert!(!self.sorted.contains(&pos));
        self.sorted.push(pos);
        self.sorted.sort_unstable();
    }

    /// Remove `pos` if present, preserving order of the rest.
    pub(crate) fn remove(&mut self, pos: u64) -> bool {
        match self.successor(pos) {
            Some(idx) if self.sorted[idx] == pos => {
                self.sorted.remove(idx);
                true
            }
            _ => false,
        }
    }
}
