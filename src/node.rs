//! Node identity capability.

/// Anything that can be placed on a [`HashRing`](crate::HashRing).
///
/// The ring only ever looks at the identifier. It must stay the same for as
/// long as the node is registered: the ring keys the node on the hash of the
/// identifier it saw at `add_node` time and cannot notice a later change.
pub trait Node {
    fn identifier(&self) -> &str;
}

impl Node for str {
    fn identifier(&self) -> &str {
        self
    }
}

impl Node for String {
    fn identifier(&self) -> &str {
        self.as_str()
    }
}

impl<T: Node + ?Sized> Node for &T {
    fn identifier(&self) -> &str {
        (**self).identifier()
    }
}

impl<T: Node + ?Sized> Node for Box<T> {
    fn identifier(&self) -> &str {
        (**self).identifier()
    }
}
