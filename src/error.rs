//! Ring error types.

use crate::hasher::HashError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    #[error("no connected nodes available")]
    NoNodesAvailable,

    /// The hash position is taken. `existing` is the occupant's identifier;
    /// it differs from `identifier` only on a genuine 64-bit collision.
    #[error("node already exists: {identifier} (hash {hash}, held by {existing})")]
    HashCollision {
        identifier: String,
        existing: String,
        hash: u64,
    },

    #[error("node not found: {identifier}")]
    NodeNotFound { identifier: String },

    #[error("error hashing `{input}`: {source}")]
    Hashing {
        input: String,
        #[source]
        source: HashError,
    },
}

/// Fieldless discriminant of [`RingError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoNodesAvailable,
    HashCollision,
    NodeNotFound,
    Hashing,
}

impl RingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RingError::NoNodesAvailable => ErrorKind::NoNodesAvailable,
            RingError::HashCollision { .. } => ErrorKind::HashCollision,
            RingError::NodeNotFound { .. } => ErrorKind::NodeNotFound,
            RingError::Hashing { .. } => ErrorKind::Hashing,
        }
    }
}
