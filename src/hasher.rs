//! Pluggable 64-bit hashing for ring positions.
//!
//! Node identifiers and lookup keys are hashed the same way: the raw bytes
//! are fed to a fresh hasher and the 64-bit digest is the ring position. No
//! length prefix or terminator is written, so the default FNV-1a builder
//! produces the published FNV-1a 64 values.

use core::hash::{BuildHasher, Hasher};

/// The default hash function: 64-bit FNV-1a.
pub type DefaultHashBuilder = fnv::FnvBuildHasher;

/// Failure reported by a [`HashFunction`] that could not consume its input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct HashError {
    reason: String,
}

impl HashError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A 64-bit hash over byte strings.
///
/// Every `BuildHasher` is a `HashFunction` that never fails. Implement this
/// trait directly for hash functions that can reject input.
pub trait HashFunction {
    fn hash_bytes(&self, bytes: &[u8]) -> Result<u64, HashError>;
}

impl<S: BuildHasher> HashFunction for S {
    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> Result<u64, HashError> {
        let mut h = self.build_hasher();
        h.write(bytes);
        Ok(h.finish())
    }
}
