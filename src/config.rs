//! Construction-time configuration for [`HashRing`](crate::HashRing).

use crate::hasher::DefaultHashBuilder;

/// Options applied once when a ring is built.
///
/// Defaults: FNV-1a hashing, verbose logging off.
#[derive(Debug, Clone)]
pub struct RingConfig<H = DefaultHashBuilder> {
    /// Hashes node identifiers and lookup keys onto the ring.
    pub hash_function: H,
    /// Emit an `INFO` tracing event for every successful add, remove and
    /// lookup. Purely diagnostic.
    pub verbose_logging: bool,
}

impl RingConfig {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RingConfig<H> {
    pub fn with_hasher(hash_function: H) -> Self {
        Self {
            hash_function,
            verbose_logging: false,
        }
    }

    pub fn verbose_logging(mut self, enabled: bool) -> Self {
        self.verbose_logging = enabled;
        self
    }
}
