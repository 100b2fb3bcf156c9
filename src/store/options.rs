use serde::{Deserialize, Serialize};

/// Default upper bound on any length declared inside a stream (64 MiB).
pub const DEFAULT_MAX_LEN: u64 = 64 * 1024 * 1024;
/// Default maximum nesting of records and lists.
pub const DEFAULT_MAX_DEPTH: usize = 32;
/// Largest number of runs preallocated from a stream header.
pub(crate) const MAX_PREALLOC_RUNS: usize = 64 * 1024;

/// Bounds applied while decoding untrusted streams.
///
/// Declared lengths above `max_len` are rejected as corruption before any
/// allocation is made for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// Largest string, byte array, list, or record length accepted.
    pub max_len: u64,
    /// Maximum nesting depth of records and lists.
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration supplied when creating an [`super::RleStore`].
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Initial capacity reserved for runs.
    pub capacity_hint: usize,
    /// Limits applied by [`super::RleStore::read`].
    pub limits: DecodeLimits,
}

impl StoreOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of runs to reserve up front.
    pub fn capacity_hint(mut self, runs: usize) -> Self {
        self.capacity_hint = runs;
        self
    }

    /// Sets the maximum declared length accepted while decoding.
    pub fn max_len(mut self, bytes: u64) -> Self {
        self.limits.max_len = bytes;
        self
    }

    /// Sets the maximum record/list nesting accepted while decoding.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.limits.max_depth = depth;
        self
    }

    /// Replaces the decode limits wholesale.
    pub fn limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }
}
