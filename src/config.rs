//! Factory configuration.
//!
//! A [`FactoryConfig`] is passed to the factory that uses it; there is no
//! process-wide default to mutate.

use std::num::NonZeroUsize;

/// Which entry a bounded factory drops when it is full.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EvictionPolicy {
    /// Drop the entry that was produced first.
    Fifo,
    /// Drop the entry that was hit least recently.
    Lru,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        EvictionPolicy::Fifo
    }
}

/// Cache settings of a [`CachingFactory`](crate::CachingFactory).
///
/// The default is unbounded: entries only leave the cache through
/// explicit eviction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FactoryConfig {
    /// Maximum number of cached results, `None` for no limit.
    pub capacity: Option<NonZeroUsize>,
    /// Entry to drop when `capacity` is reached.
    pub policy: EvictionPolicy,
}

impl FactoryConfig {
    /// Create config without a capacity limit (default).
    pub fn unbounded() -> Self {
        FactoryConfig::default()
    }

    /// Create config holding at most `capacity` results.
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        FactoryConfig {
            capacity: Some(capacity),
            ..Default::default()
        }
    }

    /// Set the capacity limit
    pub fn with_capacity(mut self, capacity: Option<NonZeroUsize>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the eviction policy
    pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub(crate) fn is_full(&self, len: usize) -> bool {
        matches!(self.capacity, Some(cap) if len >= cap.get())
    }
}
