//! Error types for shard location discovery.
//!
//! A shard that is not registered yet is not an error; lookups report it as
//! `None` and waits block on it. Errors only cover waits that were given a
//! deadline and configuration that cannot be used.

use std::time::Duration;

use thiserror::Error;

use crate::types::ShardName;

/// The result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shard location operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A deadline-aware wait expired before every shard was registered.
    #[error("timeout: shard {shard} not located after {}ms", waited.as_millis())]
    Timeout {
        /// The first shard that was still missing when the deadline passed.
        shard: ShardName,
        /// How long the caller waited in total.
        waited: Duration,
    },

    /// A configuration value was rejected.
    #[error("invalid config '{name}': {reason}")]
    InvalidConfig {
        /// The name of the offending setting.
        name: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl Error {
    /// Returns true if this error is a wait timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
