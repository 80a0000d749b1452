//! Registry configuration.

use std::time::Duration;

use shardloc_core::{Error, Result};

/// Configuration for a shard location registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Deadline for task-level waits. `None` waits until every shard arrives.
    pub wait_timeout: Option<Duration>,
    /// Number of shard locations to reserve space for up front.
    pub initial_capacity: usize,
}

impl RegistryConfig {
    /// Creates a configuration with no wait deadline.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            wait_timeout: None,
            initial_capacity: 0,
        }
    }

    /// Sets the deadline for task-level waits.
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Sets the initial map capacity.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Creates a config suitable for testing (short deadline).
    #[must_use]
    pub const fn fast_for_testing() -> Self {
        Self {
            wait_timeout: Some(Duration::from_millis(100)),
            initial_capacity: 16,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the wait timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.wait_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::InvalidConfig {
                name: "wait_timeout",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}
