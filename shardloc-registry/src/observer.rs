//! Wait observers - structured events for shards a task is waiting on.
//!
//! The registry reports every predicate check made on behalf of a task so
//! that stalled tasks can be diagnosed. Observers must be cheap: they run
//! while the registry's wait lock is held.

use std::fmt;

use shardloc_core::{ShardRef, StepName};
use tracing::debug;

/// Receives wait events from task-level waits.
pub trait WaitObserver: fmt::Debug + Send + Sync {
    /// Called when `consumer` checked `shard` and found no location yet.
    fn shard_pending(&self, consumer: &StepName, shard: &ShardRef);

    /// Called when `consumer` checked `shard` and found it located.
    fn shard_ready(&self, consumer: &StepName, shard: &ShardRef);
}

/// Default observer that emits `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl WaitObserver for TracingObserver {
    fn shard_pending(&self, consumer: &StepName, shard: &ShardRef) {
        debug!(
            step = %consumer,
            shard = %shard.name,
            producer = %shard.step,
            "waiting for shard, not ready"
        );
    }

    fn shard_ready(&self, consumer: &StepName, shard: &ShardRef) {
        debug!(
            step = %consumer,
            shard = %shard.name,
            producer = %shard.step,
            "shard is ready"
        );
    }
}
