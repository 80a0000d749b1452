//! Reusable scenarios for registry tests.
//!
//! Waiters are plain OS threads. Each harness records how many times each
//! waiter returned so tests can assert "exactly once" wakeups.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use shardloc_core::{Location, ShardName};
use shardloc_registry::ShardLocationRegistry;

/// Upper bound on how long any scenario may take before it is declared stuck.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns a distinct location for shard number `i`.
#[must_use]
pub fn location_for(i: u16) -> Location {
    Location::new(format!("10.0.{}.{}", i / 256, i % 256), 45_000 + i)
}

/// Returns `count` shard names `prefix_0 .. prefix_{count-1}`.
#[must_use]
pub fn shard_names(prefix: &str, count: usize) -> Vec<ShardName> {
    (0..count).map(|i| ShardName::new(format!("{prefix}_{i}"))).collect()
}

/// A group of threads blocked in `wait_for_all` on the same shards.
#[derive(Debug)]
pub struct WaiterGroup {
    handles: Vec<JoinHandle<()>>,
    returned: Arc<AtomicUsize>,
}

impl WaiterGroup {
    /// Spawns `count` waiters and returns once all of them are about to wait.
    #[must_use]
    pub fn spawn(registry: &Arc<ShardLocationRegistry>, names: &[ShardName], count: usize) -> Self {
        let returned = Arc::new(AtomicUsize::new(0));
        let ready = Arc::new(Barrier::new(count + 1));

        let handles = (0..count)
            .map(|_| {
                let registry = Arc::clone(registry);
                let names = names.to_vec();
                let returned = Arc::clone(&returned);
                let ready = Arc::clone(&ready);
                thread::spawn(move || {
                    ready.wait();
                    registry.wait_for_all(&names);
                    returned.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        ready.wait();
        Self { handles, returned }
    }

    /// Number of waiters that have returned so far.
    #[must_use]
    pub fn returned(&self) -> usize {
        self.returned.load(Ordering::SeqCst)
    }

    /// Returns true if every waiter has returned.
    #[must_use]
    pub fn all_returned(&self) -> bool {
        self.handles.iter().all(JoinHandle::is_finished)
    }

    /// Waits up to `timeout` for every waiter to return.
    ///
    /// Returns false if some waiter is still blocked at the deadline.
    #[must_use]
    pub fn join_within(self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.all_returned() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        for handle in self.handles {
            if handle.join().is_err() {
                return false;
            }
        }
        true
    }
}

/// Publishes every shard from its own thread after all threads are ready.
pub fn set_concurrently(registry: &Arc<ShardLocationRegistry>, names: &[ShardName]) {
    let start = Arc::new(Barrier::new(names.len()));
    let handles: Vec<_> = names
        .iter()
        .cloned()
        .zip(0u16..)
        .map(|(name, i)| {
            let registry = Arc::clone(registry);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                registry.set(name, location_for(i));
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("setter thread panicked");
    }
}
