//! Shard location registry - blocking discovery of where shards live.
//!
//! Producers publish a shard's location with [`ShardLocationRegistry::set`];
//! consumers block in [`ShardLocationRegistry::wait_for_all`] until every shard
//! they depend on has been published.
//!
//! # Locking
//!
//! Two lock domains are used and must not be merged:
//!
//! - `locations` guards only the map and is held for a single lookup or insert.
//! - `wait_lock` is the condition variable's lock. Waiters hold it for the
//!   whole wait (released while parked); `set` holds it only to broadcast.
//!
//! Waiters re-check through `contains`, which takes only the map lock, so a
//! waiter never deadlocks on the wait lock it already holds, and plain
//! `get`/`set` traffic never queues behind a parked waiter.
//!
//! Lock order is always `wait_lock` then `locations`.
//!
//! Poisoning is ignored on both locks: `wait_lock` guards no data, and the
//! map is only mutated by a single `insert`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::pin::pin;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use shardloc_core::{Error, Location, Result, ShardName, ShardRef, StepName, TaskShards};
use tokio::sync::Notify;
use tracing::{trace, warn};

use crate::config::RegistryConfig;
use crate::observer::{TracingObserver, WaitObserver};

/// Deadline shared by every shard of one wait call.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    started: Instant,
    at: Instant,
}

impl Deadline {
    /// Returns `None` when the timeout is too large to represent, which
    /// callers treat as waiting forever.
    fn after(timeout: Duration) -> Option<Self> {
        let started = Instant::now();
        started.checked_add(timeout).map(|at| Self { started, at })
    }

    /// Time left before the deadline, or `None` once it has passed.
    fn remaining(&self) -> Option<Duration> {
        self.at
            .checked_duration_since(Instant::now())
            .filter(|remaining| !remaining.is_zero())
    }

    fn expired(&self, shard: &str) -> Error {
        let waited = self.started.elapsed();
        warn!(
            shard,
            waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            "gave up waiting for shard location"
        );
        Error::Timeout {
            shard: ShardName::from(shard),
            waited,
        }
    }
}

/// Maps shard names to locations for one execution run.
///
/// Create one registry per run and share it with every dispatch thread
/// through an `Arc`. Registration is write-once in practice: callers never
/// rely on a location changing after it was first set.
#[derive(Debug)]
pub struct ShardLocationRegistry {
    /// Configuration.
    config: RegistryConfig,
    /// Known shard locations.
    locations: Mutex<HashMap<ShardName, Location>>,
    /// Lock paired with `located`.
    wait_lock: Mutex<()>,
    /// Broadcast on every `set` to blocked waiters.
    located: Condvar,
    /// Broadcast on every `set` to async waiters.
    located_async: Notify,
    /// Receives task-level wait events.
    observer: Box<dyn WaitObserver>,
}

impl ShardLocationRegistry {
    /// Creates an empty registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(RegistryConfig::default())
    }

    /// Creates an empty registry with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RegistryConfig) -> Self {
        Self {
            locations: Mutex::new(HashMap::with_capacity(config.initial_capacity)),
            config,
            wait_lock: Mutex::new(()),
            located: Condvar::new(),
            located_async: Notify::new(),
            observer: Box::new(TracingObserver),
        }
    }

    /// Replaces the wait observer.
    #[must_use]
    pub fn with_observer(mut self, observer: impl WaitObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn lock_locations(&self) -> MutexGuard<'_, HashMap<ShardName, Location>> {
        self.locations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_wait(&self) -> MutexGuard<'_, ()> {
        self.wait_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn park<'g>(&self, guard: MutexGuard<'g, ()>) -> MutexGuard<'g, ()> {
        self.located.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the location of a shard, or `None` if it is not registered yet.
    ///
    /// Never blocks on waiters.
    #[must_use]
    pub fn get(&self, name: impl AsRef<str>) -> Option<Location> {
        let locations = self.lock_locations();
        let location = locations.get(name.as_ref()).cloned();
        drop(locations);
        location
    }

    /// Returns true if the shard has a location.
    #[must_use]
    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        let locations = self.lock_locations();
        let found = locations.contains_key(name.as_ref());
        drop(locations);
        found
    }

    /// Publishes a shard's location and wakes every waiter.
    ///
    /// All waiters are woken, whatever they wait for; each re-checks its own
    /// shards. Setting a shard twice keeps the newer location.
    pub fn set(&self, name: impl Into<ShardName>, location: Location) {
        let name = name.into();
        let _wait = self.lock_wait();
        {
            let mut locations = self.lock_locations();
            trace!(shard = %name, url = %location, "shard location registered");
            locations.insert(name, location);
        }
        self.located.notify_all();
        self.located_async.notify_waiters();
    }

    /// Returns the number of registered shards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_locations().len()
    }

    /// Returns true if no shard is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every registered shard, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(ShardName, Location)> {
        let locations = self.lock_locations();
        let mut entries: Vec<_> = locations
            .iter()
            .map(|(name, location)| (name.clone(), location.clone()))
            .collect();
        drop(locations);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Blocks until every named shard has a location.
    ///
    /// Shards are awaited in order. There is no deadline; use
    /// [`Self::wait_for_all_timeout`] to bound the wait.
    pub fn wait_for_all<I>(&self, names: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut guard = self.lock_wait();
        for name in names {
            let name = name.as_ref();
            while !self.contains(name) {
                guard = self.park(guard);
            }
        }
    }

    /// Blocks until every named shard has a location or the timeout expires.
    ///
    /// # Errors
    /// Returns `Error::Timeout` naming the first shard still missing at the deadline.
    pub fn wait_for_all_timeout<I>(&self, names: I, timeout: Duration) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let Some(deadline) = Deadline::after(timeout) else {
            self.wait_for_all(names);
            return Ok(());
        };

        let mut guard = self.lock_wait();
        for name in names {
            guard = self.wait_until_located(guard, name.as_ref(), Some(deadline), |_| {})?;
        }
        Ok(())
    }

    /// Waits asynchronously until every named shard has a location.
    ///
    /// Does not hold the wait lock, so it is safe to call from a tokio task.
    /// Wrap in `tokio::time::timeout` to bound the wait.
    pub async fn wait_for_all_async<I>(&self, names: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            loop {
                let mut notified = pin!(self.located_async.notified());
                // Register before checking so a concurrent `set` cannot be missed.
                notified.as_mut().enable();
                if self.contains(name) {
                    break;
                }
                notified.await;
            }
        }
    }

    /// Blocks until every input shard of `task` has a location.
    ///
    /// Honors the configured wait timeout.
    ///
    /// # Errors
    /// Returns `Error::Timeout` if the configured deadline passes first.
    pub fn wait_for_inputs<T: TaskShards + ?Sized>(&self, task: &T) -> Result<()> {
        self.wait_for_task_shards(task.step_name(), task.input_shards())
    }

    /// Blocks until every output shard of `task` has a location.
    ///
    /// Honors the configured wait timeout.
    ///
    /// # Errors
    /// Returns `Error::Timeout` if the configured deadline passes first.
    pub fn wait_for_outputs<T: TaskShards + ?Sized>(&self, task: &T) -> Result<()> {
        self.wait_for_task_shards(task.step_name(), task.output_shards())
    }

    fn wait_for_task_shards(&self, consumer: &StepName, shards: &[ShardRef]) -> Result<()> {
        let deadline = self.config.wait_timeout.and_then(Deadline::after);

        let mut guard = self.lock_wait();
        for shard in shards {
            guard = self.wait_until_located(guard, shard.name.as_str(), deadline, |found| {
                if found {
                    self.observer.shard_ready(consumer, shard);
                } else {
                    self.observer.shard_pending(consumer, shard);
                }
            })?;
        }
        Ok(())
    }

    /// Parks on the condition variable until `name` is located.
    ///
    /// `observe` is told the outcome of every check.
    fn wait_until_located<'g>(
        &self,
        mut guard: MutexGuard<'g, ()>,
        name: &str,
        deadline: Option<Deadline>,
        mut observe: impl FnMut(bool),
    ) -> Result<MutexGuard<'g, ()>> {
        loop {
            let found = self.contains(name);
            observe(found);
            if found {
                return Ok(guard);
            }

            guard = match deadline {
                None => self.park(guard),
                Some(deadline) => {
                    let remaining = deadline.remaining().ok_or_else(|| deadline.expired(name))?;
                    self.located
                        .wait_timeout(guard, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Renders `name@url` for each shard, comma-separated.
    ///
    /// Call only after a successful wait on the same shards.
    ///
    /// # Panics
    ///
    /// Panics if any shard has no location. That means the caller skipped
    /// the wait, which is a logic error.
    #[must_use]
    pub fn describe_locations<I>(&self, names: I) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let wait = self.lock_wait();
        let mut out = String::new();
        for (i, name) in names.into_iter().enumerate() {
            let name = name.as_ref();
            let Some(location) = self.get(name) else {
                // Release before panicking so only this caller fails.
                drop(wait);
                panic!("shard {name} has no location, but its wait completed");
            };
            if i != 0 {
                out.push(',');
            }
            // Writing to a String cannot fail.
            let _ = write!(out, "{name}@{}", location.url());
        }
        drop(wait);
        out
    }

    /// Renders the locations of every input shard of `task`.
    ///
    /// # Panics
    ///
    /// Panics if any input shard has no location; see [`Self::describe_locations`].
    #[must_use]
    pub fn describe_inputs<T: TaskShards + ?Sized>(&self, task: &T) -> String {
        self.describe_locations(task.input_shards().iter().map(|shard| &shard.name))
    }
}

impl Default for ShardLocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use shardloc_core::TaskView;

    use super::*;

    fn loc(server: &str, port: u16) -> Location {
        Location::new(server, port)
    }

    #[derive(Debug, Default)]
    struct CountingObserver {
        pending: Arc<AtomicUsize>,
        ready: Arc<AtomicUsize>,
    }

    impl WaitObserver for CountingObserver {
        fn shard_pending(&self, _consumer: &StepName, _shard: &ShardRef) {
            self.pending.fetch_add(1, Ordering::SeqCst);
        }

        fn shard_ready(&self, _consumer: &StepName, _shard: &ShardRef) {
            self.ready.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_get_unknown_shard() {
        let registry = ShardLocationRegistry::new();

        assert_eq!(registry.get("d0_0"), None);
        assert!(!registry.contains("d0_0"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let registry = ShardLocationRegistry::new();
        registry.set("d0_0", loc("host-a", 45326));

        assert_eq!(registry.get("d0_0"), Some(loc("host-a", 45326)));
        assert_eq!(registry.get(ShardName::from("d0_0")), Some(loc("host-a", 45326)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_twice_keeps_latest() {
        let registry = ShardLocationRegistry::new();
        registry.set("d0_0", loc("host-a", 1));
        registry.set("d0_0", loc("host-b", 2));

        assert_eq!(registry.get("d0_0"), Some(loc("host-b", 2)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_sorted() {
        let registry = ShardLocationRegistry::new();
        registry.set("b", loc("h", 2));
        registry.set("a", loc("h", 1));

        let names: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|(name, _)| name.into_inner())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_wait_for_all_already_registered() {
        let registry = ShardLocationRegistry::new();
        registry.set("x", loc("h", 1));
        registry.set("y", loc("h", 2));

        registry.wait_for_all(["x", "y"]);
        registry.wait_for_all(Vec::<ShardName>::new());
    }

    #[test]
    fn test_wait_for_all_blocks_until_set() {
        let registry = Arc::new(ShardLocationRegistry::new());

        let waiter = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.wait_for_all(["x"]))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        registry.set("x", loc("h", 1));
        waiter.join().unwrap();
    }

    #[test]
    fn test_wait_for_all_timeout_expires() {
        let registry = ShardLocationRegistry::new();
        registry.set("x", loc("h", 1));

        let err = registry
            .wait_for_all_timeout(["x", "y"], Duration::from_millis(30))
            .unwrap_err();

        match err {
            Error::Timeout { shard, waited } => {
                assert_eq!(shard.as_str(), "y");
                assert!(waited >= Duration::from_millis(30));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wait_for_all_timeout_succeeds() {
        let registry = Arc::new(ShardLocationRegistry::new());

        let waiter = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.wait_for_all_timeout(["x"], Duration::from_secs(10)))
        };

        registry.set("x", loc("h", 1));
        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn test_wait_for_all_timeout_huge_duration() {
        let registry = ShardLocationRegistry::new();
        registry.set("x", loc("h", 1));

        assert!(registry.wait_for_all_timeout(["x"], Duration::MAX).is_ok());
    }

    #[test]
    fn test_with_config_rejects_zero_timeout() {
        let config = RegistryConfig::new().with_wait_timeout(Duration::ZERO);
        assert!(ShardLocationRegistry::with_config(config).is_err());
    }

    #[test]
    fn test_wait_for_inputs_uses_config_timeout() {
        let registry =
            ShardLocationRegistry::with_config(RegistryConfig::fast_for_testing()).unwrap();
        let task = TaskView::new("reduce").with_inputs(vec![ShardRef::new("d1_0", "map")]);

        let err = registry.wait_for_inputs(&task).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_wait_for_outputs_reports_to_observer() {
        let observer = CountingObserver::default();
        let pending = Arc::clone(&observer.pending);
        let ready = Arc::clone(&observer.ready);
        let registry = Arc::new(ShardLocationRegistry::new().with_observer(observer));
        let task = TaskView::new("map").with_outputs(vec![
            ShardRef::new("d1_0", "map"),
            ShardRef::new("d1_1", "map"),
        ]);

        registry.set("d1_0", loc("h", 1));
        let waiter = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.wait_for_outputs(&task))
        };

        // Wait until the waiter has reported d1_1 as pending at least once.
        while pending.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        registry.set("d1_1", loc("h", 2));
        waiter.join().unwrap().unwrap();

        assert_eq!(ready.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_describe_locations() {
        let registry = ShardLocationRegistry::new();
        registry.set("shardX", loc("10.0.0.1", 8001));
        registry.set("shardY", loc("10.0.0.2", 8002));

        assert_eq!(
            registry.describe_locations(["shardX", "shardY"]),
            "shardX@10.0.0.1:8001,shardY@10.0.0.2:8002"
        );
        assert_eq!(registry.describe_locations(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_describe_inputs() {
        let registry = ShardLocationRegistry::new();
        registry.set("d1_0", loc("a", 1));
        registry.set("d2_0", loc("b", 2));
        let task = TaskView::new("join")
            .with_inputs(vec![ShardRef::new("d1_0", "map"), ShardRef::new("d2_0", "read")]);

        registry.wait_for_inputs(&task).unwrap();
        assert_eq!(registry.describe_inputs(&task), "d1_0@a:1,d2_0@b:2");
    }

    #[test]
    #[should_panic(expected = "has no location")]
    fn test_describe_unregistered_panics() {
        let registry = ShardLocationRegistry::new();
        let _ = registry.describe_locations(["missing"]);
    }

    #[test]
    fn test_describe_panic_leaves_registry_usable() {
        let registry = Arc::new(ShardLocationRegistry::new());

        let failed = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.describe_locations(["missing"]))
        };
        assert!(failed.join().is_err());

        let waiter = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.wait_for_all(["x"]))
        };
        registry.set("x", loc("h", 1));
        waiter.join().unwrap();

        registry.wait_for_all_timeout(["x"], Duration::from_secs(1)).unwrap();
        assert_eq!(registry.describe_locations(["x"]), "x@h:1");
    }

    #[test]
    fn test_poisoned_wait_lock_is_recovered() {
        let registry = Arc::new(ShardLocationRegistry::new());

        let poisoner = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let _wait = registry.wait_lock.lock().unwrap();
                panic!("poison the wait lock");
            })
        };
        assert!(poisoner.join().is_err());
        assert!(registry.wait_lock.is_poisoned());

        registry.set("x", loc("h", 1));
        registry.wait_for_all(["x"]);
        assert_eq!(registry.get("x"), Some(loc("h", 1)));
    }

    #[tokio::test]
    async fn test_wait_for_all_async() {
        let registry = Arc::new(ShardLocationRegistry::new());

        let waiter = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.wait_for_all_async(["x", "y"]).await })
        };

        registry.set("x", loc("h", 1));
        registry.set("y", loc("h", 2));

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("async waiter should finish")
            .unwrap();
    }
}
