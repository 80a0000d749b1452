//! Shardloc Registry - Shard location discovery for dataflow schedulers.
//!
//! Tasks in a distributed dataflow run are launched independently. A task
//! whose inputs are produced by another running task must not start until
//! it knows where those inputs live. This crate provides the registry that
//! producers publish shard locations to and consumers block on.
//!
//! # Design
//!
//! - **One registry per run**: no global instance; share it with an `Arc`
//! - **Broadcast and re-check**: every `set` wakes every waiter, and each
//!   waiter re-checks only its own shards
//! - **Two lock domains**: map reads and writes never queue behind a parked waiter
//! - **Bounded waits on request**: deadline-aware and async variants
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use shardloc_core::Location;
//! use shardloc_registry::ShardLocationRegistry;
//!
//! let registry = Arc::new(ShardLocationRegistry::new());
//!
//! let consumer = {
//!     let registry = Arc::clone(&registry);
//!     thread::spawn(move || {
//!         registry.wait_for_all(["d1_0", "d1_1"]);
//!         registry.describe_locations(["d1_0", "d1_1"])
//!     })
//! };
//!
//! registry.set("d1_0", Location::new("10.0.0.1", 45326));
//! registry.set("d1_1", Location::new("10.0.0.2", 45326));
//!
//! assert_eq!(
//!     consumer.join().unwrap(),
//!     "d1_0@10.0.0.1:45326,d1_1@10.0.0.2:45326"
//! );
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod observer;
mod registry;

pub use config::RegistryConfig;
pub use observer::{TracingObserver, WaitObserver};
pub use registry::ShardLocationRegistry;
