//! Shardloc Tests - Concurrency tests for shard location discovery.
//!
//! ## Test Organization
//!
//! **Integration Tests** (`*_tests.rs`):
//! - `registry_tests`: read-your-write, absence, termination, no missed wakeup, re-set
//! - `scenario_tests`: end-to-end producer/consumer runs and fan-out
//! - `task_tests`: task-level waits with observers and deadlines
//! - `async_tests`: async waiters on a tokio runtime
//!
//! **Support Modules**:
//! - `scenarios`: reusable waiter/producer harnesses
//!
//! ## Naming Conventions
//!
//! - Integration tests: `test_<component>_<scenario>`
//! - Unit tests: Inline in each crate under `#[cfg(test)]`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod scenarios;
