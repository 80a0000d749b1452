//! Shardloc Core - Strongly-typed names and locations for shard discovery.
//!
//! This crate provides the vocabulary shared by the registry and its callers:
//! shard and step names, the network location a shard lives at, and the
//! read-only view of a task's input and output shards.
//!
//! # Design Principles
//!
//! - **Strongly-typed names**: A `ShardName` cannot be mixed up with a `StepName`
//! - **Opaque identities**: Names are compared, hashed and displayed, never parsed
//! - **No unsafe code**: Safety > Performance

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod location;
mod task;
mod types;

pub use error::{Error, Result};
pub use location::{
    Location, DISTANCE_REMOTE, DISTANCE_SAME_DATA_CENTER, DISTANCE_SAME_RACK, DISTANCE_SAME_SERVER,
};
pub use task::{ShardRef, TaskShards, TaskView};
pub use types::{ShardName, StepName};
