//! Read-only view of a task's shards.
//!
//! The dataflow model that owns tasks lives upstream. The registry only needs
//! to know, for one task, which shards it reads and writes and which step
//! produced each of them.

use crate::types::{ShardName, StepName};

/// A shard named together with the step that produces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardRef {
    /// The shard's registry key.
    pub name: ShardName,
    /// The step that produces the shard.
    pub step: StepName,
}

impl ShardRef {
    /// Creates a new shard reference.
    #[must_use]
    pub fn new(name: impl Into<ShardName>, step: impl Into<StepName>) -> Self {
        Self {
            name: name.into(),
            step: step.into(),
        }
    }
}

/// A task as seen by the shard location registry.
///
/// Implemented by the scheduler's task type. Shard order is significant:
/// waits visit shards in the order returned here.
pub trait TaskShards {
    /// Name of the step this task runs.
    fn step_name(&self) -> &StepName;

    /// Shards the task reads, in order.
    fn input_shards(&self) -> &[ShardRef];

    /// Shards the task writes, in order.
    fn output_shards(&self) -> &[ShardRef];
}

/// Owned task description implementing [`TaskShards`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskView {
    step: StepName,
    inputs: Vec<ShardRef>,
    outputs: Vec<ShardRef>,
}

impl TaskView {
    /// Creates a task with no inputs or outputs.
    #[must_use]
    pub fn new(step: impl Into<StepName>) -> Self {
        Self {
            step: step.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the input shards.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<ShardRef>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Sets the output shards.
    #[must_use]
    pub fn with_outputs(mut self, outputs: Vec<ShardRef>) -> Self {
        self.outputs = outputs;
        self
    }
}

impl TaskShards for TaskView {
    fn step_name(&self) -> &StepName {
        &self.step
    }

    fn input_shards(&self) -> &[ShardRef] {
        &self.inputs
    }

    fn output_shards(&self) -> &[ShardRef] {
        &self.outputs
    }
}
