// src/dag/scheduler_step.rs

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Structured result of a single scheduler step.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// The completed task, if its success was recorded.
    pub newly_succeeded: Vec<TaskName>,
    /// Tasks newly marked failed: the failing task first, then any
    /// dependents that will now never run.
    pub newly_failed: Vec<TaskName>,
    /// Whether this step finished the current run.
    pub run_just_finished: bool,
}
