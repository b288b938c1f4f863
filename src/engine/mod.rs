// src/engine/mod.rs

//! Orchestration engine.
//!
//! Ties together the task scheduler, the trigger queue (what happens when a
//! running task is triggered again) and the event loop reacting to file
//! watch triggers, task completions and shutdown.
//!
//! The pure state machine lives in [`core`]; the async shell that talks to
//! the executor and the reloader is [`runtime`].

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of one task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// The task failed; the payload is the rendered error.
    Failed(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Seeded by the CLI (plan roots at startup).
    Manual,
    /// A watched file changed.
    FileWatch,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once the scheduler is idle and no triggers are queued
    /// (one-shot commands such as `build`).
    pub exit_when_idle: bool,
    /// Emit a reload after every successfully completed task (watch mode).
    pub reload_on_success: bool,
}

/// Events flowing into the runtime from the watcher, the executor and the
/// signal handler.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Tasks that finished during the lifetime of a runtime, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub succeeded: Vec<TaskName>,
    /// Failed tasks, including dependents that never ran because of an
    /// upstream failure.
    pub failed: Vec<TaskName>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
pub use crate::types::TriggerWhileRunningBehaviour;
