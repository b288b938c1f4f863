// src/dag/mod.rs

//! Task graph and scheduling.
//!
//! - [`graph`] holds the adjacency view of a task plan.
//! - [`scheduler`] is the per-run state machine deciding which tasks are
//!   ready, and which dependents are failed by an upstream failure.
//! - [`state_manager`] implements the per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::TaskGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};
