// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`]: the `ExecutorBackend` seam the runtime dispatches through,
//!   with the production `PipelineExecutor`.
//! - [`executor_loop`]: background loop that owns in-flight task handles.
//! - [`task_runner`]: runs one task and reports its outcome.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, PipelineExecutor};
pub use executor_loop::spawn_executor;
