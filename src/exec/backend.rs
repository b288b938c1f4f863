// src/exec/backend.rs

//! Pluggable executor backend.
//!
//! The runtime talks to an [`ExecutorBackend`] instead of a raw channel so
//! tests can swap in a fake that completes tasks synchronously.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::exec::executor_loop::spawn_executor;
use crate::tasks::{TaskContext, TaskPlan};

/// How scheduled tasks get executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks. Implementations report each outcome back
    /// to the runtime as a `RuntimeEvent::TaskCompleted`.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production backend: runs task definitions from a [`TaskPlan`].
pub struct PipelineExecutor {
    tx: mpsc::Sender<ScheduledTask>,
}

impl PipelineExecutor {
    /// Spawns the background executor loop immediately.
    pub fn new(
        plan: Arc<TaskPlan>,
        ctx: Arc<TaskContext>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        let tx = spawn_executor(plan, ctx, runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for PipelineExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
