// src/exec/task_runner.rs

//! Runs a single task and reports the outcome.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::AssetflowError;
use crate::tasks::{TaskContext, TaskPlan};

/// Run `task` from `plan` and send exactly one `TaskCompleted` event.
///
/// Errors never escape: they are logged and turned into
/// `TaskOutcome::Failed` with the rendered error chain.
pub async fn run_task(
    task: ScheduledTask,
    plan: Arc<TaskPlan>,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let outcome = match plan.get(&task.name) {
        None => {
            let err = AssetflowError::TaskNotFound(task.name.clone());
            error!(task = %task.name, run_id = task.run_id, error = %err, "cannot run task");
            TaskOutcome::Failed(err.to_string())
        }
        Some(def) => {
            info!(task = %task.name, run_id = task.run_id, "starting task");
            let started = Instant::now();

            match def.run(&ctx).await {
                Ok(written) => {
                    info!(
                        task = %task.name,
                        run_id = task.run_id,
                        files = written.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "task finished"
                    );
                    TaskOutcome::Success
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    error!(
                        task = %task.name,
                        run_id = task.run_id,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %message,
                        "task failed"
                    );
                    TaskOutcome::Failed(message)
                }
            }
        }
    };

    if let Err(e) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
    {
        warn!(task = %task.name, error = %e, "runtime gone; dropping task completion");
    }
}
