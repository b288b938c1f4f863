// src/exec/executor_loop.rs

//! Background loop that runs scheduled tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskName};
use crate::exec::task_runner::run_task;
use crate::tasks::{TaskContext, TaskPlan};

/// Spawn the executor loop and return the sender the backend feeds.
///
/// Every scheduled task runs in its own Tokio task. Per task name there is
/// never more than one instance at a time: if a previous instance is still
/// writing, the new one waits for it before starting.
pub fn spawn_executor(
    plan: Arc<TaskPlan>,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!(tasks = plan.len(), "executor loop started");

        let mut active: HashMap<TaskName, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            active.retain(|_, handle| !handle.is_finished());

            let previous = active.remove(&task.name);
            let handle = spawn_task(
                task.clone(),
                previous,
                Arc::clone(&plan),
                Arc::clone(&ctx),
                runtime_tx.clone(),
            );
            active.insert(task.name, handle);
        }

        debug!(in_flight = active.len(), "executor channel closed; waiting for tasks");
        for (_, handle) in active {
            let _ = handle.await;
        }
        info!("executor loop finished");
    });

    tx
}

fn spawn_task(
    task: ScheduledTask,
    previous: Option<JoinHandle<()>>,
    plan: Arc<TaskPlan>,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(previous) = previous {
            warn!(
                task = %task.name,
                run_id = task.run_id,
                "previous instance still running; waiting for it"
            );
            if let Err(e) = previous.await {
                warn!(task = %task.name, error = %e, "previous instance panicked");
            }
        }
        run_task(task, plan, ctx, runtime_tx).await;
    })
}
