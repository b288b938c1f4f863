// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::core::CoreRuntime;
use crate::engine::{CoreCommand, RunReport, RuntimeEvent};
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::server::Reloader;

/// Async shell around [`CoreRuntime`].
///
/// Reads [`RuntimeEvent`]s from a channel, feeds them to the core and
/// carries out the resulting commands: dispatching tasks to the executor
/// backend and forwarding reload requests to the dev server.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reloader: Option<Arc<dyn Reloader>>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("reloader", &self.reloader.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reloader: None,
        }
    }

    pub fn with_reloader(mut self, reloader: Arc<dyn Reloader>) -> Self {
        self.reloader = Some(reloader);
        self
    }

    /// Main event loop. Returns the report of every task that finished.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        let report = self.core.into_report();
        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "runtime exiting"
        );
        Ok(report)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
            CoreCommand::Reload { task } => match &self.reloader {
                Some(reloader) => {
                    info!(task = %task, "reloading browsers");
                    reloader.reload();
                }
                None => debug!(task = %task, "no reloader attached; skipping reload"),
            },
            CoreCommand::RequestExit => debug!("core issued RequestExit"),
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
