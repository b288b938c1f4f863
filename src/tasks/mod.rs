// src/tasks/mod.rs

//! Task definitions and task plans.
//!
//! A [`TaskDef`] is a named unit of work: either the clean action or a
//! [`Pipeline`]. Definitions are built once from the [`Project`] and grouped
//! into a [`TaskPlan`] (the tasks of one CLI invocation plus their `after`
//! edges).
//!
//! [`Project`]: crate::config::Project

pub mod clean;
pub mod definitions;
pub mod plan;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::engine::TaskName;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::pipeline::Pipeline;
use crate::types::Category;

pub use definitions::{category_task, clean_task, sprite_task, CLEAN_TASK, SVG_TASK};
pub use plan::TaskPlan;

/// What a task does when it runs.
#[derive(Debug, Clone)]
pub enum TaskAction {
    /// Remove `target` (project-relative) recursively.
    Clean { target: PathBuf },
    Pipeline(Pipeline),
}

#[derive(Debug, Clone)]
pub struct TaskDef {
    pub name: TaskName,
    /// Asset category this task produces, if any.
    pub category: Option<Category>,
    /// Tasks that must succeed before this one runs.
    pub after: Vec<TaskName>,
    pub action: TaskAction,
}

impl TaskDef {
    /// Same task without any `after` edges.
    pub fn detached(mut self) -> Self {
        self.after.clear();
        self
    }

    /// Run the task's action. Returns the files written.
    pub async fn run(&self, ctx: &TaskContext) -> Result<Vec<PathBuf>> {
        match &self.action {
            TaskAction::Clean { target } => {
                let dir = ctx.root.join(target);
                let removed = clean::remove_output_dir(Arc::clone(&ctx.fs), dir).await?;
                debug!(task = %self.name, removed, "clean finished");
                Ok(Vec::new())
            }
            TaskAction::Pipeline(pipeline) => {
                pipeline
                    .run(&self.name, Arc::clone(&ctx.fs), &ctx.root)
                    .await
            }
        }
    }
}

/// Everything a running task needs from the outside world.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub fs: Arc<dyn FileSystem>,
    /// Project root all task paths are relative to.
    pub root: PathBuf,
}

impl TaskContext {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }
}
