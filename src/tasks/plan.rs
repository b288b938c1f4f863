// src/tasks/plan.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::Project;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};
use crate::fs::FileSystem;
use crate::tasks::definitions::{category_task, clean_task, sprite_task, CLEAN_TASK};
use crate::tasks::TaskDef;
use crate::types::Category;

/// A validated set of tasks: every `after` reference exists and the
/// dependency graph is acyclic.
#[derive(Debug, Clone)]
pub struct TaskPlan {
    tasks: BTreeMap<TaskName, TaskDef>,
}

impl TaskPlan {
    pub fn from_tasks(tasks: impl IntoIterator<Item = TaskDef>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for task in tasks {
            let name = task.name.clone();
            if map.insert(name.clone(), task).is_some() {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{name}' is defined twice"
                )));
            }
        }

        validate_dependencies(&map)?;
        validate_acyclic(&map)?;

        Ok(Self { tasks: map })
    }

    /// `clean`, then every category of the path table in parallel.
    pub fn build(project: &Project, fs: &Arc<dyn FileSystem>) -> Result<Self> {
        let mut tasks = vec![clean_task(project)];
        for category in categories(project) {
            tasks.push(category_task(project, fs, category, &[CLEAN_TASK])?);
        }
        Self::from_tasks(tasks)
    }

    pub fn clean(project: &Project) -> Result<Self> {
        Self::from_tasks([clean_task(project)])
    }

    pub fn svg(project: &Project) -> Result<Self> {
        Self::from_tasks([sprite_task(project)?])
    }

    /// Category tasks without the `clean` edge, for incremental re-runs.
    pub fn watch(project: &Project, fs: &Arc<dyn FileSystem>) -> Result<Self> {
        let tasks = categories(project)
            .map(|category| category_task(project, fs, category, &[]))
            .collect::<Result<Vec<_>>>()?;
        Self::from_tasks(tasks)
    }

    pub fn get(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskDef> {
        self.tasks.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks with no `after` dependencies, sorted by name.
    pub fn roots(&self) -> Vec<TaskName> {
        self.tasks
            .values()
            .filter(|t| t.after.is_empty())
            .map(|t| t.name.clone())
            .collect()
    }
}

fn categories(project: &Project) -> impl Iterator<Item = Category> + '_ {
    project.config.paths.entries().map(|e| e.category)
}

fn validate_dependencies(tasks: &BTreeMap<TaskName, TaskDef>) -> Result<()> {
    for (name, task) in tasks {
        for dep in &task.after {
            if dep == name {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{name}' cannot depend on itself"
                )));
            }
            if !tasks.contains_key(dep) {
                return Err(AssetflowError::TaskNotFound(format!(
                    "{dep} (required by '{name}')"
                )));
            }
        }
    }
    Ok(())
}

fn validate_acyclic(tasks: &BTreeMap<TaskName, TaskDef>) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in tasks.keys() {
        graph.add_node(name.as_str());
    }
    for (name, task) in tasks {
        for dep in &task.after {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_) => Ok(()),
        Err(cycle) => Err(AssetflowError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
