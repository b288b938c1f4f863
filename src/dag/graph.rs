// src/dag/graph.rs

use std::collections::HashMap;

use crate::engine::TaskName;
use crate::tasks::TaskPlan;

#[derive(Debug, Clone)]
struct TaskNode {
    /// Tasks that must succeed before this one can run.
    deps: Vec<TaskName>,
    /// Tasks that list this one in their `after`.
    dependents: Vec<TaskName>,
}

/// Adjacency view of a [`TaskPlan`], keyed by task name.
///
/// Acyclicity and reference validity are checked when the plan is built,
/// so this only keeps edges for scheduling.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: HashMap<TaskName, TaskNode>,
}

impl TaskGraph {
    pub fn from_plan(plan: &TaskPlan) -> Self {
        let mut nodes: HashMap<TaskName, TaskNode> = plan
            .tasks()
            .map(|task| {
                (
                    task.name.clone(),
                    TaskNode {
                        deps: task.after.clone(),
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        for task in plan.tasks() {
            for dep in &task.after {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(task.name.clone());
                }
            }
        }

        Self { nodes }
    }

    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
