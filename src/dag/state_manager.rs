// src/dag/state_manager.rs

//! Per-run state transitions for the scheduler.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::dag::TaskGraph;
use crate::engine::TaskName;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Pull `root` and everything downstream of it into the current run.
    /// Tasks already in the run keep their state.
    pub fn mark_task_and_dependents_pending(&mut self, root: &str) {
        let mut stack: Vec<TaskName> = vec![root.to_string()];
        let mut visited: HashSet<TaskName> = HashSet::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            if let Some(info) = self.tasks.get_mut(&name) {
                if info.run_state.is_none() {
                    info.run_state = Some(RunState::Pending);
                    debug!(task = %info.name, "marked Pending for this run");
                }

                stack.extend(self.graph.dependents_of(&name).iter().cloned());
            } else {
                warn!(task = %name, "graph node missing from tasks map");
            }
        }
    }

    /// A dependency is satisfied when it succeeded in this run, or when it
    /// is not part of this run and succeeded in an earlier one.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        for dep_name in &info.deps {
            let dep = match self.tasks.get(dep_name) {
                Some(d) => d,
                None => {
                    warn!(
                        task = %info.name,
                        dep = %dep_name,
                        "dependency missing from tasks map"
                    );
                    return false;
                }
            };

            match dep.run_state {
                Some(RunState::DoneSuccess) => {}
                Some(RunState::DoneFailed | RunState::Pending | RunState::Running) => {
                    return false;
                }
                None if dep.last_successful_run.is_none() => return false,
                None => {}
            }
        }

        true
    }

    /// Fail every dependent of `failed_task` that is waiting in this run,
    /// transitively. Returns the newly failed names, not including
    /// `failed_task` itself.
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self
            .graph
            .dependents_of(failed_task)
            .iter()
            .cloned()
            .collect();

        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&name) {
                match info.run_state {
                    Some(RunState::Pending) | Some(RunState::Running) => {
                        info.run_state = Some(RunState::DoneFailed);
                        debug!(
                            task = %info.name,
                            upstream = %failed_task,
                            "dependent failed by upstream failure"
                        );
                        newly_failed.push(info.name.clone());
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    Some(RunState::DoneSuccess) | Some(RunState::DoneFailed) | None => {}
                }
            }
        }

        newly_failed
    }

    /// Collect `Pending` tasks whose dependencies are satisfied, mark them
    /// `Running` and return them, sorted by name.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();

        // Decide first, then mutate.
        let mut candidates: Vec<TaskName> = self
            .tasks
            .values()
            .filter_map(|info| {
                if matches!(info.run_state, Some(RunState::Pending))
                    && self.deps_satisfied_for_info(info)
                {
                    Some(info.name.clone())
                } else {
                    None
                }
            })
            .collect();
        candidates.sort();

        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                let is_rerun = info.last_successful_run.is_some() || info.last_failed_run.is_some();

                info!(
                    task = %info.name,
                    run_id = self.current_run_id,
                    rerun = is_rerun,
                    "dependencies satisfied; scheduling task"
                );

                info.run_state = Some(RunState::Running);
                ready.push(ScheduledTask::from_task_info(
                    info,
                    self.current_run_id.unwrap_or(0),
                ));
            }
        }

        ready
    }

    /// Fail every `Pending` task once nothing is `Running`: such tasks wait
    /// on an upstream that is outside this run and never succeeded, so they
    /// can never become ready. Returns their names, sorted.
    pub fn fail_stranded_tasks(&mut self) -> Vec<TaskName> {
        if self
            .tasks
            .values()
            .any(|info| info.run_state == Some(RunState::Running))
        {
            return Vec::new();
        }

        let mut stranded: Vec<TaskName> = self
            .tasks
            .values()
            .filter(|info| info.run_state == Some(RunState::Pending))
            .map(|info| info.name.clone())
            .collect();
        stranded.sort();

        for name in &stranded {
            if let Some(info) = self.tasks.get_mut(name) {
                warn!(
                    task = %name,
                    run_id = self.current_run_id,
                    "upstream task has never succeeded; failing task"
                );
                info.run_state = Some(RunState::DoneFailed);
            }
        }

        stranded
    }

    /// No task is `Pending` or `Running`.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.values().any(|info| {
            matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }
}
