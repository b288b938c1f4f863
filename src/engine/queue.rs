// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::engine::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Triggers that arrived for tasks already participating in the active run.
///
/// Each entry is a batch of task names for one future run. `max_runs`
/// bounds the number of batches; when the scheduler goes idle all batches
/// are merged and drained into a single new run.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    runs: VecDeque<BTreeSet<TaskName>>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Record a re-trigger that arrived while the task is in the active run.
    ///
    /// - `Queue`: merge into the newest batch (creating one if needed) and
    ///   drop the oldest batches beyond `max_runs`.
    /// - `Cancel`: forget everything queued so far and keep only this task.
    pub fn record_trigger(&mut self, task: &str) {
        let name = task.to_string();

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                match self.runs.back_mut() {
                    Some(batch) => {
                        let inserted = batch.insert(name.clone());
                        debug!(task = %name, inserted, "merged re-trigger into queued batch");
                    }
                    None => {
                        self.runs.push_back(BTreeSet::from([name.clone()]));
                        debug!(task = %name, "queued re-trigger in a new batch");
                    }
                }

                if self.runs.len() > self.max_runs {
                    warn!(
                        batches = self.runs.len(),
                        max_runs = self.max_runs,
                        "too many queued batches; dropping the oldest"
                    );
                    while self.runs.len() > self.max_runs {
                        self.runs.pop_front();
                    }
                }
            }
            TriggerWhileRunningBehaviour::Cancel => {
                debug!(task = %name, "replacing queued batches with this task");
                self.runs.clear();
                self.runs.push_back(BTreeSet::from([name]));
            }
        }
    }

    /// Merge and remove every queued batch. Names come back sorted.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        let mut merged = BTreeSet::new();
        while let Some(batch) = self.runs.pop_front() {
            merged.extend(batch);
        }

        let tasks: Vec<TaskName> = merged.into_iter().collect();
        debug!(drained = tasks.len(), "drained queued triggers into new run");
        tasks
    }
}
