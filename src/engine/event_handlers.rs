// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dag::{ScheduledTask, Scheduler, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RunReport, RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, executed by the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Tell connected browsers to reload; `task` just succeeded.
    Reload { task: TaskName },
    /// The runtime should stop (one-shot mode, idle).
    RequestExit,
}

/// Decision returned by the core after handling one event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a task trigger.
///
/// - Idle scheduler: start a new run from this trigger plus anything queued.
/// - Active run, task not in it: merge the task into the active run so
///   unrelated categories proceed in parallel.
/// - Active run, task already in it: record the trigger in the queue.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    report: &mut RunReport,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    debug!(task = %task, ?reason, "trigger received");
    let mut commands = Vec::new();

    if scheduler.is_idle() {
        let mut triggers: BTreeSet<TaskName> = queue.drain_pending().into_iter().collect();
        triggers.insert(task);

        let step = start_new_run_from_triggers(scheduler, report, triggers.into_iter().collect());
        commands.extend(step.commands);
    } else {
        match scheduler.run_state_of(&task) {
            None => debug!(task = %task, "trigger for a task outside this plan; ignoring"),
            Some(TaskRunState::NotInRun) => {
                let step = scheduler.step_trigger(&task);
                report.failed.extend(step.newly_failed);
                if !step.newly_scheduled.is_empty() {
                    commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
                }
            }
            Some(_) => queue.record_trigger(&task),
        }
    }

    finish_step(scheduler, queue, options, commands)
}

/// Handle a task completion.
///
/// Recorded successes produce a reload in watch mode. Once the scheduler is
/// idle, queued re-triggers start the next run.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    report: &mut RunReport,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let step = scheduler.step_completion(&task, outcome);

    for done in &step.newly_succeeded {
        report.succeeded.push(done.clone());
        if options.reload_on_success {
            commands.push(CoreCommand::Reload { task: done.clone() });
        }
    }
    report.failed.extend(step.newly_failed.iter().cloned());

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    commands.extend(maybe_start_queued_run(scheduler, queue, report));

    finish_step(scheduler, queue, options, commands)
}

/// Seed a new run from a set of triggers.
///
/// Tasks that can never run (an upstream outside the run has not succeeded
/// yet) are recorded as failed.
pub fn start_new_run_from_triggers(
    scheduler: &mut Scheduler,
    report: &mut RunReport,
    triggers: Vec<TaskName>,
) -> CoreStep {
    if triggers.is_empty() {
        return CoreStep::continue_with(Vec::new());
    }

    scheduler.start_new_run();
    let step = scheduler.step_triggers(&triggers);
    report.failed.extend(step.newly_failed);

    let mut commands = Vec::new();
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }
    CoreStep::continue_with(commands)
}

fn maybe_start_queued_run(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    report: &mut RunReport,
) -> Vec<CoreCommand> {
    if !scheduler.is_idle() {
        return Vec::new();
    }

    let triggers = queue.drain_pending();
    if triggers.is_empty() {
        return Vec::new();
    }

    start_new_run_from_triggers(scheduler, report, triggers).commands
}

// In one-shot mode, stop once nothing is running and nothing is queued.
fn finish_step(
    scheduler: &Scheduler,
    queue: &TriggerQueue,
    options: &RuntimeOptions,
    mut commands: Vec<CoreCommand>,
) -> CoreStep {
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }
    CoreStep::continue_with(commands)
}
