// tests/core_runtime.rs

use std::sync::Arc;

use assetflow::config::Project;
use assetflow::dag::{Scheduler, TaskRunState};
use assetflow::engine::{
    CoreCommand, CoreRuntime, RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason,
    TriggerWhileRunningBehaviour,
};
use assetflow::fs::mock::MockFileSystem;
use assetflow::fs::FileSystem;
use assetflow::tasks::TaskPlan;
use assetflow_test_utils::builders::ConfigFileBuilder;
use assetflow_test_utils::init_tracing;

fn watch_core(behaviour: TriggerWhileRunningBehaviour) -> CoreRuntime {
    let project = Project::new(".", ConfigFileBuilder::new().build());
    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());
    let plan = TaskPlan::watch(&project, &fs).expect("watch plan");

    CoreRuntime::new(
        Scheduler::from_plan(&plan),
        behaviour,
        1,
        RuntimeOptions {
            exit_when_idle: false,
            reload_on_success: true,
        },
    )
}

fn trigger(task: &str) -> RuntimeEvent {
    RuntimeEvent::TaskTriggered {
        task: task.to_string(),
        reason: TriggerReason::FileWatch,
    }
}

fn completed(task: &str, outcome: TaskOutcome) -> RuntimeEvent {
    RuntimeEvent::TaskCompleted {
        task: task.to_string(),
        outcome,
    }
}

fn dispatched(commands: &[CoreCommand]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|c| match c {
            CoreCommand::DispatchTasks(tasks) => Some(tasks.iter().map(|t| t.name.clone())),
            _ => None,
        })
        .flatten()
        .collect()
}

fn reloads(commands: &[CoreCommand]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, CoreCommand::Reload { .. }))
        .count()
}

#[test]
fn only_the_changed_category_runs() {
    init_tracing();
    let mut core = watch_core(TriggerWhileRunningBehaviour::Queue);

    let step = core.step(trigger("css"));
    assert_eq!(dispatched(&step.commands), vec!["css"]);
    assert!(step.keep_running);

    let scheduler = core.scheduler();
    assert_eq!(scheduler.run_state_of("css"), Some(TaskRunState::Running));
    for other in ["html", "scripts", "img", "fonts", "libs"] {
        assert_eq!(scheduler.run_state_of(other), Some(TaskRunState::NotInRun));
    }

    let step = core.step(completed("css", TaskOutcome::Success));
    assert_eq!(reloads(&step.commands), 1);
    assert!(dispatched(&step.commands).is_empty());
    assert!(core.is_idle());
}

#[test]
fn other_category_joins_the_active_run() {
    init_tracing();
    let mut core = watch_core(TriggerWhileRunningBehaviour::Queue);

    core.step(trigger("css"));
    let step = core.step(trigger("html"));

    assert_eq!(dispatched(&step.commands), vec!["html"]);
    assert!(core.queue_is_empty());
}

#[test]
fn retrigger_waits_for_the_run_to_settle() {
    init_tracing();
    let mut core = watch_core(TriggerWhileRunningBehaviour::Queue);

    core.step(trigger("css"));
    let step = core.step(trigger("css"));
    assert!(dispatched(&step.commands).is_empty());
    assert!(!core.queue_is_empty());

    let step = core.step(completed("css", TaskOutcome::Success));
    assert_eq!(reloads(&step.commands), 1);
    assert_eq!(dispatched(&step.commands), vec!["css"]);
    assert!(core.queue_is_empty());
}

#[test]
fn cancel_keeps_only_the_latest_retrigger() {
    init_tracing();
    let mut core = watch_core(TriggerWhileRunningBehaviour::Cancel);

    core.step(trigger("css"));
    core.step(trigger("html"));
    core.step(trigger("css"));
    core.step(trigger("html"));

    core.step(completed("css", TaskOutcome::Success));
    let step = core.step(completed("html", TaskOutcome::Success));

    assert_eq!(dispatched(&step.commands), vec!["html"]);
}

#[test]
fn failure_emits_no_reload() {
    init_tracing();
    let mut core = watch_core(TriggerWhileRunningBehaviour::Queue);

    core.step(trigger("scripts"));
    let step = core.step(completed("scripts", TaskOutcome::Failed("boom".into())));

    assert_eq!(reloads(&step.commands), 0);
    assert!(step.keep_running);
    assert_eq!(core.report().failed, vec!["scripts".to_string()]);
}

#[test]
fn stray_completion_is_ignored() {
    init_tracing();
    let mut core = watch_core(TriggerWhileRunningBehaviour::Queue);

    let step = core.step(completed("img", TaskOutcome::Success));

    assert!(step.commands.is_empty());
    assert!(core.report().succeeded.is_empty());
}

#[test]
fn shutdown_stops_the_loop() {
    let mut core = watch_core(TriggerWhileRunningBehaviour::Queue);
    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
}

#[test]
fn task_behind_a_never_run_upstream_fails_instead_of_hanging() {
    init_tracing();
    let project = Project::new(".", ConfigFileBuilder::new().build());
    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());
    let plan = TaskPlan::build(&project, &fs).expect("build plan");
    let mut core = CoreRuntime::new(
        Scheduler::from_plan(&plan),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: true,
            reload_on_success: false,
        },
    );

    // css depends on clean, which has never succeeded.
    let step = core.step(trigger("css"));

    assert!(dispatched(&step.commands).is_empty());
    assert!(step.commands.contains(&CoreCommand::RequestExit));
    assert_eq!(core.report().failed, vec!["css".to_string()]);
    assert!(core.is_idle());
}
