// tests/runtime_fake_executor.rs

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use assetflow::config::Project;
use assetflow::dag::Scheduler;
use assetflow::engine::{
    CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
    TriggerWhileRunningBehaviour,
};
use assetflow::fs::mock::MockFileSystem;
use assetflow::fs::FileSystem;
use assetflow::tasks::TaskPlan;
use assetflow_test_utils::builders::ConfigFileBuilder;
use assetflow_test_utils::fake_executor::{FakeExecutor, FakeReloader};
use assetflow_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const CATEGORIES: [&str; 6] = ["css", "fonts", "html", "img", "libs", "scripts"];

fn project() -> (Project, Arc<dyn FileSystem>) {
    let project = Project::new(".", ConfigFileBuilder::new().build());
    (project, Arc::new(MockFileSystem::new()))
}

async fn run_build_with(executor_failing: &[&str]) -> Result<(RunReport, Vec<String>), Box<dyn Error>> {
    let (project, fs) = project();
    let plan = TaskPlan::build(&project, &fs)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let mut executor = FakeExecutor::new(rt_tx.clone(), executed.clone());
    for task in executor_failing {
        executor = executor.failing(task);
    }

    for task in plan.roots() {
        rt_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::Manual,
            })
            .await?;
    }

    let core = CoreRuntime::new(
        Scheduler::from_plan(&plan),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: true,
            reload_on_success: false,
        },
    );
    let report = with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    let executed = executed.lock().unwrap().clone();
    Ok((report, executed))
}

#[tokio::test]
async fn build_runs_clean_before_every_category() -> TestResult {
    init_tracing();

    let (report, executed) = run_build_with(&[]).await?;

    assert_eq!(executed.first().map(String::as_str), Some("clean"));
    let mut rest: Vec<&str> = executed[1..].iter().map(String::as_str).collect();
    rest.sort();
    assert_eq!(rest, CATEGORIES);

    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 7);
    Ok(())
}

#[tokio::test]
async fn failed_clean_blocks_every_category() -> TestResult {
    init_tracing();

    let (report, executed) = run_build_with(&["clean"]).await?;

    assert_eq!(executed, vec!["clean".to_string()]);
    assert!(!report.is_success());

    let mut failed = report.failed.clone();
    failed.sort();
    let mut expected: Vec<String> = CATEGORIES.iter().map(|s| s.to_string()).collect();
    expected.push("clean".to_string());
    expected.sort();
    assert_eq!(failed, expected);
    Ok(())
}

#[tokio::test]
async fn failing_category_does_not_abort_siblings() -> TestResult {
    init_tracing();

    let (report, executed) = run_build_with(&["css"]).await?;

    assert_eq!(executed.len(), 7);
    assert_eq!(report.failed, vec!["css".to_string()]);
    assert_eq!(report.succeeded.len(), 6);
    Ok(())
}

/// Watch-mode runtime with every trigger preloaded; it exits once the
/// scheduler settles so the event order is deterministic.
async fn run_watch_with(
    triggers: &[&str],
    failing: &str,
) -> Result<(RunReport, Vec<String>, usize), Box<dyn Error>> {
    let (project, fs) = project();
    let plan = TaskPlan::watch(&project, &fs)?;
    assert!(!plan.contains("clean"));

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone()).failing(failing);
    let reloader = FakeReloader::new();

    for task in triggers {
        rt_tx
            .send(RuntimeEvent::TaskTriggered {
                task: task.to_string(),
                reason: TriggerReason::FileWatch,
            })
            .await?;
    }

    let core = CoreRuntime::new(
        Scheduler::from_plan(&plan),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: true,
            reload_on_success: true,
        },
    );
    let report = with_timeout(
        Runtime::new(core, rt_rx, executor)
            .with_reloader(reloader.clone())
            .run(),
    )
    .await?;

    let executed = executed.lock().unwrap().clone();
    Ok((report, executed, reloader.count()))
}

#[tokio::test]
async fn watch_reloads_after_success_only() -> TestResult {
    init_tracing();

    let (report, executed, reloads) = run_watch_with(&["html", "css"], "html").await?;

    assert_eq!(reloads, 1);
    assert_eq!(report.succeeded, vec!["css".to_string()]);
    assert_eq!(report.failed, vec!["html".to_string()]);
    assert_eq!(executed, vec!["html".to_string(), "css".to_string()]);
    Ok(())
}

#[tokio::test]
async fn retrigger_during_run_is_queued_and_failures_are_survived() -> TestResult {
    init_tracing();

    let (report, executed, reloads) =
        run_watch_with(&["scripts", "scripts", "libs"], "scripts").await?;

    // scripts runs once, libs joins the active run, the queued scripts
    // re-trigger starts a second run once the first settles.
    assert_eq!(
        executed,
        vec!["scripts".to_string(), "libs".to_string(), "scripts".to_string()]
    );
    assert_eq!(report.failed, vec!["scripts".to_string(), "scripts".to_string()]);
    assert_eq!(report.succeeded, vec!["libs".to_string()]);
    assert_eq!(reloads, 1);
    Ok(())
}

#[tokio::test]
async fn shutdown_stops_an_idle_watch_runtime() -> TestResult {
    init_tracing();

    let (project, fs) = project();
    let plan = TaskPlan::watch(&project, &fs)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(8);
    let executor = FakeExecutor::new(rt_tx.clone(), Arc::new(Mutex::new(Vec::new())));
    let core = CoreRuntime::new(
        Scheduler::from_plan(&plan),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: false,
            reload_on_success: true,
        },
    );
    let handle = tokio::spawn(Runtime::new(core, rt_rx, executor).run());

    sleep(Duration::from_millis(20)).await;
    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;

    let report = with_timeout(handle).await??;
    assert_eq!(report, RunReport::default());
    Ok(())
}
