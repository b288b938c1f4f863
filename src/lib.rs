// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, TaskCommand};
use crate::config::{load_project, Project};
use crate::dag::Scheduler;
use crate::engine::{CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::{AssetflowError, Error, Result};
use crate::exec::PipelineExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::server::{DevServer, ServerOptions};
use crate::tasks::{TaskAction, TaskContext, TaskPlan};
use crate::watch::{bindings_from_paths, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// Loads the project, then runs the requested task:
/// - `build`, `clean`, `svg`: run the plan once and exit.
/// - `default`: build; on success serve the output and watch for changes
///   until Ctrl-C.
pub async fn run(args: CliArgs) -> Result<()> {
    let project = Arc::new(load_project(args.config.as_deref())?);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.dry_run {
        print_dry_run(&project, &fs, args.task)?;
        return Ok(());
    }

    info!(task = args.task.as_str(), root = ?project.root, "assetflow starting");

    match args.task {
        TaskCommand::Build => {
            run_once(TaskPlan::build(&project, &fs)?, &project, fs).await?;
        }
        TaskCommand::Clean => {
            run_once(TaskPlan::clean(&project)?, &project, fs).await?;
        }
        TaskCommand::Svg => {
            run_once(TaskPlan::svg(&project)?, &project, fs).await?;
        }
        TaskCommand::Default => {
            run_once(TaskPlan::build(&project, &fs)?, &project, Arc::clone(&fs)).await?;
            serve_and_watch(project, fs).await?;
        }
    }

    Ok(())
}

/// Run every task of `plan` once, starting from its roots, and wait until
/// the scheduler is idle.
///
/// Any failed task (including dependents blocked by a failure) turns into
/// [`AssetflowError::BuildFailed`].
pub async fn run_once(
    plan: TaskPlan,
    project: &Project,
    fs: Arc<dyn FileSystem>,
) -> Result<RunReport> {
    let plan = Arc::new(plan);
    let ctx = Arc::new(TaskContext::new(fs, project.root.clone()));

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = PipelineExecutor::new(Arc::clone(&plan), ctx, rt_tx.clone());

    let roots = plan.roots();
    info!(?roots, "seeding run from plan roots");
    for task in roots {
        rt_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::Manual,
            })
            .await
            .map_err(Error::from)?;
    }
    drop(rt_tx);

    let watch = &project.config.watch;
    let core = CoreRuntime::new(
        Scheduler::from_plan(&plan),
        watch.triggered_while_running_behaviour,
        watch.queue_length,
        RuntimeOptions {
            exit_when_idle: true,
            reload_on_success: false,
        },
    );

    let report = Runtime::new(core, rt_rx, executor).run().await?;
    ensure_success(report)
}

/// Serve the output root and re-run category tasks on change until Ctrl-C.
///
/// Each successful task run reloads connected browsers; a failed one only
/// logs its error and the loop keeps going.
pub async fn serve_and_watch(project: Arc<Project>, fs: Arc<dyn FileSystem>) -> Result<()> {
    let output_dir = project.root.join(project.config.paths.output_root());
    let server = Arc::new(
        DevServer::start(output_dir, ServerOptions::from(&project.config.server)).await?,
    );

    let plan = Arc::new(TaskPlan::watch(&project, &fs)?);
    let ctx = Arc::new(TaskContext::new(Arc::clone(&fs), project.root.clone()));
    let watch = &project.config.watch;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = PipelineExecutor::new(Arc::clone(&plan), ctx, rt_tx.clone());

    let bindings = bindings_from_paths(&project.config.paths, watch.use_hash)?;
    let _watcher = spawn_watcher(project.root.clone(), bindings, fs, rt_tx.clone())?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(
        Scheduler::from_plan(&plan),
        watch.triggered_while_running_behaviour,
        watch.queue_length,
        RuntimeOptions {
            exit_when_idle: false,
            reload_on_success: true,
        },
    );

    info!("watching for changes; press Ctrl-C to stop");
    let report = Runtime::new(core, rt_rx, executor)
        .with_reloader(server.clone())
        .run()
        .await?;
    debug!(?report, "watch loop finished");

    if let Ok(server) = Arc::try_unwrap(server) {
        server.shutdown();
    }
    Ok(())
}

fn ensure_success(report: RunReport) -> Result<RunReport> {
    if report.is_success() {
        Ok(report)
    } else {
        Err(AssetflowError::BuildFailed(report.failed))
    }
}

/// Print the plan for `task` without running anything.
fn print_dry_run(project: &Project, fs: &Arc<dyn FileSystem>, task: TaskCommand) -> Result<()> {
    println!("assetflow dry-run: {}", task.as_str());
    println!("  root = {}", project.root.display());
    println!("  source = {}", project.config.paths.source_root().display());
    println!("  output = {}", project.config.paths.output_root().display());
    println!();

    let plan = match task {
        TaskCommand::Default | TaskCommand::Build => TaskPlan::build(project, fs)?,
        TaskCommand::Clean => TaskPlan::clean(project)?,
        TaskCommand::Svg => TaskPlan::svg(project)?,
    };
    print_plan(&plan);

    if task == TaskCommand::Default {
        println!();
        println!("watch bindings:");
        for entry in project.config.paths.entries() {
            println!("  - {}: {:?}", entry.category, entry.watch);
        }
        let server = &project.config.server;
        println!();
        println!("server: http://{}:{}", server.host, server.port);
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn print_plan(plan: &TaskPlan) {
    println!("tasks ({}):", plan.len());
    for task in plan.tasks() {
        println!("  - {}", task.name);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        match &task.action {
            TaskAction::Clean { target } => println!("      removes: {}", target.display()),
            TaskAction::Pipeline(pipeline) => {
                let steps: Vec<String> = pipeline.steps.iter().map(|s| s.label()).collect();
                println!("      steps: {}", steps.join(" -> "));
            }
        }
    }
}
