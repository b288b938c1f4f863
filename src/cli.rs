// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Build front-end assets and serve them with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run.
    #[arg(value_enum, default_value_t = TaskCommand::Default)]
    pub task: TaskCommand,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetflow.toml` in the current directory if it exists,
    /// built-in defaults otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print the task plan without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Named tasks that can be invoked from the command line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum TaskCommand {
    /// Build everything, then serve and watch.
    #[default]
    Default,
    /// Clean, then run every category task in parallel.
    Build,
    /// Remove the output directory.
    Clean,
    /// Assemble the SVG icon sprite.
    Svg,
}

impl TaskCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskCommand::Default => "default",
            TaskCommand::Build => "build",
            TaskCommand::Clean => "clean",
            TaskCommand::Svg => "svg",
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
