// src/logging.rs

//! `tracing` subscriber setup.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (applies to assetflow only; dependencies stay at `warn`),
//! 2. `ASSETFLOW_LOG`, which takes full `EnvFilter` directives such as
//!    `assetflow=debug,tower_http=trace`, or a bare level,
//! 3. `info` for assetflow.
//!
//! Output goes to stderr so `--dry-run` can print the plan on stdout.

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "ASSETFLOW_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => crate_filter(level_filter(level)),
        None => match std::env::var(LOG_ENV_VAR) {
            Ok(spec) if !spec.trim().is_empty() => env_filter(&spec)?,
            _ => crate_filter(LevelFilter::INFO),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn crate_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(format!("assetflow={level}"))
}

// A bare level ("debug") only raises assetflow itself; anything else is
// taken as a directive list.
fn env_filter(spec: &str) -> Result<EnvFilter> {
    if let Some(level) = parse_level_str(spec) {
        return Ok(crate_filter(level));
    }
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse(spec)
        .map_err(|e| anyhow!("invalid {LOG_ENV_VAR} value {spec:?}: {e}"))
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<LevelFilter> {
    match s.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}
