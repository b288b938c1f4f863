// src/transform/command.rs

//! External program stages.
//!
//! The program is run through the platform shell with the asset on stdin and
//! is expected to print the transformed asset on stdout. `ASSETFLOW_FILE` and
//! `ASSETFLOW_FILE_DIR` point at the asset's source so tools that resolve
//! imports (e.g. a Sass compiler) can find siblings.

use std::path::Path;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::pipeline::Asset;
use crate::transform::{Transform, TransformFuture};

/// Pipe every asset through `cmd`, one at a time.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    name: String,
    cmd: String,
}

impl CommandTransform {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
        }
    }
}

impl Transform for CommandTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(assets.len());
            for asset in assets {
                let transformed = run_filter(&self.cmd, asset.contents.clone(), &asset.source)
                    .await
                    .with_context(|| format!("processing {:?}", asset.source))?;
                out.push(asset.with_contents(transformed));
            }
            Ok(out)
        })
    }
}

// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` with `input` on stdin and return its stdout.
///
/// A non-zero exit status is an error carrying the program's stderr.
pub async fn run_filter(cmd: &str, input: Vec<u8>, source: &Path) -> Result<Vec<u8>> {
    let source_dir = source.parent().unwrap_or_else(|| Path::new("."));

    let mut command = shell_command(cmd);
    command
        .env("ASSETFLOW_FILE", source)
        .env("ASSETFLOW_FILE_DIR", source_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(cmd = %cmd, source = ?source, "spawning filter process");

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning `{cmd}`"))?;

    let mut stdin = child.stdin.take().context("filter stdin was not captured")?;

    // Feed stdin concurrently so large inputs cannot deadlock against a full
    // stdout pipe.
    let writer = tokio::spawn(async move {
        let res = stdin.write_all(&input).await;
        drop(stdin);
        res
    });

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("waiting for `{cmd}`"))?;

    let write_res = writer.await.context("stdin writer panicked")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        bail!("`{cmd}` exited with status {code}: {}", stderr.trim());
    }

    if let Err(e) = write_res {
        // The program succeeded without consuming all of its input.
        debug!(cmd = %cmd, error = %e, "filter closed stdin early");
    }

    Ok(output.stdout)
}
