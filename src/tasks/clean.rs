// src/tasks/clean.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Recursively remove `dir`.
///
/// Returns `false` when there was nothing to remove. The parent of `dir` is
/// never touched.
pub async fn remove_output_dir(fs: Arc<dyn FileSystem>, dir: PathBuf) -> Result<bool> {
    let removed = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        if !fs.exists(&dir) {
            debug!(dir = ?dir, "output directory does not exist; nothing to clean");
            return Ok(false);
        }
        fs.remove_dir_all(&dir)
            .with_context(|| format!("removing output directory {:?}", dir))?;
        info!(dir = ?dir, "removed output directory");
        Ok(true)
    })
    .await
    .context("clean worker panicked")??;

    Ok(removed)
}
