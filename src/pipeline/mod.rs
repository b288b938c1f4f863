// src/pipeline/mod.rs

//! Explicit, ordered file pipelines.
//!
//! A [`Pipeline`] selects source files, loads them into memory as
//! [`Asset`]s and applies its [`Step`]s strictly in declared order. A write
//! step persists the current batch; later steps keep working on the same
//! in-memory batch, which is how a task writes an unminified artifact and
//! then its minified twin.

pub mod asset;
pub mod select;
pub mod step;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{AssetflowError, Result};
use crate::fs::FileSystem;

pub use asset::Asset;
pub use select::{SelectedFile, SourceSelection};
pub use step::{Rename, Step};

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub selection: SourceSelection,
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(selection: SourceSelection, steps: Vec<Step>) -> Self {
        Self { selection, steps }
    }

    /// Run the pipeline for `task`. Returns every path written, in order.
    ///
    /// The first failing step aborts the pipeline; files written by earlier
    /// write steps stay in place.
    pub async fn run(
        &self,
        task: &str,
        fs: Arc<dyn FileSystem>,
        root: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut batch = load_sources(&self.selection, Arc::clone(&fs), root).await?;
        debug!(task, files = batch.len(), "loaded pipeline sources");

        let mut written = Vec::new();

        for step in &self.steps {
            match step {
                Step::Transform(transform) => {
                    batch = transform.apply(batch).await.map_err(|e| {
                        AssetflowError::Transform {
                            task: task.to_string(),
                            stage: transform.name().to_string(),
                            message: format!("{e:#}"),
                        }
                    })?;
                }
                Step::Rename(Rename::Extension(ext)) => {
                    batch.iter_mut().for_each(|a| a.set_extension(ext));
                }
                Step::Rename(Rename::Marker(marker)) => {
                    batch.iter_mut().for_each(|a| a.insert_marker(marker));
                }
                Step::Write(dir) => {
                    let mut paths =
                        write_batch(&batch, Arc::clone(&fs), root.join(dir)).await?;
                    info!(task, dir = %dir.display(), files = paths.len(), "wrote assets");
                    written.append(&mut paths);
                }
            }
        }

        Ok(written)
    }
}

async fn load_sources(
    selection: &SourceSelection,
    fs: Arc<dyn FileSystem>,
    root: &Path,
) -> Result<Vec<Asset>> {
    let selection = selection.clone();
    let root = root.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<Vec<Asset>> {
        let files = selection.select(fs.as_ref(), &root)?;
        files
            .into_iter()
            .map(|f| -> Result<Asset> {
                let contents = fs.read(&f.path)?;
                Ok(Asset::new(f.path, f.relative, contents))
            })
            .collect()
    })
    .await
    .map_err(anyhow::Error::from)?
}

async fn write_batch(
    batch: &[Asset],
    fs: Arc<dyn FileSystem>,
    dest: PathBuf,
) -> Result<Vec<PathBuf>> {
    let batch = batch.to_vec();

    tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(batch.len());
        for asset in batch {
            let path = dest.join(&asset.relative);
            fs.write(&path, &asset.contents)?;
            written.push(path);
        }
        Ok(written)
    })
    .await
    .map_err(anyhow::Error::from)?
}
