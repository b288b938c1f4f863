// src/pipeline/asset.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// One file flowing through a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Where the contents originally came from (full path). For assets
    /// produced by merging several files this is the first contributor.
    pub source: PathBuf,
    /// Path below the destination directory of a write step.
    pub relative: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(
        source: impl Into<PathBuf>,
        relative: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            source: source.into(),
            relative: relative.into(),
            contents: contents.into(),
        }
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.contents)
            .with_context(|| format!("{:?} is not valid UTF-8", self.source))
    }

    pub fn extension(&self) -> Option<String> {
        self.relative
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Same asset with new contents.
    pub fn with_contents(self, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            ..self
        }
    }

    /// Replace the final extension (`style.scss` -> `style.css`).
    pub fn set_extension(&mut self, ext: &str) {
        self.relative.set_extension(ext.trim_start_matches('.'));
    }

    /// Insert a marker before the final extension
    /// (`style.css` + `min` -> `style.min.css`).
    pub fn insert_marker(&mut self, marker: &str) {
        let marker = marker.trim_matches('.');
        let stem = self
            .relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match self.relative.extension() {
            Some(ext) => format!("{stem}.{marker}.{}", ext.to_string_lossy()),
            None => format!("{stem}.{marker}"),
        };
        self.relative.set_file_name(name);
    }

    /// Directory the source lives in.
    pub fn source_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new("."))
    }
}
