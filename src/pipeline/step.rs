// src/pipeline/step.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::transform::Transform;

/// How a rename step changes each asset's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rename {
    /// Replace the final extension.
    Extension(String),
    /// Insert a marker before the final extension, e.g. `min`.
    Marker(String),
}

/// One entry in a pipeline's ordered step list.
#[derive(Clone)]
pub enum Step {
    /// Replace the batch with the transform's output.
    Transform(Arc<dyn Transform>),
    Rename(Rename),
    /// Write every asset to `<dir>/<asset.relative>` (dir is project-relative).
    Write(PathBuf),
}

impl Step {
    pub fn transform(t: impl Transform + 'static) -> Self {
        Step::Transform(Arc::new(t))
    }

    pub fn write(dir: impl Into<PathBuf>) -> Self {
        Step::Write(dir.into())
    }

    /// Short label used in logs and errors.
    pub fn label(&self) -> String {
        match self {
            Step::Transform(t) => t.name().to_string(),
            Step::Rename(Rename::Extension(ext)) => format!("rename(.{ext})"),
            Step::Rename(Rename::Marker(m)) => format!("rename(.{m})"),
            Step::Write(dir) => format!("write({})", dir.display()),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
