// src/transform/concat.rs

use std::path::PathBuf;

use crate::pipeline::Asset;
use crate::transform::{Transform, TransformFuture};

/// Concatenate every asset of the batch into a single file.
///
/// Input order is preserved (selection yields files sorted by path). An empty
/// batch stays empty so no bundle is written.
#[derive(Debug, Clone)]
pub struct Concat {
    file_name: PathBuf,
    separator: String,
}

impl Concat {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            separator: "\n".to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl Transform for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        Box::pin(async move {
            let Some(first) = assets.first() else {
                return Ok(Vec::new());
            };
            let source = first.source.clone();

            let mut contents = Vec::new();
            for (i, asset) in assets.iter().enumerate() {
                if i > 0 {
                    contents.extend_from_slice(self.separator.as_bytes());
                }
                contents.extend_from_slice(&asset.contents);
            }

            Ok(vec![Asset::new(source, self.file_name.clone(), contents)])
        })
    }
}
