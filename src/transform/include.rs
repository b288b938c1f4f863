// src/transform/include.rs

//! Markup partials.
//!
//! `@@include('path')` is replaced with the contents of `path`, resolved
//! relative to the file containing the directive. An optional JSON object
//! argument, `@@include('_card.html', {"title": "Hi"})`, supplies variables
//! that the partial references as `@@title`. Partials may include further
//! partials; variables from outer includes are visible to inner ones.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use serde_json::{Map, Value};

use crate::fs::FileSystem;
use crate::pipeline::Asset;
use crate::transform::{Transform, TransformFuture};

/// Nesting limit; deeper chains are reported as include cycles.
pub const MAX_INCLUDE_DEPTH: usize = 16;

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@@include\(\s*['"]([^'"]+)['"]\s*(?:,\s*(\{[\s\S]*?\})\s*)?\)"#)
        .expect("include directive regex is valid")
});

pub struct IncludePartials {
    fs: Arc<dyn FileSystem>,
    max_depth: usize,
}

impl IncludePartials {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn resolve(
        &self,
        text: &str,
        dir: &Path,
        vars: &Map<String, Value>,
        depth: usize,
    ) -> Result<String> {
        if !INCLUDE_RE.is_match(text) {
            return Ok(text.to_string());
        }
        if depth >= self.max_depth {
            bail!(
                "includes nested deeper than {} levels (is there a cycle?)",
                self.max_depth
            );
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in INCLUDE_RE.captures_iter(text) {
            let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            last = whole.end();

            let path: PathBuf = dir.join(target.as_str());

            let mut scope = vars.clone();
            if let Some(args) = caps.get(2) {
                let parsed: Map<String, Value> = serde_json::from_str(args.as_str())
                    .with_context(|| format!("invalid include arguments for {:?}", path))?;
                scope.extend(parsed);
            }

            let bytes = self
                .fs
                .read(&path)
                .with_context(|| format!("reading partial {:?}", path))?;
            let partial = String::from_utf8(bytes)
                .map_err(|_| anyhow!("partial {:?} is not valid UTF-8", path))?;

            let partial = substitute_vars(&partial, &scope);
            let partial_dir = path.parent().unwrap_or(dir);
            out.push_str(&self.resolve(&partial, partial_dir, &scope, depth + 1)?);
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}

/// Replace `@@name` with the variable's value. Longer names are substituted
/// first so `@@title` never clobbers `@@titleSuffix`.
pub fn substitute_vars(text: &str, vars: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = vars.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut out = text.to_string();
    for key in keys {
        let value = match &vars[key.as_str()] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        out = out.replace(&format!("@@{key}"), &value);
    }
    out
}

impl Transform for IncludePartials {
    fn name(&self) -> &str {
        "include"
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        Box::pin(async move {
            assets
                .into_iter()
                .map(|asset| -> Result<Asset> {
                    let resolved = self
                        .resolve(asset.text()?, asset.source_dir(), &Map::new(), 0)
                        .with_context(|| format!("resolving includes in {:?}", asset.source))?;
                    Ok(asset.with_contents(resolved))
                })
                .collect::<Result<Vec<_>>>()
        })
    }
}
