// src/pipeline/select.rs

//! Source selection: include globs, then exclude globs, then mapping of each
//! selected file to its path under the glob base.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::errors::AssetflowError;
use crate::fs::FileSystem;

/// Compile a single glob. `*` never crosses a `/`; only `**` does.
pub fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat)?);
    }
    Ok(builder.build()?)
}

/// Returns true if the pattern contains glob syntax.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// The leading directory of a pattern that contains no glob syntax.
///
/// `src/img/**/*.png` -> `src/img`, `src/_scss/style.scss` -> `src/_scss`,
/// `*.html` -> `` (project root).
pub fn glob_base(pattern: &str) -> String {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal_prefix: Vec<&str> = if is_glob(pattern) {
        parts.iter().take_while(|p| !is_glob(p)).copied().collect()
    } else {
        // A literal path: the base is its parent directory.
        parts[..parts.len().saturating_sub(1)].to_vec()
    };
    literal_prefix.join("/")
}

#[derive(Debug, Clone)]
struct IncludePattern {
    raw: String,
    base: String,
    matcher: GlobMatcher,
    literal: bool,
}

/// A file picked by a [`SourceSelection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Full path (project root joined with the relative path).
    pub path: PathBuf,
    /// Path relative to the glob base of the include pattern that matched.
    pub relative: PathBuf,
}

/// Compiled include/exclude patterns for one task.
#[derive(Debug, Clone)]
pub struct SourceSelection {
    includes: Vec<IncludePattern>,
    exclude: Option<GlobSet>,
}

impl SourceSelection {
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self> {
        let includes = includes
            .iter()
            .map(|raw| {
                Ok(IncludePattern {
                    raw: raw.clone(),
                    base: glob_base(raw),
                    matcher: compile_glob(raw)?.compile_matcher(),
                    literal: !is_glob(raw),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let exclude = if excludes.is_empty() {
            None
        } else {
            Some(build_globset(excludes).context("building exclude globset")?)
        };

        Ok(Self { includes, exclude })
    }

    /// Inclusion first, then exclusion: an excluded path never matches.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.includes.iter().any(|i| i.matcher.is_match(rel_path)) {
            return false;
        }
        !self.is_excluded(rel_path)
    }

    fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }

    /// Expand the selection against `root`.
    ///
    /// - A literal include that does not exist is a [`AssetflowError::SourceNotFound`].
    /// - A glob whose base directory is missing, or which matches nothing,
    ///   contributes no files.
    ///
    /// The result is sorted by project-relative path and de-duplicated; when
    /// several includes match the same file the first one decides its base.
    pub fn select(
        &self,
        fs: &dyn FileSystem,
        root: &Path,
    ) -> crate::errors::Result<Vec<SelectedFile>> {
        let mut selected: BTreeMap<String, SelectedFile> = BTreeMap::new();

        for include in &self.includes {
            if include.literal {
                let path = root.join(&include.raw);
                if !fs.is_file(&path) {
                    return Err(AssetflowError::SourceNotFound(path));
                }
                if self.is_excluded(&include.raw) {
                    debug!(file = %include.raw, "literal source excluded");
                    continue;
                }
                let relative = strip_base(&include.raw, &include.base);
                selected
                    .entry(include.raw.clone())
                    .or_insert(SelectedFile { path, relative });
                continue;
            }

            let base_dir = root.join(&include.base);
            if !fs.is_dir(&base_dir) {
                warn!(
                    pattern = %include.raw,
                    base = ?base_dir,
                    "glob base directory does not exist; selecting nothing"
                );
                continue;
            }

            for path in walk_files(fs, &base_dir)? {
                let Ok(rel) = path.strip_prefix(root) else {
                    continue;
                };
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                if !include.matcher.is_match(&rel_str) || self.is_excluded(&rel_str) {
                    continue;
                }
                let relative = strip_base(&rel_str, &include.base);
                selected
                    .entry(rel_str)
                    .or_insert(SelectedFile { path, relative });
            }
        }

        if selected.is_empty() {
            let patterns: Vec<&str> = self.includes.iter().map(|i| i.raw.as_str()).collect();
            warn!(?patterns, "source selection matched no files");
        }

        Ok(selected.into_values().collect())
    }
}

fn strip_base(rel: &str, base: &str) -> PathBuf {
    if base.is_empty() {
        return PathBuf::from(rel);
    }
    let stripped = rel
        .strip_prefix(base)
        .map(|r| r.trim_start_matches('/'))
        .unwrap_or(rel);
    PathBuf::from(stripped)
}

/// Collect every file below `dir`.
pub fn walk_files(fs: &dyn FileSystem, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}
