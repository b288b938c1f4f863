// src/watch/patterns.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::config::PathTable;
use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::pipeline::select::{build_globset, glob_base, walk_files};

/// Compiled watch globs for one category task.
///
/// Patterns are relative to the project root; the watcher passes
/// `/`-separated relative paths (e.g. `"src/_scss/_vars.scss"`) into
/// [`WatchBinding::matches`].
#[derive(Clone)]
pub struct WatchBinding {
    task: TaskName,
    /// Directories below which the watch globs can match.
    bases: BTreeSet<String>,
    watch_set: GlobSet,
    exclude_set: GlobSet,
    use_hash: bool,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("task", &self.task)
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(
        task: impl Into<TaskName>,
        watch: &[String],
        exclude: &[String],
        use_hash: bool,
    ) -> Result<Self> {
        let task = task.into();
        let watch_set = build_globset(watch)
            .with_context(|| format!("building watch globset for task {task}"))?;
        let exclude_set = build_globset(exclude)
            .with_context(|| format!("building exclude globset for task {task}"))?;

        Ok(Self {
            task,
            bases: watch.iter().map(|w| glob_base(w)).collect(),
            watch_set,
            exclude_set,
            use_hash,
        })
    }

    /// Task re-run when this binding matches.
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Whether a change to `rel_path` (relative to the project root) should
    /// trigger this binding's task.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.watch_set.is_match(rel_path) && !self.exclude_set.is_match(rel_path)
    }
}

/// One binding per category of the path table, named after the category.
///
/// Source exclusions do not apply: a changed partial (`src/_header.html`)
/// must still re-run the pages that include it. Only the output root is
/// excluded, so writes by the pipeline never re-trigger a task.
pub fn bindings_from_paths(paths: &PathTable, use_hash: bool) -> Result<Vec<WatchBinding>> {
    let output_glob = format!(
        "{}/**",
        paths.output_root().to_string_lossy().replace('\\', "/")
    );

    paths
        .entries()
        .map(|entry| {
            WatchBinding::new(
                entry.category.as_str(),
                &entry.watch,
                std::slice::from_ref(&output_glob),
                use_hash,
            )
        })
        .collect()
}

/// Every file under `root` the binding matches, sorted by path.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    binding: &WatchBinding,
) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for base in &binding.bases {
        let dir = root.join(base);
        if !fs.is_dir(&dir) {
            continue;
        }
        for path in walk_files(fs, &dir)? {
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            if binding.matches(&rel.to_string_lossy().replace('\\', "/")) {
                files.insert(path);
            }
        }
    }

    Ok(files.into_iter().collect())
}
