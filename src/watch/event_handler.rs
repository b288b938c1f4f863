// src/watch/event_handler.rs

//! Turns one changed path into task triggers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::hash::{compute_aggregate_hash, compute_file_hash, HashStore};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{collect_matching_files, WatchBinding};

pub type SharedHashStore = Arc<Mutex<Box<dyn HashStore>>>;

/// Trigger every binding that matches `path`.
///
/// Returns `false` once the runtime channel is closed, so the caller can
/// stop watching.
pub async fn process_file_change(
    fs: Arc<dyn FileSystem>,
    root: &Path,
    path: &Path,
    bindings: &[WatchBinding],
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    hash_store: SharedHashStore,
) -> bool {
    let Some(rel_str) = relative_str(root, path) else {
        debug!(?path, ?root, "changed path is outside the project root; ignoring");
        return true;
    };

    let matching: Vec<&WatchBinding> = bindings.iter().filter(|b| b.matches(&rel_str)).collect();
    if matching.is_empty() {
        return true;
    }

    for binding in matching {
        if !should_trigger(
            Arc::clone(&fs),
            root,
            &rel_str,
            binding,
            Arc::clone(&hash_store),
        )
        .await
        {
            continue;
        }

        debug!(task = %binding.task(), path = %rel_str, "watch match -> triggering task");
        if let Err(err) = runtime_tx
            .send(RuntimeEvent::TaskTriggered {
                task: binding.task().to_string(),
                reason: TriggerReason::FileWatch,
            })
            .await
        {
            warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
            return false;
        }
    }

    true
}

/// Aggregate hash of every file the binding currently matches.
pub fn binding_hash(fs: &dyn FileSystem, root: &Path, binding: &WatchBinding) -> Result<String> {
    let files = collect_matching_files(fs, root, binding)?;
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let rel = relative_str(root, &file).unwrap_or_else(|| file.to_string_lossy().into_owned());
        entries.push((rel, compute_file_hash(fs, &file)?));
    }
    Ok(compute_aggregate_hash(&entries))
}

/// Record the current hash of every hashed binding, so the first no-op
/// save after startup is already suppressed.
pub async fn prime_hashes(
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    bindings: Arc<Vec<WatchBinding>>,
    hash_store: SharedHashStore,
) {
    let res = tokio::task::spawn_blocking(move || {
        for binding in bindings.iter().filter(|b| b.use_hash()) {
            match binding_hash(fs.as_ref(), &root, binding) {
                Ok(hash) => {
                    if let Ok(mut store) = hash_store.lock() {
                        store.save(binding.task(), &hash);
                    }
                }
                Err(err) => {
                    warn!(task = %binding.task(), error = %err, "failed to prime watch hash");
                }
            }
        }
    })
    .await;

    if let Err(e) = res {
        warn!(error = %e, "hash priming panicked");
    }
}

/// With `use_hash`, only trigger when the aggregated content changed.
/// Any hashing problem errs on the side of triggering.
async fn should_trigger(
    fs: Arc<dyn FileSystem>,
    root: &Path,
    rel_path: &str,
    binding: &WatchBinding,
    hash_store: SharedHashStore,
) -> bool {
    if !binding.use_hash() {
        return true;
    }

    let root = root.to_path_buf();
    let binding = binding.clone();
    let rel_path = rel_path.to_string();

    tokio::task::spawn_blocking(move || {
        let task = binding.task();
        let new_hash = match binding_hash(fs.as_ref(), &root, &binding) {
            Ok(h) => h,
            Err(err) => {
                warn!(task = %task, error = %err, "failed to hash watched files; triggering anyway");
                return true;
            }
        };

        let Ok(mut store) = hash_store.lock() else {
            warn!(task = %task, "hash store mutex poisoned; triggering anyway");
            return true;
        };

        if store.load(task).as_deref() == Some(new_hash.as_str()) {
            info!(task = %task, path = %rel_path, "watched content unchanged; skipping trigger");
            return false;
        }

        store.save(task, &new_hash);
        true
    })
    .await
    .unwrap_or(true)
}
