// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::watch::event_handler::{prime_hashes, process_file_change, SharedHashStore};
use crate::watch::hash::{HashStore, MemoryHashStore};
use crate::watch::patterns::WatchBinding;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops
/// file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and send `RuntimeEvent::TaskTriggered` for
/// every binding matching a changed path.
///
/// Access events (reads) are ignored; creations, modifications, renames and
/// removals all count as changes.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    let bindings = Arc::new(bindings);

    // Bridge from notify's callback thread into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watch loop gone; dropping notify event");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(root = ?root, bindings = bindings.len(), "file watcher started");

    let hash_store: SharedHashStore =
        Arc::new(Mutex::new(Box::new(MemoryHashStore::new()) as Box<dyn HashStore>));

    tokio::spawn(async move {
        if bindings.iter().any(|b| b.use_hash()) {
            prime_hashes(
                Arc::clone(&fs),
                root.clone(),
                Arc::clone(&bindings),
                Arc::clone(&hash_store),
            )
            .await;
        }

        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in &event.paths {
                let keep_going = process_file_change(
                    Arc::clone(&fs),
                    &root,
                    path,
                    &bindings,
                    &runtime_tx,
                    Arc::clone(&hash_store),
                )
                .await;
                if !keep_going {
                    debug!("runtime closed; stopping watch loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
