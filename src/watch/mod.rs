// src/watch/mod.rs

//! File watching and change detection.
//!
//! Compiles one [`WatchBinding`] per category from the path table, runs a
//! `notify` watcher over the project root and turns relevant changes into
//! task triggers for the engine. With `watch.use_hash`, a change whose
//! category content hash is unchanged is dropped.
//!
//! This module knows nothing about task dependencies; it only maps paths to
//! task names.

pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{binding_hash, process_file_change, SharedHashStore};
pub use hash::{compute_aggregate_hash, compute_file_hash, HashStore, MemoryHashStore};
pub use patterns::{bindings_from_paths, collect_matching_files, WatchBinding};
pub use watcher::{spawn_watcher, WatcherHandle};
