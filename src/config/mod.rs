// src/config/mod.rs

//! Configuration loading and validation for assetflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Define the path table and its defaults (`paths.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate roots, globs and section values (`validate.rs`).

pub mod loader;
pub mod model;
pub mod paths;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_project, Project, DEFAULT_CONFIG_FILE};
pub use model::{
    CategoryOverride, ConfigFile, FontTarget, FontsSection, ImagesSection, PathsSection,
    RawConfigFile, ScriptsSection, ServerSection, SpriteSection, StylesSection, WatchSection,
};
pub use paths::{PathEntry, PathTable};
pub use validate::validate_path_table;
