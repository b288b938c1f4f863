// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Name of the optional project config file.
pub const DEFAULT_CONFIG_FILE: &str = "Assetflow.toml";

/// A loaded project: the validated configuration plus the directory all
/// relative paths in it are resolved against.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ConfigFile,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: ConfigFile) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }
}

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the project for a CLI invocation.
///
/// - An explicit `--config` path must exist; its parent directory becomes the
///   project root.
/// - Otherwise `Assetflow.toml` in the current directory is used if present,
///   and built-in defaults if not. The project root is the current directory.
pub fn load_project(explicit: Option<&Path>) -> Result<Project> {
    if let Some(path) = explicit {
        let config = load_and_validate(path)?;
        let root = config_root_dir(path);
        info!(config = ?path, root = ?root, "loaded project config");
        return Ok(Project::new(root, config));
    }

    let cwd = std::env::current_dir()?;
    let default_path = cwd.join(DEFAULT_CONFIG_FILE);

    let config = if default_path.is_file() {
        info!(config = ?default_path, "loaded project config");
        load_and_validate(&default_path)?
    } else {
        debug!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
        ConfigFile::try_from(RawConfigFile::default())?
    };

    Ok(Project::new(cwd, config))
}

/// Figure out a sensible project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetflow.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetflow.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
