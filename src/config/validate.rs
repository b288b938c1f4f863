// src/config/validate.rs

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use lightningcss::targets::Browsers;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::paths::{normalize_dir, PathEntry, PathTable};
use crate::errors::{AssetflowError, Result};
use crate::pipeline::select::compile_glob;
use crate::types::Category;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let paths = build_path_table(&raw)?;
        validate_path_table(&paths)?;
        validate_sections(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, paths))
    }
}

/// Validate an already-built path table.
///
/// Exposed separately so callers assembling a table by hand get the same
/// checks as a loaded config.
pub fn validate_path_table(paths: &PathTable) -> Result<()> {
    validate_output_root(paths)?;
    for entry in paths.entries() {
        validate_entry(paths, entry)?;
    }
    Ok(())
}

fn config_err(msg: impl Into<String>) -> AssetflowError {
    AssetflowError::ConfigError(msg.into())
}

fn build_path_table(raw: &RawConfigFile) -> Result<PathTable> {
    if raw.paths.source.trim().is_empty() {
        return Err(config_err("[paths].source must not be empty"));
    }
    if raw.paths.output.trim().is_empty() {
        return Err(config_err("[paths].output must not be empty"));
    }

    let mut table = PathTable::with_roots(raw.paths.source.trim(), raw.paths.output.trim());

    for (name, ov) in raw.category.iter() {
        let category = Category::from_str(name).map_err(config_err)?;
        let mut entry = table.entry(category)?.clone();

        if let Some(src) = &ov.src {
            entry.sources = src.clone();
        }
        if let Some(exclude) = &ov.exclude {
            entry.excludes = exclude.clone();
        }
        if let Some(watch) = &ov.watch {
            entry.watch = watch.clone();
        }
        if let Some(dest) = &ov.dest {
            entry.output = normalize_dir(dest.trim()).into();
        }

        table.set_entry(entry);
    }

    Ok(table)
}

fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn validate_output_root(paths: &PathTable) -> Result<()> {
    let output = without_cur_dir(paths.output_root());
    let source = without_cur_dir(paths.source_root());

    if !is_plain_relative(&output) || output.as_os_str().is_empty() {
        return Err(config_err(format!(
            "output root {:?} must be a subdirectory of the project root",
            paths.output_root()
        )));
    }

    if source.starts_with(&output) {
        return Err(config_err(format!(
            "output root {:?} contains the source root {:?}; cleaning it would delete sources",
            paths.output_root(),
            paths.source_root()
        )));
    }

    if output.starts_with(&source) {
        return Err(config_err(format!(
            "output root {:?} lies inside the source root {:?}",
            paths.output_root(),
            paths.source_root()
        )));
    }

    Ok(())
}

fn validate_entry(paths: &PathTable, entry: &PathEntry) -> Result<()> {
    let category = entry.category;

    if entry.sources.is_empty() {
        return Err(config_err(format!(
            "category '{category}' has no source pattern"
        )));
    }

    let output = without_cur_dir(&entry.output);
    if !is_plain_relative(&output) || !output.starts_with(without_cur_dir(paths.output_root())) {
        return Err(config_err(format!(
            "output directory {:?} of category '{category}' is not inside the output root {:?}",
            entry.output,
            paths.output_root()
        )));
    }

    for pattern in entry
        .sources
        .iter()
        .chain(entry.excludes.iter())
        .chain(entry.watch.iter())
    {
        compile_glob(pattern)
            .map_err(|e| config_err(format!("category '{category}': {e:#}")))?;
    }

    Ok(())
}

fn validate_sections(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.queue_length == 0 {
        return Err(config_err("[watch].queue_length must be >= 1 (got 0)"));
    }

    if cfg.images.optimization_level > 6 {
        return Err(config_err(format!(
            "[images].optimization_level must be between 0 and 6 (got {})",
            cfg.images.optimization_level
        )));
    }

    if !(1..=100).contains(&cfg.images.jpeg_quality) {
        return Err(config_err(format!(
            "[images].jpeg_quality must be between 1 and 100 (got {})",
            cfg.images.jpeg_quality
        )));
    }

    if cfg.styles.compiler.trim().is_empty() {
        return Err(config_err("[styles].compiler must not be empty"));
    }

    Browsers::from_browserslist(cfg.styles.browsers.iter())
        .map_err(|e| config_err(format!("[styles].browsers: {e}")))?;

    if cfg.scripts.minifier.trim().is_empty() {
        return Err(config_err("[scripts].minifier must not be empty"));
    }

    let bundle = Path::new(&cfg.scripts.bundle);
    if bundle.extension().is_none() || bundle.components().count() != 1 {
        return Err(config_err(format!(
            "[scripts].bundle must be a plain file name with an extension (got {:?})",
            cfg.scripts.bundle
        )));
    }

    for target in cfg.fonts.targets.iter() {
        if target.extension.trim_start_matches('.').is_empty() {
            return Err(config_err("[[fonts.targets]] extension must not be empty"));
        }
        if target.cmd.trim().is_empty() {
            return Err(config_err(format!(
                "[[fonts.targets]] '{}' has an empty cmd",
                target.extension
            )));
        }
    }

    compile_glob(&cfg.sprite.src).map_err(|e| config_err(format!("[sprite].src: {e:#}")))?;
    if !cfg.sprite.dest.ends_with(".svg") {
        return Err(config_err(format!(
            "[sprite].dest must be an .svg file (got {:?})",
            cfg.sprite.dest
        )));
    }

    Ok(())
}
