// src/config/paths.rs

//! The path table: which files belong to which asset category and where
//! each category's output lands.
//!
//! All patterns and directories are relative to the project root and use
//! `/` as separator. The defaults reproduce the conventional layout:
//!
//! ```text
//! src/*.html                 -> public/
//! src/_scss/style.scss       -> public/css/
//! src/scripts/**/*.js        -> public/scripts/
//! src/img/**/*.{jpg,...}     -> public/img/
//! src/fonts/**/*.{woff,...}  -> public/fonts/
//! src/libs/**/*              -> public/libs/
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{AssetflowError, Result};
use crate::types::Category;

/// One row of the path table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub category: Category,
    /// Inclusion globs. A file is selected if any of them match.
    pub sources: Vec<String>,
    /// Exclusion globs, evaluated after inclusion.
    pub excludes: Vec<String>,
    /// Globs whose changes re-run this category's task.
    pub watch: Vec<String>,
    /// Output directory, relative to the project root.
    pub output: PathBuf,
}

/// Immutable mapping from category to [`PathEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTable {
    source_root: PathBuf,
    output_root: PathBuf,
    entries: BTreeMap<Category, PathEntry>,
}

impl PathTable {
    /// Build the default table for the given source and output roots.
    pub fn with_roots(source: &str, output: &str) -> Self {
        let s = normalize_dir(source);
        let o = normalize_dir(output);
        let (s, o) = (s.as_str(), o.as_str());

        let img_sources = vec![format!("{s}/img/**/*.{{jpg,jpeg,png,svg,gif,ico,webp}}")];
        let img_excludes = vec![format!("{s}/img/iconsprite/**")];
        let font_sources = vec![format!("{s}/fonts/**/*.{{woff,woff2,eot,ttf,otf,svg}}")];
        let lib_sources = vec![format!("{s}/libs/**/*")];

        let rows = [
            PathEntry {
                category: Category::Html,
                sources: vec![format!("{s}/*.html")],
                excludes: vec![format!("{s}/_*.html")],
                watch: vec![format!("{s}/**/*.html")],
                output: PathBuf::from(o),
            },
            PathEntry {
                category: Category::Css,
                sources: vec![format!("{s}/_scss/style.scss")],
                excludes: Vec::new(),
                watch: vec![format!("{s}/_scss/**/*.scss")],
                output: PathBuf::from(format!("{o}/css")),
            },
            PathEntry {
                category: Category::Scripts,
                sources: vec![format!("{s}/scripts/**/*.js")],
                excludes: vec![format!("{s}/scripts/**/_*.js")],
                watch: vec![format!("{s}/scripts/**/*.js")],
                output: PathBuf::from(format!("{o}/scripts")),
            },
            PathEntry {
                category: Category::Img,
                sources: img_sources.clone(),
                excludes: img_excludes,
                watch: img_sources,
                output: PathBuf::from(format!("{o}/img")),
            },
            PathEntry {
                category: Category::Fonts,
                sources: font_sources.clone(),
                excludes: Vec::new(),
                watch: font_sources,
                output: PathBuf::from(format!("{o}/fonts")),
            },
            PathEntry {
                category: Category::Libs,
                sources: lib_sources.clone(),
                excludes: Vec::new(),
                watch: lib_sources,
                output: PathBuf::from(format!("{o}/libs")),
            },
        ];

        Self {
            source_root: PathBuf::from(s),
            output_root: PathBuf::from(o),
            entries: rows.into_iter().map(|e| (e.category, e)).collect(),
        }
    }

    /// Look up a category.
    ///
    /// A missing category is a configuration error; it is only detected when
    /// a task asks for it.
    pub fn entry(&self, category: Category) -> Result<&PathEntry> {
        self.entries.get(&category).ok_or_else(|| {
            AssetflowError::ConfigError(format!(
                "path table has no entry for category '{category}'"
            ))
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.values()
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Root of the output tree; the clean task removes exactly this.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Replace (or insert) a row. Used while applying config overrides.
    pub(crate) fn set_entry(&mut self, entry: PathEntry) {
        self.entries.insert(entry.category, entry);
    }
}

/// Drop `.` and empty segments so `./src/` and `src` name the same directory.
pub(crate) fn normalize_dir(dir: &str) -> String {
    dir.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

impl Default for PathTable {
    fn default() -> Self {
        Self::with_roots("src", "public")
    }
}
