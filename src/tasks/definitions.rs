// src/tasks/definitions.rs

//! Per-category task construction.
//!
//! Each category gets one task named after it. The step lists are fixed
//! here; only their parameters (commands, targets, quality settings, paths)
//! come from configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{PathEntry, Project};
use crate::errors::{AssetflowError, Result};
use crate::fs::FileSystem;
use crate::pipeline::{Pipeline, Rename, SourceSelection, Step};
use crate::tasks::{TaskAction, TaskDef};
use crate::transform::css::targets_from_queries;
use crate::transform::{
    Autoprefix, CommandTransform, Concat, ConvertFonts, GroupMediaQueries, IncludePartials,
    MinifyCss, OptimizeImages, SvgSprite,
};
use crate::types::Category;

pub const CLEAN_TASK: &str = "clean";
pub const SVG_TASK: &str = "svg";

const MIN_MARKER: &str = "min";

/// Removes the whole output root.
pub fn clean_task(project: &Project) -> TaskDef {
    TaskDef {
        name: CLEAN_TASK.to_string(),
        category: None,
        after: Vec::new(),
        action: TaskAction::Clean {
            target: project.config.paths.output_root().to_path_buf(),
        },
    }
}

/// The transform task for `category`, depending on `after`.
pub fn category_task(
    project: &Project,
    fs: &Arc<dyn FileSystem>,
    category: Category,
    after: &[&str],
) -> Result<TaskDef> {
    let entry = project.config.paths.entry(category)?;
    let selection = selection_for(entry)?;

    let steps = match category {
        Category::Html => html_steps(entry, fs),
        Category::Css => css_steps(project, entry)?,
        Category::Scripts => script_steps(project, entry),
        Category::Img => image_steps(project, entry),
        Category::Fonts => font_steps(project, entry),
        Category::Libs => vec![Step::write(&entry.output)],
    };

    Ok(TaskDef {
        name: category.as_str().to_string(),
        category: Some(category),
        after: after.iter().map(|s| s.to_string()).collect(),
        action: TaskAction::Pipeline(Pipeline::new(selection, steps)),
    })
}

/// Packs the icon directory into one stack sprite.
pub fn sprite_task(project: &Project) -> Result<TaskDef> {
    let sprite = &project.config.sprite;
    let selection = SourceSelection::new(std::slice::from_ref(&sprite.src), &[])
        .map_err(|e| AssetflowError::ConfigError(format!("[sprite].src: {e:#}")))?;

    let dest = Path::new(&sprite.dest);
    let file_name = dest
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| {
            AssetflowError::ConfigError(format!("[sprite].dest has no file name: {}", sprite.dest))
        })?;
    let dir = dest.parent().map(Path::to_path_buf).unwrap_or_default();

    Ok(TaskDef {
        name: SVG_TASK.to_string(),
        category: None,
        after: Vec::new(),
        action: TaskAction::Pipeline(Pipeline::new(
            selection,
            vec![Step::transform(SvgSprite::new(file_name)), Step::write(dir)],
        )),
    })
}

fn selection_for(entry: &PathEntry) -> Result<SourceSelection> {
    SourceSelection::new(&entry.sources, &entry.excludes).map_err(|e| {
        AssetflowError::ConfigError(format!("category '{}': {e:#}", entry.category))
    })
}

fn html_steps(entry: &PathEntry, fs: &Arc<dyn FileSystem>) -> Vec<Step> {
    vec![
        Step::transform(IncludePartials::new(Arc::clone(fs))),
        Step::write(&entry.output),
    ]
}

fn css_steps(project: &Project, entry: &PathEntry) -> Result<Vec<Step>> {
    let styles = &project.config.styles;
    let targets = targets_from_queries(&styles.browsers)
        .map_err(|e| AssetflowError::ConfigError(format!("[styles].browsers: {e:#}")))?;

    let mut steps = vec![
        Step::transform(CommandTransform::new("compile-styles", &styles.compiler)),
        Step::Rename(Rename::Extension("css".to_string())),
        Step::transform(Autoprefix::new(targets.clone())),
    ];
    if styles.group_media_queries {
        steps.push(Step::transform(GroupMediaQueries));
    }
    steps.extend([
        Step::write(&entry.output),
        Step::transform(MinifyCss::new(targets)),
        Step::Rename(Rename::Marker(MIN_MARKER.to_string())),
        Step::write(&entry.output),
    ]);
    Ok(steps)
}

fn script_steps(project: &Project, entry: &PathEntry) -> Vec<Step> {
    let scripts = &project.config.scripts;
    vec![
        Step::transform(Concat::new(&scripts.bundle)),
        Step::write(&entry.output),
        Step::transform(CommandTransform::new("minify-scripts", &scripts.minifier)),
        Step::Rename(Rename::Marker(MIN_MARKER.to_string())),
        Step::write(&entry.output),
    ]
}

fn image_steps(project: &Project, entry: &PathEntry) -> Vec<Step> {
    let images = &project.config.images;
    vec![
        Step::transform(OptimizeImages::new(
            images.optimization_level,
            images.jpeg_quality,
        )),
        Step::write(&entry.output),
    ]
}

fn font_steps(project: &Project, entry: &PathEntry) -> Vec<Step> {
    vec![
        Step::transform(ConvertFonts::new(project.config.fonts.targets.clone())),
        Step::write(&entry.output),
    ]
}
