// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::paths::PathTable;
use crate::types::TriggerWhileRunningBehaviour;

/// Top-level configuration as read from `Assetflow.toml`.
///
/// Every section is optional; an empty file (or no file at all) yields the
/// conventional `src/` -> `public/` layout.
///
/// ```toml
/// [paths]
/// source = "src"
/// output = "public"
///
/// [category.scripts]
/// exclude = ["src/scripts/vendor/**"]
///
/// [scripts]
/// minifier = "terser --compress --mangle"
///
/// [server]
/// port = 3000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    /// Per-category overrides of the path table, keyed by category name.
    #[serde(default)]
    pub category: BTreeMap<String, CategoryOverride>,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub fonts: FontsSection,

    #[serde(default)]
    pub sprite: SpriteSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathTable,
    pub styles: StylesSection,
    pub scripts: ScriptsSection,
    pub images: ImagesSection,
    pub fonts: FontsSection,
    pub sprite: SpriteSection,
    pub server: ServerSection,
    pub watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, paths: PathTable) -> Self {
        Self {
            paths,
            styles: raw.styles,
            scripts: raw.scripts,
            images: raw.images,
            fonts: raw.fonts,
            sprite: raw.sprite,
            server: raw.server,
            watch: raw.watch,
        }
    }
}

/// `[paths]` section: the two roots the default path table is derived from.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_source_root")]
    pub source: String,
    #[serde(default = "default_output_root")]
    pub output: String,
}

fn default_source_root() -> String {
    "src".to_string()
}

fn default_output_root() -> String {
    "public".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source_root(),
            output: default_output_root(),
        }
    }
}

/// `[category.<name>]`: replaces individual fields of a path table row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryOverride {
    #[serde(default)]
    pub src: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub watch: Option<Vec<String>>,
    #[serde(default)]
    pub dest: Option<String>,
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    /// Command that reads SCSS on stdin and prints CSS on stdout.
    #[serde(default = "default_style_compiler")]
    pub compiler: String,

    /// Browserslist queries used for vendor prefixing.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,

    #[serde(default = "default_true")]
    pub group_media_queries: bool,
}

fn default_style_compiler() -> String {
    "sass --stdin --no-source-map --load-path=\"$ASSETFLOW_FILE_DIR\"".to_string()
}

fn default_browsers() -> Vec<String> {
    vec!["last 5 versions".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            compiler: default_style_compiler(),
            browsers: default_browsers(),
            group_media_queries: true,
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    /// File name of the concatenated bundle.
    #[serde(default = "default_bundle")]
    pub bundle: String,

    /// Command that reads JavaScript on stdin and prints minified code.
    #[serde(default = "default_minifier")]
    pub minifier: String,
}

fn default_bundle() -> String {
    "script.js".to_string()
}

fn default_minifier() -> String {
    "terser --compress --mangle".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            bundle: default_bundle(),
            minifier: default_minifier(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    /// oxipng preset, 0..=6.
    #[serde(default = "default_optimization_level")]
    pub optimization_level: u8,

    /// JPEG re-encode quality, 1..=100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_optimization_level() -> u8 {
    3
}

fn default_jpeg_quality() -> u8 {
    85
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            optimization_level: default_optimization_level(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// `[fonts]` section. With no targets, fonts are copied verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FontsSection {
    #[serde(default)]
    pub targets: Vec<FontTarget>,
}

/// One output font format.
///
/// ```toml
/// [[fonts.targets]]
/// extension = "woff2"
/// cmd = "woff2-convert"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FontTarget {
    pub extension: String,
    /// Command reading the source font on stdin and writing the target
    /// format on stdout.
    pub cmd: String,
}

/// `[sprite]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SpriteSection {
    #[serde(default = "default_sprite_src")]
    pub src: String,

    /// Path of the generated sprite sheet. Defaults to the source image tree
    /// so the regular image task picks it up.
    #[serde(default = "default_sprite_dest")]
    pub dest: String,
}

fn default_sprite_src() -> String {
    "src/img/iconsprite/*.svg".to_string()
}

fn default_sprite_dest() -> String {
    "src/img/icons/icons.svg".to_string()
}

impl Default for SpriteSection {
    fn default() -> Self {
        Self {
            src: default_sprite_src(),
            dest: default_sprite_dest(),
        }
    }
}

/// `[server]` section for the development server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Inject the live-reload client into served HTML pages.
    #[serde(default = "default_true")]
    pub inject_reload_script: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            inject_reload_script: true,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Only trigger a category when the aggregated content of its watched
    /// files actually changed.
    #[serde(default)]
    pub use_hash: bool,

    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued re-trigger batches.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            use_hash: false,
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::Queue,
            queue_length: default_queue_length(),
        }
    }
}
