#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow::config::{CategoryOverride, ConfigFile, FontTarget, Project, RawConfigFile};
use assetflow::fs::{FileSystem, RealFileSystem};
use assetflow::types::{Category, TriggerWhileRunningBehaviour};
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
///
/// External commands default to `cat`, so styles and scripts pass through
/// unchanged and tests do not depend on `sass` or `terser` being installed.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.styles.compiler = "cat".to_string();
        config.scripts.minifier = "cat".to_string();
        Self { config }
    }

    pub fn roots(mut self, source: &str, output: &str) -> Self {
        self.config.paths.source = source.to_string();
        self.config.paths.output = output.to_string();
        self
    }

    pub fn category(mut self, category: Category, ov: CategoryOverride) -> Self {
        self.config.category.insert(category.as_str().to_string(), ov);
        self
    }

    pub fn style_compiler(mut self, cmd: &str) -> Self {
        self.config.styles.compiler = cmd.to_string();
        self
    }

    pub fn browsers(mut self, queries: &[&str]) -> Self {
        self.config.styles.browsers = queries.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn group_media_queries(mut self, val: bool) -> Self {
        self.config.styles.group_media_queries = val;
        self
    }

    pub fn minifier(mut self, cmd: &str) -> Self {
        self.config.scripts.minifier = cmd.to_string();
        self
    }

    pub fn bundle(mut self, name: &str) -> Self {
        self.config.scripts.bundle = name.to_string();
        self
    }

    pub fn font_target(mut self, extension: &str, cmd: &str) -> Self {
        self.config.fonts.targets.push(FontTarget {
            extension: extension.to_string(),
            cmd: cmd.to_string(),
        });
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn trigger_behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.watch.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway project directory on disk.
pub struct ProjectFixture {
    dir: TempDir,
    pub project: Project,
}

impl ProjectFixture {
    pub fn new(config: ConfigFile) -> Self {
        let dir = tempfile::tempdir().expect("creating temp project dir");
        let project = Project::new(dir.path().to_path_buf(), config);
        Self { dir, project }
    }

    /// A project seeded with [`write_sample_site`].
    pub fn sample() -> Self {
        let fixture = Self::new(ConfigFileBuilder::new().build());
        fixture.write_sample_site();
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn fs(&self) -> Arc<dyn FileSystem> {
        Arc::new(RealFileSystem)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating fixture dir");
        }
        fs::write(&path, contents).expect("writing fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Minimal site touching every category with the default path table.
    pub fn write_sample_site(&self) {
        self.write(
            "src/index.html",
            "<html><body>@@include('_header.html', {\"title\": \"Home\"})<main>hi</main></body></html>\n",
        );
        self.write("src/_header.html", "<header>@@title</header>");
        self.write(
            "src/_scss/style.scss",
            ".a { color: red; }\n@media (min-width: 600px) { .a { color: blue; } }\n.b { color: green; }\n",
        );
        self.write("src/scripts/a.js", "var a = 1;\n");
        self.write("src/scripts/b.js", "var b = 2;\n");
        self.write("src/scripts/_private.js", "var secret = 3;\n");
        self.write(
            "src/img/logo.svg",
            "<?xml version=\"1.0\"?>\n<!-- logo -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 4 4\">\n  <rect width=\"4\" height=\"4\"/>\n</svg>\n",
        );
        self.write("src/fonts/body.woff2", [0u8, 1, 2, 3]);
        self.write("src/libs/vendor/lib.js", "window.lib = {};\n");
    }

    /// Every file below the output root, keyed by path relative to it.
    pub fn snapshot_output(&self) -> BTreeMap<String, Vec<u8>> {
        let output = self.path(&self.project.config.paths.output_root().to_string_lossy());
        let mut files = BTreeMap::new();
        let mut stack = vec![output.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries {
                let path = entry.expect("dir entry").path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path
                        .strip_prefix(&output)
                        .expect("inside output")
                        .to_string_lossy()
                        .replace('\\', "/");
                    files.insert(rel, fs::read(&path).expect("reading output file"));
                }
            }
        }
        files
    }
}
