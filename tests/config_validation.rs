// tests/config_validation.rs

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow::config::{load_project, ConfigFile, PathTable, Project, RawConfigFile};
use assetflow::errors::AssetflowError;
use assetflow::fs::mock::MockFileSystem;
use assetflow::fs::FileSystem;
use assetflow::tasks::{category_task, clean_task, TaskDef, TaskPlan};
use assetflow::types::Category;
use assetflow_test_utils::builders::ConfigFileBuilder;

type TestResult = Result<(), Box<dyn Error>>;

fn parse(toml_src: &str) -> Result<ConfigFile, AssetflowError> {
    let raw: RawConfigFile = toml::from_str(toml_src)?;
    ConfigFile::try_from(raw)
}

fn assert_config_error(toml_src: &str, needle: &str) {
    match parse(toml_src) {
        Err(AssetflowError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "expected {needle:?} in {msg:?}")
        }
        other => panic!("expected ConfigError for:\n{toml_src}\ngot {other:?}"),
    }
}

#[test]
fn empty_file_gives_the_conventional_layout() -> TestResult {
    let cfg = parse("")?;

    assert_eq!(cfg.paths, PathTable::default());
    assert_eq!(cfg.paths.output_root(), Path::new("public"));
    let css = cfg.paths.entry(Category::Css)?;
    assert_eq!(css.sources, vec!["src/_scss/style.scss".to_string()]);
    assert_eq!(css.output, PathBuf::from("public/css"));
    assert_eq!(cfg.server.port, 3000);
    assert_eq!(cfg.scripts.bundle, "script.js");
    Ok(())
}

#[test]
fn roots_and_overrides_reshape_the_table() -> TestResult {
    let cfg = parse(
        r#"
[paths]
source = "assets"
output = "dist"

[category.scripts]
exclude = ["assets/scripts/vendor/**"]
dest = "dist/js"
"#,
    )?;

    let scripts = cfg.paths.entry(Category::Scripts)?;
    assert_eq!(scripts.sources, vec!["assets/scripts/**/*.js".to_string()]);
    assert_eq!(scripts.excludes, vec!["assets/scripts/vendor/**".to_string()]);
    assert_eq!(scripts.output, PathBuf::from("dist/js"));
    assert_eq!(cfg.paths.entry(Category::Html)?.output, PathBuf::from("dist"));
    Ok(())
}

#[test]
fn output_root_must_be_a_separate_subdirectory() {
    assert_config_error("[paths]\noutput = \".\"\n", "output root");
    assert_config_error("[paths]\noutput = \"../out\"\n", "output root");
    assert_config_error("[paths]\nsource = \"public/src\"\n", "contains the source root");
    assert_config_error("[paths]\noutput = \"  \"\n", "must not be empty");
}

#[test]
fn dotted_roots_cannot_overlap() {
    assert_config_error("[paths]\noutput = \"./src\"\n", "contains the source root");
    assert_config_error("[paths]\noutput = \"./src/\"\n", "contains the source root");
    assert_config_error("[paths]\nsource = \"./public\"\n", "contains the source root");
    assert_config_error("[paths]\nsource = \"./public/src\"\n", "contains the source root");
    assert_config_error("[paths]\noutput = \"./src/public\"\n", "inside the source root");
    assert_config_error("[paths]\noutput = \"./\"\n", "output root");
}

#[test]
fn dotted_roots_are_normalized() -> TestResult {
    let cfg = parse(
        r#"
[paths]
source = "./assets/"
output = "./dist"

[category.css]
dest = "./dist/styles/"
"#,
    )?;

    assert_eq!(cfg.paths.source_root(), Path::new("assets"));
    assert_eq!(cfg.paths.output_root(), Path::new("dist"));
    let html = cfg.paths.entry(Category::Html)?;
    assert_eq!(html.sources, vec!["assets/*.html".to_string()]);
    assert_eq!(cfg.paths.entry(Category::Css)?.output, PathBuf::from("dist/styles"));
    Ok(())
}

#[test]
fn category_dest_must_stay_inside_output() {
    assert_config_error("[category.css]\ndest = \"css\"\n", "not inside the output root");
}

#[test]
fn unknown_category_and_bad_globs_are_rejected() {
    assert_config_error("[category.video]\nsrc = [\"src/*.mp4\"]\n", "unknown category");
    assert_config_error("[category.html]\nsrc = [\"src/[.html\"]\n", "html");
    assert_config_error("[category.libs]\nsrc = []\n", "no source pattern");
}

#[test]
fn section_values_are_range_checked() {
    assert_config_error("[watch]\nqueue_length = 0\n", "queue_length");
    assert_config_error("[images]\noptimization_level = 7\n", "optimization_level");
    assert_config_error("[images]\njpeg_quality = 0\n", "jpeg_quality");
    assert_config_error("[styles]\nbrowsers = [\"not a browser 99\"]\n", "browsers");
    assert_config_error("[scripts]\nbundle = \"js/app.js\"\n", "bundle");
    assert_config_error("[scripts]\nminifier = \"\"\n", "minifier");
    assert_config_error("[sprite]\ndest = \"src/icons.png\"\n", "sprite");
    assert_config_error(
        "[[fonts.targets]]\nextension = \"woff\"\ncmd = \" \"\n",
        "empty cmd",
    );
}

#[test]
fn trigger_behaviour_parses_from_toml() -> TestResult {
    let cfg = parse("[watch]\ntriggered_while_running_behaviour = \"cancel\"\nuse_hash = true\n")?;
    assert!(cfg.watch.use_hash);
    assert_eq!(
        cfg.watch.triggered_while_running_behaviour,
        assetflow::types::TriggerWhileRunningBehaviour::Cancel
    );

    assert!(matches!(
        parse("[watch]\ntriggered_while_running_behaviour = \"restart\"\n"),
        Err(AssetflowError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn explicit_config_path_sets_the_project_root() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Assetflow.toml");
    std::fs::write(&path, "[server]\nport = 8081\n")?;

    let project = load_project(Some(&path))?;

    assert_eq!(project.root, dir.path());
    assert_eq!(project.config.server.port, 8081);

    let missing = load_project(Some(&dir.path().join("nope.toml")));
    assert!(matches!(missing, Err(AssetflowError::IoError(_))));
    Ok(())
}

#[test]
fn every_category_resolves_to_a_task() -> TestResult {
    let project = Project::new(".", ConfigFileBuilder::new().build());
    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());

    for category in Category::ALL {
        let def = category_task(&project, &fs, category, &[])?;
        assert_eq!(def.name, category.to_string());
    }

    let plan = TaskPlan::build(&project, &fs)?;
    assert!(plan.contains("fonts"));
    assert_eq!(plan.len(), Category::ALL.len() + 1);
    Ok(())
}

fn task(project: &Project, name: &str, after: &[&str]) -> TaskDef {
    let mut def = clean_task(project);
    def.name = name.to_string();
    def.after = after.iter().map(|s| s.to_string()).collect();
    def
}

#[test]
fn plans_reject_bad_dependencies() {
    let project = Project::new(".", ConfigFileBuilder::new().build());

    let cycle = TaskPlan::from_tasks([
        task(&project, "a", &["b"]),
        task(&project, "b", &["a"]),
    ]);
    assert!(matches!(cycle, Err(AssetflowError::DagCycle(_))));

    let selfdep = TaskPlan::from_tasks([task(&project, "a", &["a"])]);
    assert!(matches!(selfdep, Err(AssetflowError::ConfigError(_))));

    let unknown = TaskPlan::from_tasks([task(&project, "a", &["ghost"])]);
    assert!(matches!(unknown, Err(AssetflowError::TaskNotFound(ref m)) if m.contains("ghost")));

    let dup = TaskPlan::from_tasks([task(&project, "a", &[]), task(&project, "a", &[])]);
    assert!(dup.is_err());
}

#[test]
fn build_plan_roots_at_clean() -> TestResult {
    let project = Project::new(".", ConfigFileBuilder::new().build());
    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());

    let build = TaskPlan::build(&project, &fs)?;
    assert_eq!(build.roots(), vec!["clean".to_string()]);
    for name in ["html", "css", "scripts", "img", "fonts", "libs"] {
        let def = build.get(name).expect("category task");
        assert_eq!(def.after, vec!["clean".to_string()]);
    }

    let watch = TaskPlan::watch(&project, &fs)?;
    assert_eq!(watch.roots().len(), 6);
    assert_eq!(TaskPlan::svg(&project)?.roots(), vec!["svg".to_string()]);
    Ok(())
}
