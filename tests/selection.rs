// tests/selection.rs

use std::error::Error;
use std::path::{Path, PathBuf};

use proptest::prelude::*;

use assetflow::config::PathTable;
use assetflow::errors::AssetflowError;
use assetflow::fs::mock::MockFileSystem;
use assetflow::pipeline::select::glob_base;
use assetflow::pipeline::SourceSelection;
use assetflow::types::Category;

type TestResult = Result<(), Box<dyn Error>>;

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn default_selection(category: Category) -> SourceSelection {
    let table = PathTable::default();
    let entry = table.entry(category).expect("default row");
    SourceSelection::new(&entry.sources, &entry.excludes).expect("default globs compile")
}

#[test]
fn selection_is_sorted_and_relative_to_the_glob_base() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./src/scripts/z.js", "z");
    fs.add_file("./src/scripts/modules/a.js", "a");
    fs.add_file("./src/scripts/_draft.js", "d");
    fs.add_file("./src/scripts/notes.txt", "n");

    let files = default_selection(Category::Scripts).select(&fs, Path::new("."))?;

    let rel: Vec<PathBuf> = files.iter().map(|f| f.relative.clone()).collect();
    assert_eq!(rel, vec![PathBuf::from("modules/a.js"), PathBuf::from("z.js")]);
    assert_eq!(files[0].path, PathBuf::from("./src/scripts/modules/a.js"));
    Ok(())
}

#[test]
fn html_pages_skip_partials_and_subdirectories() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./src/index.html", "");
    fs.add_file("./src/about.html", "");
    fs.add_file("./src/_footer.html", "");
    fs.add_file("./src/parts/card.html", "");

    let files = default_selection(Category::Html).select(&fs, Path::new("."))?;

    let rel: Vec<PathBuf> = files.into_iter().map(|f| f.relative).collect();
    assert_eq!(rel, vec![PathBuf::from("about.html"), PathBuf::from("index.html")]);
    Ok(())
}

#[test]
fn icon_sources_are_not_images() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./src/img/photo.jpg", "");
    fs.add_file("./src/img/iconsprite/arrow.svg", "");
    fs.add_file("./src/img/icons/icons.svg", "");

    let files = default_selection(Category::Img).select(&fs, Path::new("."))?;

    let rel: Vec<PathBuf> = files.into_iter().map(|f| f.relative).collect();
    assert_eq!(rel, vec![PathBuf::from("icons/icons.svg"), PathBuf::from("photo.jpg")]);
    Ok(())
}

#[test]
fn missing_literal_source_is_an_error() {
    let fs = MockFileSystem::new();
    let err = default_selection(Category::Css)
        .select(&fs, Path::new("."))
        .expect_err("style.scss missing");
    assert!(matches!(err, AssetflowError::SourceNotFound(ref p) if p.ends_with("style.scss")));
}

#[test]
fn missing_glob_base_selects_nothing() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./src/index.html", "");

    let files = default_selection(Category::Fonts).select(&fs, Path::new("."))?;
    assert!(files.is_empty());
    Ok(())
}

#[test]
fn glob_base_stops_at_the_first_wildcard() {
    assert_eq!(glob_base("src/scripts/**/*.js"), "src/scripts");
    assert_eq!(glob_base("src/*.html"), "src");
    assert_eq!(glob_base("src/img/**/*.{jpg,png}"), "src/img");
    assert_eq!(glob_base("*.html"), "");
}

proptest! {
    #[test]
    fn excluded_paths_are_never_selected(
        dirs in proptest::collection::vec("[a-c]{1,2}", 0..3),
        stem in "_?[a-z]{1,6}",
    ) {
        let rel = if dirs.is_empty() {
            format!("src/scripts/{stem}.js")
        } else {
            format!("src/scripts/{}/{stem}.js", dirs.join("/"))
        };

        let sel = SourceSelection::new(
            &strings(&["src/scripts/**/*.js"]),
            &strings(&["src/scripts/**/_*.js"]),
        ).unwrap();

        let fs = MockFileSystem::new();
        fs.add_file(format!("./{rel}"), "x");
        let files = sel.select(&fs, Path::new(".")).unwrap();

        let excluded = stem.starts_with('_');
        prop_assert_eq!(sel.matches(&rel), !excluded);
        prop_assert_eq!(files.len(), usize::from(!excluded));
    }
}
