// tests/transforms.rs

use std::error::Error;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use assetflow::config::FontTarget;
use assetflow::fs::mock::MockFileSystem;
use assetflow::pipeline::Asset;
use assetflow::transform::command::run_filter;
use assetflow::transform::css::{group_media_queries, minify_css, prefix_css, targets_from_queries};
use assetflow::transform::image::{clean_svg, optimize_image};
use assetflow::transform::include::substitute_vars;
use assetflow::transform::sprite::build_sprite;
use assetflow::transform::{
    CommandTransform, Concat, ConvertFonts, IncludePartials, SvgSprite, Transform,
};
use assetflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn page(fs: &MockFileSystem, rel: &str, text: &str) -> Asset {
    fs.add_file(rel, text);
    let relative = Path::new(rel).file_name().unwrap_or_default().to_owned();
    Asset::new(rel, relative, text)
}

#[tokio::test]
async fn includes_resolve_recursively_with_variables() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("./src/_layout/_head.html", "<title>@@title</title>@@include('_meta.html')");
    fs.add_file("./src/_layout/_meta.html", "<meta name=\"page\" content=\"@@title\">");
    let index = page(
        &fs,
        "./src/index.html",
        "<head>@@include('_layout/_head.html', {\"title\": \"About\"})</head>",
    );

    let out = IncludePartials::new(Arc::new(fs)).apply(vec![index]).await?;

    assert_eq!(
        out[0].text()?,
        "<head><title>About</title><meta name=\"page\" content=\"About\"></head>"
    );
    Ok(())
}

#[tokio::test]
async fn missing_partial_is_an_error() -> TestResult {
    let fs = MockFileSystem::new();
    let index = page(&fs, "./src/index.html", "@@include('_nope.html')");

    let err = IncludePartials::new(Arc::new(fs))
        .apply(vec![index])
        .await
        .expect_err("partial does not exist");

    assert!(format!("{err:#}").contains("_nope.html"));
    Ok(())
}

#[tokio::test]
async fn include_cycles_hit_the_depth_limit() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./src/_a.html", "a@@include('_b.html')");
    fs.add_file("./src/_b.html", "b@@include('_a.html')");
    let index = page(&fs, "./src/index.html", "@@include('_a.html')");

    let err = IncludePartials::new(Arc::new(fs))
        .with_max_depth(4)
        .apply(vec![index])
        .await
        .expect_err("cycle");

    assert!(format!("{err:#}").contains("cycle"));
    Ok(())
}

#[test]
fn longer_variable_names_win() {
    let mut vars = Map::new();
    vars.insert("title".into(), Value::from("T"));
    vars.insert("titleSuffix".into(), Value::from("!"));
    vars.insert("count".into(), json!(3));
    vars.insert("empty".into(), Value::Null);

    assert_eq!(
        substitute_vars("@@title@@titleSuffix @@count[@@empty]", &vars),
        "T! 3[]"
    );
}

#[tokio::test]
async fn concat_keeps_input_order() -> TestResult {
    let assets = vec![
        Asset::new("src/scripts/a.js", "a.js", "A"),
        Asset::new("src/scripts/lib/b.js", "lib/b.js", "B"),
    ];

    let out = Concat::new("bundle.js").apply(assets).await?;

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].relative, Path::new("bundle.js"));
    assert_eq!(out[0].contents, b"A\nB");
    assert!(Concat::new("bundle.js").apply(Vec::new()).await?.is_empty());
    Ok(())
}

#[test]
fn sprite_nests_each_icon_by_stem() -> TestResult {
    let icons = vec![
        Asset::new(
            "i/z-last.svg",
            "z-last.svg",
            "<?xml version=\"1.0\"?><svg viewBox=\"0 0 8 8\"><circle r=\"4\"/></svg>",
        ),
        Asset::new(
            "i/a first.svg",
            "a first.svg",
            "<svg width=\"24\" height=\"12\">\n  <rect/>\n</svg>",
        ),
    ];

    let sprite = build_sprite(&icons)?;

    assert!(sprite.contains(":root>svg:target{display:block}"));
    assert!(sprite.contains("<svg id=\"a-first\" viewBox=\"0 0 24 12\"><rect/></svg>"));
    assert!(sprite.contains("<svg id=\"z-last\" viewBox=\"0 0 8 8\"><circle r=\"4\"/></svg>"));
    assert!(sprite.find("a-first") < sprite.find("z-last"));
    Ok(())
}

#[test]
fn sprite_keeps_inner_ids_apart() -> TestResult {
    let icon = |name: &str, color: &str| {
        Asset::new(
            format!("i/{name}.svg"),
            format!("{name}.svg"),
            format!(
                "<svg viewBox=\"0 0 4 4\"><defs><linearGradient id=\"g\"><stop stop-color=\"{color}\"/></linearGradient></defs><rect fill=\"url(#g)\"/><use xlink:href=\"#g\"/><use href=\"#elsewhere\"/></svg>"
            ),
        )
    };
    let sprite = build_sprite(&[icon("home", "red"), icon("user", "blue")])?;

    assert!(sprite.contains("<linearGradient id=\"home-g\">"));
    assert!(sprite.contains("<linearGradient id=\"user-g\">"));
    assert!(sprite.contains("fill=\"url(#home-g)\""));
    assert!(sprite.contains("fill=\"url(#user-g)\""));
    assert!(sprite.contains("xlink:href=\"#user-g\""));
    assert!(!sprite.contains("id=\"g\""));
    assert!(!sprite.contains("url(#g)"));
    // Icon ids themselves and undeclared references are untouched.
    assert!(sprite.contains("<svg id=\"home\" viewBox=\"0 0 4 4\">"));
    assert!(sprite.contains("href=\"#elsewhere\""));
    Ok(())
}

#[tokio::test]
async fn sprite_rejects_non_svg_icons() {
    let icons = vec![Asset::new("i/bad.svg", "bad.svg", "not an svg")];
    assert!(SvgSprite::new("icons.svg").apply(icons).await.is_err());
}

#[test]
fn prefixes_follow_browser_targets() -> TestResult {
    let targets = targets_from_queries(&["safari 10".to_string()])?;
    let css = prefix_css(".a { user-select: none; }", "t.css", targets)?;
    assert!(css.contains("-webkit-user-select"), "got: {css}");

    let none = prefix_css(".a { user-select: none; }", "t.css", targets_from_queries(&[])?)?;
    assert!(!none.contains("-webkit-"));
    Ok(())
}

#[test]
fn media_queries_are_grouped_at_the_end() -> TestResult {
    let css = "\
@media (max-width: 500px) { .a { color: red; } }
.x { color: black; }
@media (min-width: 900px) { .b { color: red; } }
@media (max-width: 500px) { .c { color: blue; } }
";
    let out = group_media_queries(css, "t.css")?;

    assert_eq!(out.matches("500px").count(), 1);
    let x = out.find(".x").expect(".x");
    let small = out.find("500px").expect("small");
    let large = out.find("900px").expect("large");
    assert!(x < small && small < large, "got:\n{out}");

    let c = out.find(".c").expect(".c");
    assert!(c < large, ".c should sit inside the first media group");
    Ok(())
}

#[test]
fn minified_css_has_no_layout_whitespace() -> TestResult {
    let out = minify_css(".a {\n  color: red;\n}\n\n.b {\n  margin: 0px;\n}\n", "t.css", targets_from_queries(&[])?)?;
    assert_eq!(out, ".a{color:red}.b{margin:0}");
    Ok(())
}

#[test]
fn svg_cleaning_keeps_the_drawing() {
    let svg = "<?xml version=\"1.0\"?>\n<!DOCTYPE svg>\n<!-- exported -->\n<svg viewBox=\"0 0 2 2\">\n  <metadata>junk</metadata>\n  <path d=\"M0 0\"/>\n</svg>\n";
    assert_eq!(clean_svg(svg), "<svg viewBox=\"0 0 2 2\"><path d=\"M0 0\"/></svg>");
}

#[test]
fn svg_cleaning_keeps_inline_text_spacing() {
    let svg = "<svg>\n  <text><tspan>Hello</tspan> <tspan>world</tspan></text>\n</svg>";
    assert_eq!(
        clean_svg(svg),
        "<svg><text><tspan>Hello</tspan> <tspan>world</tspan></text></svg>"
    );
}

#[test]
fn svg_cleaning_drops_a_doctype_internal_subset() {
    let svg = "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"svg11.dtd\" [\n  <!ENTITY ns \"http://www.w3.org/2000/svg\">\n]>\n<svg><path/></svg>";
    assert_eq!(clean_svg(svg), "<svg><path/></svg>");
}

#[test]
fn jpegs_are_reencoded_when_smaller() -> TestResult {
    let img = image::RgbImage::from_fn(64, 64, |x, y| image::Rgb([(x * 4) as u8, (y * 4) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 100).encode_image(&img)?;
    let original = buf.into_inner();

    let asset = Asset::new("photo.jpg", "photo.jpg", original.clone());
    let out = optimize_image(asset, 3, 40)?;
    assert!(out.contents.len() < original.len());

    let gif = Asset::new("anim.gif", "anim.gif", b"GIF89a".to_vec());
    assert_eq!(optimize_image(gif.clone(), 3, 40)?, gif);
    Ok(())
}

#[tokio::test]
async fn filters_see_stdin_and_source_env() -> TestResult {
    init_tracing();
    let out = run_filter("cat", b"body {}".to_vec(), Path::new("src/_scss/style.scss")).await?;
    assert_eq!(out, b"body {}");

    let out = run_filter(
        "printf '%s|%s' \"$ASSETFLOW_FILE\" \"$ASSETFLOW_FILE_DIR\"",
        Vec::new(),
        Path::new("src/_scss/style.scss"),
    )
    .await?;
    assert_eq!(String::from_utf8(out)?, "src/_scss/style.scss|src/_scss");
    Ok(())
}

#[tokio::test]
async fn failing_filter_reports_stderr() -> TestResult {
    let assets = vec![Asset::new("src/a.js", "a.js", "x")];
    let err = CommandTransform::new("minify-scripts", "echo 'Unexpected token' >&2; exit 3")
        .apply(assets)
        .await
        .expect_err("non-zero exit");

    let msg = format!("{err:#}");
    assert!(msg.contains("Unexpected token"), "got: {msg}");
    Ok(())
}

#[tokio::test]
async fn fonts_convert_to_every_target() -> TestResult {
    init_tracing();
    let fonts = vec![
        Asset::new("src/fonts/body.ttf", "body.ttf", b"TTF".to_vec()),
        Asset::new("src/fonts/head.woff2", "head.woff2", b"W2".to_vec()),
    ];
    let targets = vec![
        FontTarget { extension: "woff2".into(), cmd: "tr T w".into() },
        FontTarget { extension: "woff".into(), cmd: "cat".into() },
    ];

    let out = ConvertFonts::new(targets).apply(fonts).await?;
    let names: Vec<String> = out.iter().map(|a| a.relative.to_string_lossy().into_owned()).collect();

    assert_eq!(names, vec!["body.woff", "body.woff2", "head.woff", "head.woff2"]);
    assert_eq!(out[1].contents, b"wwF");
    assert_eq!(out[3].contents, b"W2");
    Ok(())
}

#[tokio::test]
async fn font_name_collisions_resolve_by_source_path() -> TestResult {
    init_tracing();
    let fonts = vec![
        Asset::new("src/fonts/a.ttf", "a.ttf", b"TTF".to_vec()),
        Asset::new("src/fonts/a.otf", "a.otf", b"OTF".to_vec()),
    ];

    // Whichever conversion finishes last, `a.otf` sorts first and wins.
    for slow in ["otf", "ttf"] {
        let targets = vec![FontTarget {
            extension: "woff".into(),
            cmd: format!("case \"$ASSETFLOW_FILE\" in *.{slow}) sleep 0.3;; esac; cat"),
        }];
        let out = ConvertFonts::new(targets).apply(fonts.clone()).await?;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relative, PathBuf::from("a.woff"));
        assert_eq!(out[0].contents, b"OTF", "slow format: {slow}");
    }

    // A font already in the target format beats any conversion.
    let mut with_woff = fonts.clone();
    with_woff.push(Asset::new("src/fonts/z/a.woff", "a.woff", b"WOFF".to_vec()));
    let targets = vec![FontTarget { extension: "woff".into(), cmd: "cat".into() }];
    let out = ConvertFonts::new(targets).apply(with_woff).await?;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].contents, b"WOFF");
    Ok(())
}

#[tokio::test]
async fn fonts_without_targets_pass_through() -> TestResult {
    let fonts = vec![Asset::new("src/fonts/a.otf", "a.otf", b"OTF".to_vec())];
    let out = ConvertFonts::new(Vec::new()).apply(fonts.clone()).await?;
    assert_eq!(out, fonts);
    Ok(())
}
