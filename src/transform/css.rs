// src/transform/css.rs

//! Stylesheet post-processing on top of lightningcss.

use anyhow::{anyhow, Result};
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use lightningcss::traits::ToCss;

use crate::pipeline::Asset;
use crate::transform::{map_blocking, Transform, TransformFuture};

/// Resolve browserslist queries into lightningcss targets.
///
/// An empty query list means "no targets": nothing is prefixed or lowered.
pub fn targets_from_queries(queries: &[String]) -> Result<Targets> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| anyhow!("invalid browser query: {e}"))?;
    Ok(browsers.map(Targets::from).unwrap_or_default())
}

fn parser_options<'o>(filename: &str) -> ParserOptions<'o> {
    ParserOptions {
        filename: filename.to_string(),
        ..ParserOptions::default()
    }
}

/// Add the vendor prefixes `targets` need, keeping readable output.
pub fn prefix_css(css: &str, filename: &str, targets: Targets) -> Result<String> {
    let mut sheet = StyleSheet::parse(css, parser_options(filename))
        .map_err(|e| anyhow!("{filename}: {e}"))?;
    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{filename}: {e}"))?;
    let out = sheet
        .to_css(PrinterOptions {
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{filename}: {e}"))?;
    Ok(out.code)
}

/// Merge `@media` blocks with identical queries into one block each,
/// moved to the end of the sheet in order of first appearance.
pub fn group_media_queries(css: &str, filename: &str) -> Result<String> {
    let mut sheet = StyleSheet::parse(css, parser_options(filename))
        .map_err(|e| anyhow!("{filename}: {e}"))?;

    let rules = std::mem::take(&mut sheet.rules.0);
    let mut plain = Vec::with_capacity(rules.len());
    let mut groups: Vec<(String, CssRule<'_>)> = Vec::new();

    for rule in rules {
        match rule {
            CssRule::Media(media) => {
                let key = media
                    .query
                    .to_css_string(PrinterOptions::default())
                    .map_err(|e| anyhow!("{filename}: {e}"))?;
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, CssRule::Media(existing))) => {
                        existing.rules.0.extend(media.rules.0);
                    }
                    _ => groups.push((key, CssRule::Media(media))),
                }
            }
            other => plain.push(other),
        }
    }

    plain.extend(groups.into_iter().map(|(_, rule)| rule));
    sheet.rules.0 = plain;

    let out = sheet
        .to_css(PrinterOptions::default())
        .map_err(|e| anyhow!("{filename}: {e}"))?;
    Ok(out.code)
}

/// Minify for production.
pub fn minify_css(css: &str, filename: &str, targets: Targets) -> Result<String> {
    let mut sheet = StyleSheet::parse(css, parser_options(filename))
        .map_err(|e| anyhow!("{filename}: {e}"))?;
    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{filename}: {e}"))?;
    let out = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{filename}: {e}"))?;
    Ok(out.code)
}

fn display_name(asset: &Asset) -> String {
    asset.relative.to_string_lossy().into_owned()
}

#[derive(Debug, Clone, Default)]
pub struct Autoprefix {
    targets: Targets,
}

impl Autoprefix {
    pub fn new(targets: Targets) -> Self {
        Self { targets }
    }
}

impl Transform for Autoprefix {
    fn name(&self) -> &str {
        "autoprefix"
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        let targets = self.targets.clone();
        Box::pin(map_blocking(assets, move |asset| {
            let out = prefix_css(asset.text()?, &display_name(&asset), targets.clone())?;
            Ok(asset.with_contents(out))
        }))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GroupMediaQueries;

impl Transform for GroupMediaQueries {
    fn name(&self) -> &str {
        "group-media-queries"
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        Box::pin(map_blocking(assets, |asset| {
            let out = group_media_queries(asset.text()?, &display_name(&asset))?;
            Ok(asset.with_contents(out))
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MinifyCss {
    targets: Targets,
}

impl MinifyCss {
    pub fn new(targets: Targets) -> Self {
        Self { targets }
    }
}

impl Transform for MinifyCss {
    fn name(&self) -> &str {
        "minify-css"
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        let targets = self.targets.clone();
        Box::pin(map_blocking(assets, move |asset| {
            let out = minify_css(asset.text()?, &display_name(&asset), targets.clone())?;
            Ok(asset.with_contents(out))
        }))
    }
}
