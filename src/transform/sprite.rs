// src/transform/sprite.rs

//! SVG "stack" sprite.
//!
//! Every icon becomes a nested `<svg id="<stem>">` inside one document. Only
//! the icon addressed by the URL fragment is displayed, so
//! `icons.svg#home` renders the `home` icon directly.
//!
//! Ids declared inside an icon (gradients, clip paths, ...) are prefixed
//! with the icon id, together with the `url(#..)` and `href="#.."`
//! references to them, so two icons exporting `id="a"` cannot collide.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::pipeline::Asset;
use crate::transform::image::clean_svg;
use crate::transform::{Transform, TransformFuture};

static ROOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<svg\b([^>]*)>(.*)</svg>\s*$").expect("svg root regex is valid")
});

static VIEWBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bviewBox\s*=\s*["']([^"']*)["']"#).expect("viewBox regex is valid")
});

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(width|height)\s*=\s*["']([\d.]+)(?:px)?["']"#).expect("size regex is valid")
});

static INNER_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s)id\s*=\s*(["'])([^"']+)["']"#).expect("inner id regex is valid")
});

static URL_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"url\(\s*#([^)\s]+)\s*\)").expect("url reference regex is valid")
});

static HREF_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\bhref\s*=\s*["'])#([^"']+)(["'])"#).expect("href reference regex is valid")
});

const STACK_STYLE: &str = ":root>svg{display:none}:root>svg:target{display:block}";

#[derive(Debug, Clone)]
pub struct SvgSprite {
    file_name: PathBuf,
}

impl SvgSprite {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl Transform for SvgSprite {
    fn name(&self) -> &str {
        "svg-sprite"
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        Box::pin(async move {
            let Some(first) = assets.first() else {
                return Ok(Vec::new());
            };
            let source = first.source.clone();
            let sprite = build_sprite(&assets)?;
            Ok(vec![Asset::new(source, self.file_name.clone(), sprite)])
        })
    }
}

/// Build the stack document from `icons`, ordered by relative path.
pub fn build_sprite(icons: &[Asset]) -> Result<String> {
    let mut sorted: Vec<&Asset> = icons.iter().collect();
    sorted.sort_by(|a, b| a.relative.cmp(&b.relative));

    let mut out = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?><svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
    );
    out.push_str("<style>");
    out.push_str(STACK_STYLE);
    out.push_str("</style>");

    for icon in sorted {
        let id = icon_id(icon);
        let (view_box, body) =
            split_icon(icon.text()?).with_context(|| format!("icon {:?}", icon.source))?;
        out.push_str(&format!(r#"<svg id="{id}""#));
        if let Some(vb) = view_box {
            out.push_str(&format!(r#" viewBox="{vb}""#));
        }
        out.push('>');
        out.push_str(&scope_ids(&id, &body));
        out.push_str("</svg>");
    }

    out.push_str("</svg>");
    Ok(out)
}

// File stem with anything outside [A-Za-z0-9_-] replaced by '-'.
fn icon_id(icon: &Asset) -> String {
    icon.relative
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn split_icon(svg: &str) -> Result<(Option<String>, String)> {
    let cleaned = clean_svg(svg);
    let Some(caps) = ROOT_RE.captures(&cleaned) else {
        bail!("not an SVG document");
    };
    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str()).to_string();

    let view_box = match VIEWBOX_RE.captures(attrs) {
        Some(vb) => Some(vb[1].to_string()),
        None => {
            let mut width = None;
            let mut height = None;
            for size in SIZE_RE.captures_iter(attrs) {
                match &size[1] {
                    "width" => width = Some(size[2].to_string()),
                    _ => height = Some(size[2].to_string()),
                }
            }
            width.zip(height).map(|(w, h)| format!("0 0 {w} {h}"))
        }
    };

    Ok((view_box, body))
}

/// Prefix every id declared in `body` with `scope`, and rewrite local
/// references to those ids. References to ids the icon does not declare are
/// left alone.
pub fn scope_ids(scope: &str, body: &str) -> String {
    let declared: HashSet<&str> = INNER_ID_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(3).map(|m| m.as_str()))
        .collect();
    if declared.is_empty() {
        return body.to_string();
    }

    let renamed = INNER_ID_RE.replace_all(body, |caps: &regex::Captures| {
        format!("{}id={q}{scope}-{}{q}", &caps[1], &caps[3], q = &caps[2])
    });

    let renamed = URL_REF_RE.replace_all(&renamed, |caps: &regex::Captures| {
        if declared.contains(&caps[1]) {
            format!("url(#{scope}-{})", &caps[1])
        } else {
            caps[0].to_string()
        }
    });

    HREF_REF_RE
        .replace_all(&renamed, |caps: &regex::Captures| {
            if declared.contains(&caps[2]) {
                format!("{}#{scope}-{}{}", &caps[1], &caps[2], &caps[3])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
