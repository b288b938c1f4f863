// src/transform/image.rs

//! Lossless-ish image optimization.
//!
//! PNGs go through oxipng, JPEGs are re-encoded at the configured quality and
//! SVGs are stripped of comments, prologs and metadata. The optimized bytes
//! only replace the original when they are actually smaller. Other formats
//! (gif, webp, ico, ...) pass through untouched.

use std::io::Cursor;
use std::sync::LazyLock;

use ::image::codecs::jpeg::JpegEncoder;
use ::image::ImageFormat;
use anyhow::{anyhow, Context, Result};
use regex::Regex;

use crate::pipeline::Asset;
use crate::transform::{map_blocking, Transform, TransformFuture};

static SVG_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<\?xml.*?\?>|<!--.*?-->|<!DOCTYPE[^\[>]*(?:\[.*?\])?\s*>|<metadata\b.*?</metadata>",
    )
    .expect("svg noise regex is valid")
});

// Only line-break indentation between tags goes; a same-line space can be
// significant text (`<tspan>a</tspan> <tspan>b</tspan>`).
static SVG_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">[ \t]*\r?\n\s*<").expect("svg gap regex is valid"));

#[derive(Debug, Clone, Copy)]
pub struct OptimizeImages {
    level: u8,
    jpeg_quality: u8,
}

impl OptimizeImages {
    pub fn new(level: u8, jpeg_quality: u8) -> Self {
        Self {
            level,
            jpeg_quality,
        }
    }
}

impl Transform for OptimizeImages {
    fn name(&self) -> &str {
        "optimize-images"
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        let Self {
            level,
            jpeg_quality,
        } = *self;
        Box::pin(map_blocking(assets, move |asset| {
            optimize_image(asset, level, jpeg_quality)
        }))
    }
}

pub fn optimize_image(asset: Asset, level: u8, jpeg_quality: u8) -> Result<Asset> {
    let optimized = match asset.extension().as_deref() {
        Some("png") => oxipng::optimize_from_memory(
            &asset.contents,
            &oxipng::Options::from_preset(level),
        )
        .map_err(|e| anyhow!("optimizing {:?}: {e}", asset.source))?,
        Some("jpg" | "jpeg") => reencode_jpeg(&asset.contents, jpeg_quality)
            .with_context(|| format!("optimizing {:?}", asset.source))?,
        Some("svg") => clean_svg(asset.text()?).into_bytes(),
        _ => return Ok(asset),
    };

    if optimized.len() < asset.contents.len() {
        Ok(asset.with_contents(optimized))
    } else {
        Ok(asset)
    }
}

fn reencode_jpeg(data: &[u8], quality: u8) -> Result<Vec<u8>> {
    let img = ::image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&img.to_rgb8())?;
    Ok(out.into_inner())
}

/// Drop XML prologs, comments, doctypes, `<metadata>` and inter-tag
/// whitespace. The `viewBox` and all drawing content are preserved.
pub fn clean_svg(svg: &str) -> String {
    let stripped = SVG_NOISE_RE.replace_all(svg, "");
    SVG_GAP_RE.replace_all(stripped.trim(), "><").into_owned()
}
