// src/transform/font.rs

//! Font format conversion.
//!
//! With no targets configured, fonts are copied verbatim. Otherwise every
//! source font is converted to every target format by an external command;
//! fonts already in a target format are passed through for that target.
//! All conversions run concurrently and the stage completes only once every
//! one of them has settled.
//!
//! Two sources that map to the same output name (`a.otf` and `a.ttf` both
//! becoming `a.woff`) resolve the same way on every run: a source already in
//! the target format wins, then the source whose path sorts first.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::FontTarget;
use crate::pipeline::Asset;
use crate::transform::command::run_filter;
use crate::transform::{Transform, TransformFuture};

#[derive(Debug, Clone, Default)]
pub struct ConvertFonts {
    targets: Vec<FontTarget>,
}

impl ConvertFonts {
    pub fn new(targets: Vec<FontTarget>) -> Self {
        Self { targets }
    }
}

impl Transform for ConvertFonts {
    fn name(&self) -> &str {
        "convert-fonts"
    }

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_> {
        Box::pin(async move {
            if self.targets.is_empty() {
                return Ok(assets);
            }

            let mut assets = assets;
            assets.sort_by(|a, b| a.source.cmp(&b.source));

            let mut outputs: BTreeMap<PathBuf, Asset> = BTreeMap::new();
            let mut set = JoinSet::new();
            let mut order = 0usize;

            for target in &self.targets {
                let ext = target.extension.trim_start_matches('.').to_lowercase();
                for asset in &assets {
                    if asset.extension().as_deref() == Some(ext.as_str()) {
                        keep_first(&mut outputs, asset.clone());
                        continue;
                    }

                    let asset = asset.clone();
                    let cmd = target.cmd.clone();
                    let ext = ext.clone();
                    let index = order;
                    order += 1;
                    set.spawn(async move {
                        debug!(source = ?asset.source, format = %ext, "converting font");
                        let converted =
                            run_filter(&cmd, asset.contents.clone(), &asset.source).await;
                        let converted = converted
                            .map(|bytes| {
                                let mut out = asset.clone().with_contents(bytes);
                                out.set_extension(&ext);
                                out
                            })
                            .map_err(|e| anyhow!("converting {:?} to {ext}: {e:#}", asset.source));
                        (index, converted)
                    });
                }
            }

            let mut converted = Vec::new();
            let mut first_err = None;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((index, Ok(asset))) => converted.push((index, asset)),
                    Ok((_, Err(e))) => {
                        first_err.get_or_insert(e);
                    }
                    Err(e) => {
                        first_err.get_or_insert(anyhow!("font conversion panicked: {e}"));
                    }
                }
            }

            converted.sort_by_key(|(index, _)| *index);
            for (_, asset) in converted {
                keep_first(&mut outputs, asset);
            }

            match first_err {
                Some(e) => Err(e),
                None => Ok(outputs.into_values().collect()),
            }
        })
    }
}

fn keep_first(outputs: &mut BTreeMap<PathBuf, Asset>, asset: Asset) {
    match outputs.get(&asset.relative) {
        Some(kept) => warn!(
            output = ?asset.relative,
            kept = ?kept.source,
            dropped = ?asset.source,
            "two fonts map to the same output; keeping the first"
        ),
        None => {
            outputs.insert(asset.relative.clone(), asset);
        }
    }
}
