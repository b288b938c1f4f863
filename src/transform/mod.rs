// src/transform/mod.rs

//! Transformation stages.
//!
//! Every stage implements [`Transform`]: it takes the whole batch of assets
//! and returns a new batch. Stages may map files one-to-one (minifiers,
//! image optimizers), merge them (concatenation, sprite packing) or fan out
//! (font conversion to several formats).
//!
//! - [`include`]: `@@include(...)` partial resolution for markup.
//! - [`concat`]: bundle all assets into one file.
//! - [`command`]: pipe each asset through an external program.
//! - [`css`]: vendor prefixing, media-query grouping and minification.
//! - [`image`]: PNG/JPEG/SVG optimization.
//! - [`sprite`]: SVG stack sprite.
//! - [`font`]: font format conversion.

pub mod command;
pub mod concat;
pub mod css;
pub mod font;
pub mod image;
pub mod include;
pub mod sprite;

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};

use crate::pipeline::Asset;

pub use self::command::CommandTransform;
pub use self::concat::Concat;
pub use self::css::{Autoprefix, GroupMediaQueries, MinifyCss};
pub use self::font::ConvertFonts;
pub use self::image::OptimizeImages;
pub use self::include::IncludePartials;
pub use self::sprite::SvgSprite;

pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Asset>>> + Send + 'a>>;

/// A `batch -> batch` stage in a pipeline.
pub trait Transform: Send + Sync {
    /// Stage name used in logs and error messages.
    fn name(&self) -> &str;

    fn apply(&self, assets: Vec<Asset>) -> TransformFuture<'_>;
}

/// Apply a CPU-bound per-asset function on the blocking pool.
pub(crate) async fn map_blocking<F>(assets: Vec<Asset>, f: F) -> Result<Vec<Asset>>
where
    F: Fn(Asset) -> Result<Asset> + Send + 'static,
{
    tokio::task::spawn_blocking(move || assets.into_iter().map(f).collect::<Result<Vec<_>>>())
        .await
        .context("transform worker panicked")?
}
