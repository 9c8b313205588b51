use std::path::Path;

use anyhow::{anyhow, Context};
use proctex::prelude::{EvalContext, NodeId, OutputImage};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Writes an 8-bit RGBA image as PNG.
pub fn save_png(img: &OutputImage, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let buffer = image::RgbaImage::from_raw(img.width, img.height, img.pixels.clone())
        .ok_or_else(|| anyhow!("pixel data does not match {}x{}", img.width, img.height))?;
    buffer
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(
        "Wrote {} ({}x{}).",
        path.display(),
        img.width,
        img.height
    );
    Ok(())
}

/// Writes a thumbnail of each node as `<prefix>-<id>.png`. Nodes without a buffer are skipped.
pub fn save_thumbnails(ctx: &EvalContext, nodes: &[NodeId], prefix: &str) -> anyhow::Result<()> {
    for &id in nodes {
        if let Some(thumb) = ctx.thumbnail(id) {
            save_png(&thumb, format!("{prefix}-{id}.png"))?;
        }
    }
    Ok(())
}
