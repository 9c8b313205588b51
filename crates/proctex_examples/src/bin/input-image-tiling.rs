use glam::Vec4;
use proctex::prelude::*;
use proctex_examples::{init_tracing, save_png};

/// Renders a small tile to disk, then samples it back through an `Input Image` node
/// with a Rect window so it repeats across the output.
fn main() -> anyhow::Result<()> {
    init_tracing();

    // Source tile: a blended checker.
    let mut tile_graph = TextureGraph::new();
    let checker = tile_graph.add(NodeKind::Checkerboard);
    tile_graph.set_input_default_by_name(checker, "Scale", 2.0)?;
    let color = tile_graph.add(NodeKind::SolidColor);
    tile_graph.set_input_default_by_name(color, "Color", Vec4::new(0.85, 0.55, 0.3, 1.0))?;
    let mul = tile_graph.add(NodeKind::BlendMultiply);
    tile_graph.add_link(color, 0, mul, 0)?;
    tile_graph.add_link(checker, 0, mul, 1)?;
    let tile_out = tile_graph.add(NodeKind::TextureOutput);
    tile_graph.add_link(mul, 0, tile_out, 0)?;

    let tile_path = "input-image-tile.png";
    let mut tile_ctx = EvalContext::try_new(EvalConfig::new(64))?;
    save_png(&tile_ctx.render(&tile_graph).image, tile_path)?;

    // Tiled output: the image node reads the file, Rect repeats it 3x3.
    let mut graph = TextureGraph::new();
    let img = graph.add(NodeKind::InputImage);
    graph.set_input_default_by_name(img, "Path", tile_path)?;

    let rect = graph.add(NodeKind::Rect);
    graph.add_link(img, 0, rect, 0)?;
    graph.set_input_default_by_name(rect, "Width", 3.0)?;
    graph.set_input_default_by_name(rect, "Height", 3.0)?;

    let out = graph.add(NodeKind::TextureOutput);
    graph.add_link(rect, 0, out, 0)?;

    let config = EvalConfig::new(384).with_sampler_budget(Some(4 * 1024 * 1024));
    let mut ctx = EvalContext::try_new(config)?;
    let composite = ctx.render(&graph);
    tracing::info!(
        "Sampler cache: {} entries, {} bytes, {} decodes.",
        ctx.sampler().len(),
        ctx.sampler().bytes(),
        ctx.sampler().decode_count()
    );
    save_png(&composite.image, "input-image-tiling.png")?;
    Ok(())
}
