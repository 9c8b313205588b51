use glam::Vec4;
use proctex::prelude::*;
use proctex_examples::{init_tracing, save_png};

/// Splits a gradient into channels, rebuilds it with red and blue swapped,
/// and shifts the hue of the result.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut graph = TextureGraph::new();
    let gradient = graph.add(NodeKind::Gradient);
    graph.set_input_default_by_name(gradient, "ColorA", Vec4::new(0.9, 0.2, 0.1, 1.0))?;
    graph.set_input_default_by_name(gradient, "ColorB", Vec4::new(0.1, 0.3, 0.9, 1.0))?;

    let split = graph.add(NodeKind::ChannelSplit);
    graph.add_link(gradient, 0, split, 0)?;

    // Split outputs are R, G, B, A; merge inputs are R, G, B, A.
    let merge = graph.add(NodeKind::ChannelMerge);
    graph.add_link(split, 2, merge, 0)?;
    graph.add_link(split, 1, merge, 1)?;
    graph.add_link(split, 0, merge, 2)?;

    let hsv = graph.add(NodeKind::HsvAdjust);
    graph.add_link(merge, 0, hsv, 0)?;
    graph.set_input_default_by_name(hsv, "H", 0.1)?;
    graph.set_input_default_by_name(hsv, "S", -0.2)?;

    let out = graph.add(NodeKind::TextureOutput);
    graph.add_link(hsv, 0, out, 0)?;

    let mut ctx = EvalContext::try_new(EvalConfig::new(256))?;
    let composite = ctx.render(&graph);
    tracing::info!("Preview color: {}", composite.preview_color);
    save_png(&composite.image, "color-channel-split.png")?;
    Ok(())
}
