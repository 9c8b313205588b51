use proctex::prelude::*;
use proctex_examples::{init_tracing, save_png, save_thumbnails};

/// Fractal noise tinted between two colors through Colorize and Levels.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut graph = TextureGraph::new();
    let noise = graph.add(NodeKind::PerlinNoise);
    graph.set_input_default_by_name(noise, "Scale", 6.0)?;
    graph.set_input_default_by_name(noise, "Octaves", 6.0)?;

    // Stretch the mid tones before coloring.
    let levels = graph.add(NodeKind::Levels);
    graph.add_link(noise, 0, levels, 0)?;
    graph.set_input_default_by_name(levels, "Min", 0.3)?;
    graph.set_input_default_by_name(levels, "Max", 0.7)?;
    graph.set_input_default_by_name(levels, "Gamma", 1.2)?;

    let colorize = graph.add(NodeKind::Colorize);
    graph.add_link(levels, 0, colorize, 0)?;
    graph.set_input_default_by_name(colorize, "Color", glam::Vec4::new(0.95, 0.75, 0.45, 1.0))?;

    let out = graph.add(NodeKind::TextureOutput);
    graph.add_link(colorize, 0, out, 0)?;

    let mut ctx = EvalContext::try_new(EvalConfig::new(512))?;
    let composite = ctx.render(&graph);
    save_png(&composite.image, "generators-perlin-fbm.png")?;
    save_thumbnails(&ctx, &[noise, levels], "generators-perlin-fbm-thumb")?;
    Ok(())
}
