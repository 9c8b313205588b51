use glam::Vec4;
use proctex::prelude::*;
use proctex_examples::{init_tracing, save_png};

/// Voronoi cells overlaid on a checkerboard and softened with a blur.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut graph = TextureGraph::new();

    let cells = graph.add(NodeKind::Voronoi);
    graph.set_input_default_by_name(cells, "Scale", 8.0)?;
    graph.set_input_default_by_name(cells, "Randomness", 0.8)?;

    let checker = graph.add(NodeKind::Checkerboard);
    graph.set_input_default_by_name(checker, "Scale", 4.0)?;

    let tint = graph.add(NodeKind::Colorize);
    graph.add_link(checker, 0, tint, 0)?;
    graph.set_input_default_by_name(tint, "Color", Vec4::new(0.2, 0.45, 0.8, 1.0))?;

    let overlay = graph.add(NodeKind::BlendOverlay);
    graph.add_link(tint, 0, overlay, 0)?;
    graph.add_link(cells, 0, overlay, 1)?;

    let blur = graph.add(NodeKind::Blur);
    graph.add_link(overlay, 0, blur, 0)?;
    graph.set_input_default_by_name(blur, "Radius", 1.5)?;

    let out = graph.add(NodeKind::TextureOutput);
    graph.add_link(blur, 0, out, 0)?;

    let mut ctx = EvalContext::try_new(EvalConfig::new(512))?;
    let mut sink = VecSink::new();
    let report = ctx.evaluate_with_events(&graph, &mut sink);
    tracing::info!(
        "Evaluated {} nodes, {} events.",
        report.evaluated.len(),
        sink.len()
    );

    let composite = OutputCompositor::compose(&ctx, OutputCompositor::find_sink(&graph));
    save_png(&composite.image, "blend-overlay-voronoi.png")?;
    Ok(())
}
