//! Output compositing: turns the sink node's buffer into displayable 8-bit RGBA.
use glam::Vec4;
use tracing::warn;

use crate::eval::context::EvalContext;
use crate::eval::raster::{texel_index, NodeBuffer};
use crate::eval::runtime::{TextureRuntime, MAGENTA};
use crate::texgraph::{NodeId, NodeKind, ProgramCompiler, TextureGraph};

/// Clamps a color to `[0, 1]` and quantizes it to 8-bit RGBA by truncation.
#[inline]
pub fn quantize(c: Vec4) -> [u8; 4] {
    let c = c.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}

/// Row-major 8-bit RGBA image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl OutputImage {
    /// A `size` x `size` image of one color.
    pub fn filled(size: u32, color: Vec4) -> Self {
        let texel = quantize(color);
        let count = (size as usize) * (size as usize);
        Self {
            width: size,
            height: size,
            pixels: texel.repeat(count),
        }
    }

    fn from_buffer(buf: &NodeBuffer) -> Self {
        let mut pixels = Vec::with_capacity(buf.pixels().len() * 4);
        for c in buf.pixels() {
            pixels.extend_from_slice(&quantize(*c));
        }
        Self {
            width: buf.width(),
            height: buf.height(),
            pixels,
        }
    }

    /// RGBA bytes of pixel `(x, y)`, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.pixels.get(i..i + 4)?.try_into().ok()
    }
}

/// Result of compositing a pass.
#[derive(Clone, Debug)]
pub struct Composite {
    pub image: OutputImage,
    /// Unclamped centre pixel of the sink buffer.
    pub preview_color: Vec4,
    /// The sink node used, if any.
    pub sink: Option<NodeId>,
}

impl Composite {
    /// Whether a sink buffer was found. Without one the image is solid magenta.
    #[inline]
    pub fn has_output(&self) -> bool {
        self.sink.is_some()
    }
}

/// Locates the graph sink and converts buffers to 8-bit images.
pub struct OutputCompositor;

impl OutputCompositor {
    /// The first `Texture Output` node in insertion order.
    pub fn find_sink(graph: &TextureGraph) -> Option<NodeId> {
        let mut sinks = graph
            .nodes()
            .iter()
            .filter(|n| n.kind().is_some_and(NodeKind::is_sink));
        let first = sinks.next().map(|n| n.id);
        let others = sinks.count();
        if others > 0 {
            warn!(
                "Graph has {} Texture Output nodes; using node {:?}.",
                others + 1,
                first
            );
        }
        first
    }

    /// Builds the output image from the buffer of `sink`.
    ///
    /// A missing sink or a sink without a buffer yields a magenta image at the context's
    /// resolution and a magenta preview color.
    pub fn compose(ctx: &EvalContext, sink: Option<NodeId>) -> Composite {
        let buffer = sink.and_then(|id| ctx.buffer(id)).filter(|b| !b.is_empty());
        match buffer {
            Some(buf) => Composite {
                image: OutputImage::from_buffer(buf),
                preview_color: buf.center(),
                sink,
            },
            None => {
                if sink.is_none() {
                    warn!("Graph has no Texture Output node.");
                }
                Composite {
                    image: OutputImage::filled(ctx.resolution(), MAGENTA),
                    preview_color: MAGENTA,
                    sink: None,
                }
            }
        }
    }

    /// Nearest-neighbour resample of `node`'s buffer to `size` x `size`, clamped and
    /// quantized. `None` when the node has no buffer.
    pub fn thumbnail(ctx: &EvalContext, node: NodeId, size: u32) -> Option<OutputImage> {
        let buf = ctx.buffer(node).filter(|b| !b.is_empty())?;
        let size = size.max(1);
        let step = 1.0 / size as f32;
        let mut pixels = Vec::with_capacity((size as usize) * (size as usize) * 4);
        for y in 0..size {
            for x in 0..size {
                let sx = texel_index((x as f32 + 0.5) * step, buf.width());
                let sy = texel_index((y as f32 + 0.5) * step, buf.height());
                pixels.extend_from_slice(&quantize(buf.get(sx, sy)));
            }
        }
        Some(OutputImage {
            width: size,
            height: size,
            pixels,
        })
    }
}

impl EvalContext {
    /// Runs one pass over `graph` and composites its sink.
    pub fn render(&mut self, graph: &TextureGraph) -> Composite {
        let program = ProgramCompiler::compile(graph);
        let sink = program.sink;
        TextureRuntime::from_program(program, self).evaluate_graph_to_buffers();
        OutputCompositor::compose(self, sink)
    }

    /// Thumbnail of `node` at the configured thumbnail size.
    pub fn thumbnail(&self, node: NodeId) -> Option<OutputImage> {
        OutputCompositor::thumbnail(self, node, self.config().thumbnail_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::context::EvalConfig;

    fn constant(graph: &mut TextureGraph, v: f32) -> NodeId {
        let id = graph.add(NodeKind::Constant);
        graph.set_input_default(id, 0, v).unwrap();
        id
    }

    #[test]
    fn quantize_clamps_then_truncates() {
        assert_eq!(quantize(Vec4::new(8.0, -1.0, 0.5, 1.0)), [255, 0, 127, 255]);
    }

    #[test]
    fn constant_sum_quantizes_to_white() {
        let mut graph = TextureGraph::new();
        let a = constant(&mut graph, 5.0);
        let b = constant(&mut graph, 3.0);
        let add = graph.add(NodeKind::Add);
        let out = graph.add(NodeKind::TextureOutput);
        graph.add_link(a, 0, add, 0).unwrap();
        graph.add_link(b, 0, add, 1).unwrap();
        graph.add_link(add, 0, out, 0).unwrap();

        let mut ctx = EvalContext::new(EvalConfig::new(1));
        let composite = ctx.render(&graph);
        assert_eq!(composite.sink, Some(out));
        assert_eq!(composite.image.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(composite.preview_color, Vec4::new(8.0, 8.0, 8.0, 1.0));
    }

    #[test]
    fn missing_sink_is_magenta() {
        let mut graph = TextureGraph::new();
        graph.add(NodeKind::Checkerboard);
        let mut ctx = EvalContext::new(EvalConfig::new(4));
        let composite = ctx.render(&graph);
        assert!(!composite.has_output());
        assert_eq!(composite.preview_color, MAGENTA);
        assert_eq!(composite.image.pixels.len(), 4 * 4 * 4);
        assert_eq!(composite.image.pixel(3, 3), Some([255, 0, 255, 255]));
    }

    #[test]
    fn sink_inside_a_cycle_is_magenta() {
        let mut graph = TextureGraph::new();
        let a = graph.add(NodeKind::Invert);
        let out = graph.add(NodeKind::TextureOutput);
        graph.add_link(a, 0, out, 0).unwrap();
        graph.add_link(out, 0, a, 0).unwrap();
        let mut ctx = EvalContext::new(EvalConfig::new(2));
        let composite = ctx.render(&graph);
        assert_eq!(composite.preview_color, MAGENTA);
    }

    #[test]
    fn render_uses_the_first_of_several_sinks() {
        let mut graph = TextureGraph::new();
        let v = constant(&mut graph, 0.25);
        let first = graph.add(NodeKind::TextureOutput);
        let second = graph.add(NodeKind::TextureOutput);
        graph.add_link(v, 0, first, 0).unwrap();
        let mut ctx = EvalContext::new(EvalConfig::new(2));
        let composite = ctx.render(&graph);
        assert_eq!(composite.sink, Some(first));
        assert!(ctx.buffer(second).is_some());
        assert_eq!(composite.preview_color, Vec4::new(0.25, 0.25, 0.25, 1.0));
    }

    #[test]
    fn first_sink_wins() {
        let mut graph = TextureGraph::new();
        let first = graph.add(NodeKind::TextureOutput);
        graph.add(NodeKind::TextureOutput);
        assert_eq!(OutputCompositor::find_sink(&graph), Some(first));
    }

    #[test]
    fn thumbnails_resample_any_node() {
        let mut graph = TextureGraph::new();
        let checker = graph.add(NodeKind::Checkerboard);
        graph.set_input_default(checker, 1, 2.0).unwrap();
        let mut ctx = EvalContext::new(EvalConfig::new(32).with_thumbnail_size(4));
        ctx.evaluate(&graph);

        let thumb = ctx.thumbnail(checker).expect("buffer exists");
        assert_eq!((thumb.width, thumb.height), (4, 4));
        assert_eq!(thumb.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(thumb.pixel(2, 0), Some([0, 0, 0, 255]));
        assert!(ctx.thumbnail(999).is_none());
    }

    #[test]
    fn pixel_out_of_bounds_is_none() {
        let img = OutputImage::filled(2, Vec4::ONE);
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.pixel(1, 1), Some([255; 4]));
    }
}
