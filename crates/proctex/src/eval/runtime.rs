//! Runtime for evaluating texture programs into node buffers.
//!
//! [`TextureRuntime`] runs a compiled [`TextureProgram`] against an [`EvalContext`]:
//! nodes are evaluated in schedule order, each one writing a full buffer at the
//! context's resolution, so consumers only ever read finished upstream buffers.
//! Evaluation never fails; configuration problems degrade to sentinel colors and
//! numeric degeneracies are normalized before use.
use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};
use tracing::{debug, warn};

use crate::eval::context::{CyclePolicy, EvalContext};
use crate::eval::events::{EvalEvent, EvalEventKind, EventSink};
use crate::eval::kernels::{self, BlendMode};
use crate::eval::raster::{pixel_uv, NodeBuffer};
use crate::eval::sampler::SamplerEntry;
use crate::texgraph::{
    broadcast, InputSource, NodeId, NodeKind, NodeMeta, ProgramCompiler, TextureGraph,
    TextureProgram,
};

/// Color written for unknown node types, failed image loads, and missing buffers.
pub const MAGENTA: Vec4 = Vec4::new(1.0, 0.0, 1.0, 1.0);

/// Color of an `Input Image` node without a path.
pub const UNSET_IMAGE: Vec4 = Vec4::new(0.5, 0.5, 0.5, 1.0);

/// Summary of one evaluation pass.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Side length of the buffers written by this pass.
    pub resolution: u32,
    /// Nodes evaluated, in evaluation order.
    pub evaluated: Vec<NodeId>,
    /// Nodes left out because they sit on or behind a cycle.
    pub skipped: Vec<NodeId>,
    /// Whether the pass was abandoned under [`CyclePolicy::Reject`].
    pub rejected: bool,
}

impl PassReport {
    /// Whether every node of the graph was evaluated.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && !self.rejected
    }
}

/// Runtime for evaluating one compiled program against an evaluation context.
pub struct TextureRuntime<'a> {
    pub program: TextureProgram,
    ctx: &'a mut EvalContext,
}

impl<'a> TextureRuntime<'a> {
    /// Compiles `graph` and binds it to `ctx`.
    pub fn new(graph: &TextureGraph, ctx: &'a mut EvalContext) -> Self {
        Self::from_program(ProgramCompiler::compile(graph), ctx)
    }

    pub fn from_program(program: TextureProgram, ctx: &'a mut EvalContext) -> Self {
        Self { program, ctx }
    }

    #[inline]
    pub fn context(&self) -> &EvalContext {
        &*self.ctx
    }

    /// Evaluates one node into its buffer, reading whatever upstream buffers exist.
    ///
    /// Returns `false` if the node is not part of the program. Inputs whose producer
    /// has no buffer read as magenta.
    pub fn evaluate_node_to_buffer(&mut self, id: NodeId) -> bool {
        let Some(meta) = self.program.nodes.get(&id) else {
            warn!("Cannot evaluate unknown node {}.", id);
            return false;
        };

        let mut buf = self.ctx.take_buffer(id);
        let res = self.ctx.resolution();
        match meta.kind {
            Some(NodeKind::InputImage) => {
                let image = match meta.path.as_deref() {
                    Some(path) if !path.is_empty() => Some(self.ctx.sampler.load(path)),
                    _ => None,
                };
                let inputs = Inputs::new(meta, &self.ctx.buffers);
                fill_image(&mut buf, &inputs, image, res);
            }
            Some(kind) => {
                let inputs = Inputs::new(meta, &self.ctx.buffers);
                fill_with(&mut buf, res, |uv| shade(kind, &inputs, uv, res));
            }
            None => buf.fill(MAGENTA),
        }
        self.ctx.put_buffer(id, buf);
        true
    }

    /// Runs a full pass: every scheduled node is evaluated once, producers first.
    pub fn evaluate_graph_to_buffers(&mut self) -> PassReport {
        self.evaluate_graph_to_buffers_with_events(&mut ())
    }

    pub fn evaluate_graph_to_buffers_with_events(
        &mut self,
        sink: &mut dyn EventSink,
    ) -> PassReport {
        let resolution = self.ctx.resolution();
        self.ctx.sampler.begin_pass();

        let nodes = &self.program.nodes;
        self.ctx.buffers.retain(|id, _| nodes.contains_key(id));

        if sink.wants(EvalEventKind::PassStarted) {
            sink.send(EvalEvent::PassStarted {
                resolution,
                scheduled: self.program.schedule.order.len(),
            });
        }

        let mut report = PassReport {
            resolution,
            ..Default::default()
        };

        let skipped = self.program.schedule.unscheduled.clone();
        if !skipped.is_empty() {
            warn!(
                "Graph contains a cycle; {} node(s) not evaluated: {:?}.",
                skipped.len(),
                skipped
            );
            for id in &skipped {
                self.ctx.buffers.remove(id);
            }
            if sink.wants(EvalEventKind::NodesSkipped) {
                sink.send(EvalEvent::NodesSkipped {
                    ids: skipped.clone(),
                });
            }
            report.skipped = skipped;

            if self.ctx.config().cycle_policy == CyclePolicy::Reject {
                self.ctx.clear_buffers();
                report.rejected = true;
                return finish(report, sink);
            }
        }

        let order = self.program.schedule.order.clone();
        for id in order {
            if !self.evaluate_node_to_buffer(id) {
                continue;
            }
            report.evaluated.push(id);
            if sink.wants(EvalEventKind::NodeEvaluated) {
                let kind = self.program.nodes.get(&id).and_then(|m| m.kind);
                sink.send(EvalEvent::NodeEvaluated { id, kind });
            }
        }

        debug!(
            "Pass at {}x{}: {} evaluated, {} skipped.",
            resolution,
            resolution,
            report.evaluated.len(),
            report.skipped.len()
        );
        finish(report, sink)
    }
}

fn finish(report: PassReport, sink: &mut dyn EventSink) -> PassReport {
    if sink.wants(EvalEventKind::PassFinished) {
        sink.send(EvalEvent::PassFinished {
            report: report.clone(),
        });
    }
    report
}

impl EvalContext {
    /// Compiles `graph` and runs one pass over it.
    pub fn evaluate(&mut self, graph: &TextureGraph) -> PassReport {
        TextureRuntime::new(graph, self).evaluate_graph_to_buffers()
    }

    pub fn evaluate_with_events(
        &mut self,
        graph: &TextureGraph,
        sink: &mut dyn EventSink,
    ) -> PassReport {
        TextureRuntime::new(graph, self).evaluate_graph_to_buffers_with_events(sink)
    }
}

/// Read access to a node's input pins for one pass.
struct Inputs<'p> {
    meta: &'p NodeMeta,
    buffers: &'p HashMap<NodeId, NodeBuffer>,
}

impl<'p> Inputs<'p> {
    fn new(meta: &'p NodeMeta, buffers: &'p HashMap<NodeId, NodeBuffer>) -> Self {
        Self { meta, buffers }
    }

    fn connected(&self, pin: usize) -> bool {
        self.meta.input(pin).is_some_and(InputSource::is_connected)
    }

    fn sample_buffer(&self, node: NodeId, uv: Vec2) -> Vec4 {
        match self.buffers.get(&node) {
            Some(buf) if !buf.is_empty() => buf.sample(uv),
            _ => MAGENTA,
        }
    }

    fn color(&self, pin: usize, uv: Vec2) -> Vec4 {
        match self.meta.input(pin) {
            Some(InputSource::Buffer { node, view }) => view.apply(self.sample_buffer(*node, uv)),
            Some(InputSource::Literal(v)) => v.as_color(),
            None => Vec4::ONE,
        }
    }

    fn float(&self, pin: usize, uv: Vec2) -> f32 {
        match self.meta.input(pin) {
            Some(InputSource::Buffer { .. }) => self.color(pin, uv).x,
            Some(InputSource::Literal(v)) => v.as_float(),
            None => 0.0,
        }
    }

    fn vec2(&self, pin: usize, uv: Vec2) -> Vec2 {
        match self.meta.input(pin) {
            Some(InputSource::Buffer { .. }) => self.color(pin, uv).truncate().truncate(),
            Some(InputSource::Literal(v)) => v.as_vec2(),
            None => Vec2::ZERO,
        }
    }

    /// Coordinate input of generators: the pixel coordinate unless the pin is linked.
    fn uv(&self, pin: usize, uv: Vec2) -> Vec2 {
        if self.connected(pin) {
            self.vec2(pin, uv)
        } else {
            uv
        }
    }
}

fn fill_with(buf: &mut NodeBuffer, res: u32, mut f: impl FnMut(Vec2) -> Vec4) {
    let pixels = buf.pixels_mut();
    for y in 0..res {
        for x in 0..res {
            pixels[(y as usize) * (res as usize) + x as usize] = f(pixel_uv(x, y, res));
        }
    }
}

fn fill_image(buf: &mut NodeBuffer, inputs: &Inputs, image: Option<Arc<SamplerEntry>>, res: u32) {
    let Some(image) = image else {
        buf.fill(UNSET_IMAGE);
        return;
    };
    if image.is_empty() {
        buf.fill(MAGENTA);
        return;
    }
    fill_with(buf, res, |uv| image.sample(inputs.uv(0, uv)));
}

#[inline]
fn gray(v: f32) -> Vec4 {
    broadcast(v)
}

/// Computes one pixel of a node of kind `kind`.
fn shade(kind: NodeKind, inputs: &Inputs, uv: Vec2, res: u32) -> Vec4 {
    match kind {
        NodeKind::PerlinNoise => {
            let p = inputs.uv(0, uv);
            let scale = positive_or(inputs.float(1, uv), 4.0);
            let octaves = inputs.float(2, uv);
            let octaves = if octaves > 0.0 { octaves as u32 } else { 4 };
            gray(kernels::fbm(p * scale, octaves.clamp(1, 8)))
        }
        NodeKind::Checkerboard => {
            let p = inputs.uv(0, uv);
            let scale = positive_or(inputs.float(1, uv), 8.0);
            let cell = (p * scale).floor();
            let parity = (cell.x as i64).wrapping_add(cell.y as i64).rem_euclid(2);
            gray(if parity == 0 { 1.0 } else { 0.0 })
        }
        NodeKind::Gradient => {
            let p = inputs.uv(0, uv);
            let a = inputs.color(1, uv);
            let b = inputs.color(2, uv);
            a.lerp(b, p.x.clamp(0.0, 1.0))
        }
        NodeKind::SolidColor | NodeKind::TextureOutput | NodeKind::ChannelSplit => {
            inputs.color(0, uv)
        }
        NodeKind::Voronoi => {
            let p = inputs.uv(0, uv);
            let scale = positive_or(inputs.float(1, uv), 4.0);
            let randomness = positive_or(inputs.float(2, uv), 1.0);
            gray(kernels::voronoi(p * scale, randomness))
        }
        NodeKind::Constant => gray(inputs.float(0, uv)),

        NodeKind::Add => gray(inputs.float(0, uv) + inputs.float(1, uv)),
        NodeKind::Multiply => gray(inputs.float(0, uv) * inputs.float(1, uv)),
        NodeKind::Lerp => {
            let a = inputs.float(0, uv);
            let b = inputs.float(1, uv);
            let t = inputs.float(2, uv).clamp(0.0, 1.0);
            gray(a + (b - a) * t)
        }
        NodeKind::Clamp => {
            let v = inputs.float(0, uv);
            let lo = inputs.float(1, uv);
            let mut hi = inputs.float(2, uv);
            if hi <= lo {
                hi = 1.0;
            }
            // `f32::clamp` panics when lo > hi, which a lo above 1 still allows.
            gray(v.max(lo).min(hi))
        }
        NodeKind::Remap => {
            let v = inputs.float(0, uv);
            let in_min = inputs.float(1, uv);
            let mut in_max = inputs.float(2, uv);
            let out_min = inputs.float(3, uv);
            let out_max = inputs.float(4, uv);
            if (in_max - in_min).abs() < 1e-4 {
                in_max = in_min + 1.0;
            }
            let t = (v - in_min) / (in_max - in_min);
            gray(out_min + t * (out_max - out_min))
        }
        NodeKind::Power => {
            let base = inputs.float(0, uv).max(0.0);
            let mut exponent = inputs.float(1, uv);
            if exponent == 0.0 {
                exponent = 1.0;
            }
            // A zero base with a negative exponent is infinite.
            let r = base.powf(exponent);
            gray(if r.is_finite() { r } else { 0.0 })
        }

        NodeKind::Invert => {
            let c = inputs.color(0, uv);
            (Vec3::ONE - c.truncate()).extend(c.w)
        }
        NodeKind::Levels => {
            let c = inputs.color(0, uv);
            let mut lo = inputs.float(1, uv);
            let mut hi = inputs.float(2, uv);
            let mut gamma = inputs.float(3, uv);
            if hi <= lo {
                lo = 0.0;
                hi = 1.0;
            }
            if gamma <= 0.0 {
                gamma = 1.0;
            }
            let apply = |v: f32| ((v - lo) / (hi - lo)).clamp(0.0, 1.0).powf(1.0 / gamma);
            Vec4::new(apply(c.x), apply(c.y), apply(c.z), c.w)
        }
        NodeKind::Blur => {
            let radius = inputs.float(1, uv);
            if radius <= 0.0 {
                return inputs.color(0, uv);
            }
            let step = radius / res as f32;
            let mut acc = Vec4::ZERO;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    acc += inputs.color(0, uv + Vec2::new(dx as f32, dy as f32) * step);
                }
            }
            acc / 9.0
        }
        NodeKind::Rect => {
            let x = inputs.float(1, uv);
            let y = inputs.float(2, uv);
            let w = positive_or(inputs.float(3, uv), 1.0);
            let h = positive_or(inputs.float(4, uv), 1.0);
            inputs.color(0, Vec2::new(x + uv.x * w, y + uv.y * h))
        }

        NodeKind::HsvAdjust => {
            let c = inputs.color(0, uv);
            let offset = Vec3::new(inputs.float(1, uv), inputs.float(2, uv), inputs.float(3, uv));
            let mut hsv = kernels::rgb_to_hsv(c.truncate());
            hsv.x = (hsv.x + offset.x) % 1.0;
            if hsv.x < 0.0 {
                hsv.x += 1.0;
            }
            hsv.y = (hsv.y + offset.y).clamp(0.0, 1.0);
            hsv.z = (hsv.z + offset.z).clamp(0.0, 1.0);
            kernels::hsv_to_rgb(hsv).extend(c.w)
        }
        NodeKind::ChannelMerge => {
            let a = inputs.float(3, uv);
            Vec4::new(
                inputs.float(0, uv),
                inputs.float(1, uv),
                inputs.float(2, uv),
                positive_or(a, 1.0),
            )
        }
        NodeKind::Colorize => {
            let v = inputs.float(0, uv).clamp(0.0, 1.0);
            inputs.color(1, uv) * v
        }

        NodeKind::BlendMultiply => blend(BlendMode::Multiply, inputs, uv),
        NodeKind::BlendScreen => blend(BlendMode::Screen, inputs, uv),
        NodeKind::BlendOverlay => blend(BlendMode::Overlay, inputs, uv),
        NodeKind::BlendAdd => blend(BlendMode::Add, inputs, uv),

        // Image nodes are filled in `fill_image`.
        NodeKind::InputImage => MAGENTA,
    }
}

#[inline]
fn blend(mode: BlendMode, inputs: &Inputs, uv: Vec2) -> Vec4 {
    kernels::blend(mode, inputs.color(0, uv), inputs.color(1, uv))
}

/// `v` when strictly positive, otherwise `fallback`.
#[inline]
fn positive_or(v: f32, fallback: f32) -> f32 {
    if v > 0.0 {
        v
    } else {
        fallback
    }
}
