//! Compiled representation of a texture graph.
//!
//! [`ProgramCompiler::compile`] resolves everything the per-pixel path would otherwise
//! look up repeatedly: type names become [`NodeKind`]s, every input pin becomes an
//! [`InputSource`] (a producer buffer or a literal), and the evaluation order and sink
//! are fixed. A program is a snapshot; recompile after editing the graph.
use std::collections::HashMap;

use tracing::warn;

use crate::texgraph::node::NodeKind;
use crate::texgraph::scheduler::{Schedule, Scheduler};
use crate::texgraph::spec::{Node, TextureGraph};
use crate::texgraph::value::PinValue;
use crate::texgraph::NodeId;

/// How a consumer reads a producer's buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferView {
    /// The stored color as is.
    Color,
    /// One channel of the stored color, broadcast to an opaque gray.
    Channel(usize),
}

impl BufferView {
    /// Applies the view to a sampled color.
    #[inline]
    pub fn apply(self, c: glam::Vec4) -> glam::Vec4 {
        match self {
            BufferView::Color => c,
            BufferView::Channel(i) => crate::texgraph::broadcast(c[i.min(3)]),
        }
    }
}

/// Where an input pin gets its value from.
#[derive(Clone, Debug, PartialEq)]
pub enum InputSource {
    /// Sample the buffer of an upstream node.
    Buffer { node: NodeId, view: BufferView },
    /// Unconnected pin; read its literal default.
    Literal(PinValue),
}

impl InputSource {
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, InputSource::Buffer { .. })
    }
}

/// Dispatch-ready description of one node.
#[derive(Clone, Debug)]
pub struct NodeMeta {
    pub id: NodeId,
    /// `None` when the type name is not in the catalog.
    pub kind: Option<NodeKind>,
    /// One source per input pin, padded to the kind's catalog layout.
    pub inputs: Vec<InputSource>,
    /// Resource path for image inputs.
    pub path: Option<String>,
}

impl NodeMeta {
    /// Source of input pin `pin`, if the node has one.
    #[inline]
    pub fn input(&self, pin: usize) -> Option<&InputSource> {
        self.inputs.get(pin)
    }
}

/// A compiled texture graph.
#[derive(Clone, Debug)]
pub struct TextureProgram {
    /// Node metadata keyed by node id.
    pub nodes: HashMap<NodeId, NodeMeta>,
    /// Evaluation order plus the nodes left out of it.
    pub schedule: Schedule,
    /// First `Texture Output` node in insertion order.
    pub sink: Option<NodeId>,
    /// Number of `Texture Output` nodes in the graph.
    pub sink_count: usize,
    /// Graph revision this program was compiled from.
    pub revision: u64,
}

impl TextureProgram {
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&NodeMeta> {
        self.nodes.get(&id)
    }

    /// Evaluation order of the scheduled nodes.
    #[inline]
    pub fn order(&self) -> &[NodeId] {
        &self.schedule.order
    }
}

/// Compiler from [`TextureGraph`] to [`TextureProgram`].
pub struct ProgramCompiler;

impl ProgramCompiler {
    /// Compiles a graph snapshot. Compilation never fails: unknown node types and
    /// cycles are carried into the program and handled by the evaluator.
    pub fn compile(graph: &TextureGraph) -> TextureProgram {
        let mut nodes = HashMap::with_capacity(graph.len());
        let mut sink = None;
        let mut sink_count = 0;

        for node in graph.nodes() {
            let kind = node.kind();
            if kind.is_none() {
                warn!(
                    "Node {} has unknown type '{}'; it will render magenta.",
                    node.id, node.type_name
                );
            }
            if kind.is_some_and(NodeKind::is_sink) {
                sink_count += 1;
                sink.get_or_insert(node.id);
            }

            nodes.insert(
                node.id,
                NodeMeta {
                    id: node.id,
                    kind,
                    inputs: resolve_inputs(graph, node, kind),
                    path: resolve_path(node),
                },
            );
        }

        if sink_count > 1 {
            warn!(
                "Graph has {} Texture Output nodes; using node {:?}.",
                sink_count, sink
            );
        }

        TextureProgram {
            nodes,
            schedule: Scheduler::schedule(graph),
            sink,
            sink_count,
            revision: graph.revision(),
        }
    }
}

fn resolve_inputs(graph: &TextureGraph, node: &Node, kind: Option<NodeKind>) -> Vec<InputSource> {
    let catalog = kind.map(NodeKind::default_inputs).unwrap_or_default();
    let count = node.inputs.len().max(catalog.len());

    (0..count)
        .map(|pin| {
            let producer = graph
                .input_link(node.id, pin)
                .and_then(|l| graph.node(l.from_node).map(|n| (n, l.from_pin)));
            if let Some((from, from_pin)) = producer {
                let view = match from.kind() {
                    Some(NodeKind::ChannelSplit) => BufferView::Channel(from_pin),
                    _ => BufferView::Color,
                };
                return InputSource::Buffer {
                    node: from.id,
                    view,
                };
            }

            let literal = match (node.inputs.get(pin), catalog.get(pin)) {
                (Some(p), _) => p.default.clone(),
                (None, Some(c)) => c.ty.neutral_value(),
                (None, None) => PinValue::Float(0.0),
            };
            InputSource::Literal(literal)
        })
        .collect()
}

fn resolve_path(node: &Node) -> Option<String> {
    let pin = node.inputs.iter().find(|p| p.name == "Path")?;
    pin.default.as_path().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec4};

    use super::*;
    use crate::texgraph::PinType;

    #[test]
    fn resolves_links_and_literals() {
        let mut graph = TextureGraph::new();
        let c = graph.add(NodeKind::Constant);
        let add = graph.add(NodeKind::Add);
        graph.add_link(c, 0, add, 0).unwrap();
        graph.set_input_default(add, 1, 3.0).unwrap();

        let program = ProgramCompiler::compile(&graph);
        let meta = program.node(add).expect("node compiled");
        assert_eq!(meta.kind, Some(NodeKind::Add));
        assert_eq!(
            meta.inputs[0],
            InputSource::Buffer {
                node: c,
                view: BufferView::Color
            }
        );
        assert_eq!(meta.inputs[1], InputSource::Literal(PinValue::Float(3.0)));
        assert_eq!(program.order(), &[c, add]);
    }

    #[test]
    fn channel_split_outputs_become_channel_views() {
        let mut graph = TextureGraph::new();
        let split = graph.add(NodeKind::ChannelSplit);
        let merge = graph.add(NodeKind::ChannelMerge);
        graph.add_link(split, 2, merge, 0).unwrap();

        let program = ProgramCompiler::compile(&graph);
        assert_eq!(
            program.node(merge).unwrap().inputs[0],
            InputSource::Buffer {
                node: split,
                view: BufferView::Channel(2)
            }
        );
    }

    #[test]
    fn channel_view_broadcasts_one_channel() {
        let c = Vec4::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(BufferView::Color.apply(c), c);
        assert_eq!(
            BufferView::Channel(3).apply(c),
            Vec4::new(0.4, 0.4, 0.4, 1.0)
        );
    }

    #[test]
    fn first_sink_in_insertion_order_wins() {
        let mut graph = TextureGraph::new();
        graph.add(NodeKind::SolidColor);
        let first = graph.add(NodeKind::TextureOutput);
        graph.add(NodeKind::TextureOutput);

        let program = ProgramCompiler::compile(&graph);
        assert_eq!(program.sink, Some(first));
        assert_eq!(program.sink_count, 2);
    }

    #[test]
    fn missing_pins_are_padded_with_neutral_values() {
        let mut graph = TextureGraph::new();
        let id = graph.add_node_with_pins(
            "Lerp",
            Vec2::ZERO,
            vec![crate::texgraph::Pin::input("A", PinType::Float, 0.25)],
            Vec::new(),
        );

        let program = ProgramCompiler::compile(&graph);
        let meta = program.node(id).unwrap();
        assert_eq!(meta.inputs.len(), 3);
        assert_eq!(meta.inputs[0], InputSource::Literal(PinValue::Float(0.25)));
        assert_eq!(meta.inputs[2], InputSource::Literal(PinValue::Float(0.0)));
    }

    #[test]
    fn unknown_types_compile_without_kind() {
        let mut graph = TextureGraph::new();
        let id = graph.add_node("Mystery", Vec2::ZERO);
        let program = ProgramCompiler::compile(&graph);
        assert!(program.node(id).unwrap().kind.is_none());
        assert!(program.sink.is_none());
    }

    #[test]
    fn image_path_is_taken_from_the_path_pin() {
        let mut graph = TextureGraph::new();
        let img = graph.add(NodeKind::InputImage);
        graph
            .set_input_default_by_name(img, "Path", "rock.png")
            .unwrap();
        let program = ProgramCompiler::compile(&graph);
        assert_eq!(program.node(img).unwrap().path.as_deref(), Some("rock.png"));
    }
}
