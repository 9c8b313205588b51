//! Authoring types for texture graphs: pins, nodes, links, and the graph itself.
//!
//! A [`TextureGraph`] is plain data plus the editing operations the surrounding
//! editor performs on it. The evaluator only ever reads it.
use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::texgraph::node::NodeKind;
use crate::texgraph::value::{PinDirection, PinType, PinValue};
use crate::texgraph::{LinkId, NodeId};

/// A named, typed slot on a node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Pin {
    pub name: String,
    pub ty: PinType,
    pub direction: PinDirection,
    /// Literal value read when the pin has no incoming link.
    pub default: PinValue,
}

impl Pin {
    /// Creates an input pin with a literal default.
    pub fn input(name: &str, ty: PinType, default: impl Into<PinValue>) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            direction: PinDirection::Input,
            default: default.into(),
        }
    }

    /// Creates an output pin.
    pub fn output(name: &str, ty: PinType) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            direction: PinDirection::Output,
            default: ty.neutral_value(),
        }
    }
}

/// One operator instance in the graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    /// Key of the kernel this node dispatches to.
    pub type_name: String,
    /// Editor placement; ignored by evaluation.
    pub position: Vec2,
    pub inputs: Vec<Pin>,
    pub outputs: Vec<Pin>,
}

impl Node {
    /// The kernel this node resolves to, or `None` for an unknown type name.
    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::from_type_name(&self.type_name)
    }

    /// Index of the input pin with the given name.
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == name)
    }
}

/// A directed edge from an output pin to an input pin.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub id: LinkId,
    pub from_node: NodeId,
    pub from_pin: usize,
    pub to_node: NodeId,
    pub to_pin: usize,
}

/// A texture node graph.
///
/// Node and link ids come from one counter and are never reused while the graph lives.
/// At most one link terminates at any input pin.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct TextureGraph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    next_id: u32,
    #[cfg_attr(feature = "serde", serde(skip))]
    revision: u64,
}

impl Default for TextureGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            next_id: 1,
            revision: 0,
        }
    }

    /// Adds a node with the catalog's default pins for `type_name`.
    /// Unknown type names produce a node without pins.
    pub fn add_node(&mut self, type_name: &str, position: Vec2) -> NodeId {
        let (inputs, outputs) = match NodeKind::from_type_name(type_name) {
            Some(kind) => (kind.default_inputs(), kind.default_outputs()),
            None => (Vec::new(), Vec::new()),
        };
        self.add_node_with_pins(type_name, position, inputs, outputs)
    }

    /// Adds a node of a known kind at the origin.
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        self.add_node(kind.type_name(), Vec2::ZERO)
    }

    /// Adds a node with explicit pins, e.g. when restoring a persisted graph.
    pub fn add_node_with_pins(
        &mut self,
        type_name: &str,
        position: Vec2,
        inputs: Vec<Pin>,
        outputs: Vec<Pin>,
    ) -> NodeId {
        let id = self.allocate_id();
        self.nodes.push(Node {
            id,
            type_name: type_name.to_owned(),
            position,
            inputs,
            outputs,
        });
        self.touch();
        id
    }

    /// Removes a node and every link touching it. Returns `false` if it did not exist.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(index) = self.nodes.iter().position(|n| n.id == id) else {
            return false;
        };
        self.nodes.remove(index);
        self.links.retain(|l| l.from_node != id && l.to_node != id);
        self.touch();
        true
    }

    /// Connects `from_node.outputs[from_pin]` to `to_node.inputs[to_pin]`.
    ///
    /// An existing link into the same input pin is replaced.
    pub fn add_link(
        &mut self,
        from_node: NodeId,
        from_pin: usize,
        to_node: NodeId,
        to_pin: usize,
    ) -> Result<LinkId> {
        if from_node == to_node {
            return Err(Error::InvalidLink(format!(
                "node {from_node} cannot feed itself"
            )));
        }
        let from = self
            .node(from_node)
            .ok_or(Error::UnknownNode { id: from_node })?;
        let to = self.node(to_node).ok_or(Error::UnknownNode { id: to_node })?;

        let Some(out_pin) = from.outputs.get(from_pin) else {
            return Err(Error::InvalidLink(format!(
                "node {from_node} has no output pin {from_pin}"
            )));
        };
        let Some(in_pin) = to.inputs.get(to_pin) else {
            return Err(Error::InvalidLink(format!(
                "node {to_node} has no input pin {to_pin}"
            )));
        };
        if out_pin.direction != PinDirection::Output || in_pin.direction != PinDirection::Input {
            return Err(Error::InvalidLink(format!(
                "pin directions do not run output to input ({from_node}:{from_pin} -> {to_node}:{to_pin})"
            )));
        }
        if !out_pin.ty.can_feed(in_pin.ty) {
            return Err(Error::InvalidLink(format!(
                "{:?} output '{}' cannot feed {:?} input '{}'",
                out_pin.ty, out_pin.name, in_pin.ty, in_pin.name
            )));
        }

        self.links
            .retain(|l| !(l.to_node == to_node && l.to_pin == to_pin));

        let id = self.allocate_id();
        self.links.push(Link {
            id,
            from_node,
            from_pin,
            to_node,
            to_pin,
        });
        self.touch();
        Ok(id)
    }

    /// Removes a link. Returns `false` if it did not exist.
    pub fn remove_link(&mut self, id: LinkId) -> bool {
        let before = self.links.len();
        self.links.retain(|l| l.id != id);
        let removed = self.links.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Sets the literal default of an input pin.
    pub fn set_input_default(
        &mut self,
        node: NodeId,
        pin: usize,
        value: impl Into<PinValue>,
    ) -> Result<()> {
        let n = self.node_mut(node).ok_or(Error::UnknownNode { id: node })?;
        let Some(p) = n.inputs.get_mut(pin) else {
            return Err(Error::InvalidConfig(format!(
                "node {node} has no input pin {pin}"
            )));
        };
        p.default = value.into();
        Ok(())
    }

    /// Sets the literal default of the input pin called `name`.
    pub fn set_input_default_by_name(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<PinValue>,
    ) -> Result<()> {
        let pin = self
            .node(node)
            .ok_or(Error::UnknownNode { id: node })?
            .input_index(name)
            .ok_or_else(|| Error::InvalidConfig(format!("node {node} has no input '{name}'")))?;
        self.set_input_default(node, pin, value)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Mutable access to a node. Counts as an edit for [`TextureGraph::revision`].
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        self.touch();
        self.nodes.get_mut(index)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// The link feeding `node.inputs[pin]`, if any.
    pub fn input_link(&self, node: NodeId, pin: usize) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.to_node == node && l.to_pin == pin)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Links in insertion order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Counter bumped by every edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Removes all nodes and links and restarts id allocation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.next_id = 1;
        self.touch();
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use glam::Vec4;

    use super::*;

    #[test]
    fn add_node_uses_catalog_pins() {
        let mut graph = TextureGraph::new();
        let id = graph.add_node("Levels", Vec2::new(10.0, 20.0));
        let node = graph.node(id).expect("node exists");
        assert_eq!(node.inputs.len(), 4);
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.kind(), Some(NodeKind::Levels));
        assert_eq!(node.position, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn unknown_type_gets_no_pins() {
        let mut graph = TextureGraph::new();
        let id = graph.add_node("Mystery", Vec2::ZERO);
        let node = graph.node(id).unwrap();
        assert!(node.inputs.is_empty() && node.outputs.is_empty());
        assert_eq!(node.kind(), None);
    }

    #[test]
    fn ids_are_unique_across_nodes_and_links() {
        let mut graph = TextureGraph::new();
        let a = graph.add(NodeKind::SolidColor);
        let b = graph.add(NodeKind::TextureOutput);
        let l = graph.add_link(a, 0, b, 0).unwrap();
        let c = graph.add(NodeKind::Invert);
        let ids: HashSet<_> = [a, b, l, c].into_iter().collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut graph = TextureGraph::new();
        let a = graph.add(NodeKind::Constant);
        assert!(graph.remove_node(a));
        let b = graph.add(NodeKind::Constant);
        assert_ne!(a, b);
    }

    #[test]
    fn linking_an_occupied_input_replaces_the_old_link() {
        let mut graph = TextureGraph::new();
        let a = graph.add(NodeKind::Constant);
        let b = graph.add(NodeKind::Constant);
        let add = graph.add(NodeKind::Add);
        let first = graph.add_link(a, 0, add, 0).unwrap();
        let second = graph.add_link(b, 0, add, 0).unwrap();

        assert!(graph.link(first).is_none());
        assert_eq!(graph.input_link(add, 0).map(|l| l.id), Some(second));
        assert_eq!(graph.links().len(), 1);
    }

    #[test]
    fn fan_out_is_allowed() {
        let mut graph = TextureGraph::new();
        let a = graph.add(NodeKind::Checkerboard);
        let b = graph.add(NodeKind::Invert);
        let c = graph.add(NodeKind::Levels);
        graph.add_link(a, 0, b, 0).unwrap();
        graph.add_link(a, 0, c, 0).unwrap();
        assert_eq!(graph.links().len(), 2);
    }

    #[test]
    fn invalid_links_are_rejected() {
        let mut graph = TextureGraph::new();
        let a = graph.add(NodeKind::Constant);
        let img = graph.add(NodeKind::InputImage);

        assert!(matches!(
            graph.add_link(a, 0, a, 0),
            Err(Error::InvalidLink(_))
        ));
        assert!(matches!(
            graph.add_link(a, 3, img, 0),
            Err(Error::InvalidLink(_))
        ));
        assert!(matches!(
            graph.add_link(a, 0, img, 9),
            Err(Error::InvalidLink(_))
        ));
        assert!(matches!(
            graph.add_link(a, 0, 999, 0),
            Err(Error::UnknownNode { id: 999 })
        ));
        // Float output cannot feed the path pin.
        assert!(matches!(
            graph.add_link(a, 0, img, 1),
            Err(Error::InvalidLink(_))
        ));
    }

    #[test]
    fn removing_a_node_drops_its_links() {
        let mut graph = TextureGraph::new();
        let a = graph.add(NodeKind::SolidColor);
        let b = graph.add(NodeKind::Invert);
        let c = graph.add(NodeKind::TextureOutput);
        graph.add_link(a, 0, b, 0).unwrap();
        graph.add_link(b, 0, c, 0).unwrap();

        graph.remove_node(b);
        assert!(graph.links().is_empty());
        assert!(!graph.remove_node(b));
    }

    #[test]
    fn edits_bump_revision() {
        let mut graph = TextureGraph::new();
        let r0 = graph.revision();
        let a = graph.add(NodeKind::SolidColor);
        let r1 = graph.revision();
        graph
            .set_input_default(a, 0, Vec4::new(0.2, 0.4, 0.6, 1.0))
            .unwrap();
        let r2 = graph.revision();
        assert!(r0 < r1 && r1 < r2);
    }

    #[test]
    fn lookup_of_missing_node_is_not_an_edit() {
        let mut graph = TextureGraph::new();
        let a = graph.add(NodeKind::Invert);
        let before = graph.revision();
        assert!(graph.node_mut(a + 100).is_none());
        assert!(graph.set_input_default(a + 100, 0, 1.0).is_err());
        assert_eq!(graph.revision(), before);
        assert!(graph.node_mut(a).is_some());
        assert!(graph.revision() > before);
    }

    #[test]
    fn set_default_by_name() {
        let mut graph = TextureGraph::new();
        let p = graph.add(NodeKind::PerlinNoise);
        graph.set_input_default_by_name(p, "Octaves", 6.0).unwrap();
        assert_eq!(
            graph.node(p).unwrap().inputs[2].default,
            PinValue::Float(6.0)
        );
        assert!(graph
            .set_input_default_by_name(p, "Nope", 1.0)
            .is_err());
    }

    #[test]
    fn clear_restarts_ids() {
        let mut graph = TextureGraph::new();
        graph.add(NodeKind::Constant);
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.add(NodeKind::Constant), 1);
    }
}
