//! Node kinds and the built-in node type catalog.
//!
//! A node's type name is a string key (the form graphs are authored and persisted in).
//! [`NodeKind`] is the closed set of kernels the evaluator knows; names are resolved to a
//! kind once, when a graph is compiled into a [`crate::texgraph::TextureProgram`].
//! The catalog also provides the default pin layout for every kind.
use glam::{Vec2, Vec4};

use crate::texgraph::spec::Pin;
use crate::texgraph::value::{PinType, PinValue};

/// Catalog grouping of node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    Generators,
    Math,
    Filters,
    Color,
    Blend,
    Input,
    Output,
}

/// Every kernel the evaluator can dispatch to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    PerlinNoise,
    Checkerboard,
    Gradient,
    SolidColor,
    Voronoi,
    Constant,
    Add,
    Multiply,
    Lerp,
    Clamp,
    Remap,
    Power,
    Invert,
    Levels,
    Blur,
    Rect,
    HsvAdjust,
    ChannelSplit,
    ChannelMerge,
    Colorize,
    BlendMultiply,
    BlendScreen,
    BlendOverlay,
    BlendAdd,
    InputImage,
    TextureOutput,
}

impl NodeKind {
    pub const ALL: [NodeKind; 26] = [
        NodeKind::PerlinNoise,
        NodeKind::Checkerboard,
        NodeKind::Gradient,
        NodeKind::SolidColor,
        NodeKind::Voronoi,
        NodeKind::Constant,
        NodeKind::Add,
        NodeKind::Multiply,
        NodeKind::Lerp,
        NodeKind::Clamp,
        NodeKind::Remap,
        NodeKind::Power,
        NodeKind::Invert,
        NodeKind::Levels,
        NodeKind::Blur,
        NodeKind::Rect,
        NodeKind::HsvAdjust,
        NodeKind::ChannelSplit,
        NodeKind::ChannelMerge,
        NodeKind::Colorize,
        NodeKind::BlendMultiply,
        NodeKind::BlendScreen,
        NodeKind::BlendOverlay,
        NodeKind::BlendAdd,
        NodeKind::InputImage,
        NodeKind::TextureOutput,
    ];

    /// Canonical type name used in authored graphs.
    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::PerlinNoise => "Perlin Noise",
            NodeKind::Checkerboard => "Checkerboard",
            NodeKind::Gradient => "Gradient",
            NodeKind::SolidColor => "Solid Color",
            NodeKind::Voronoi => "Voronoi",
            NodeKind::Constant => "Constant",
            NodeKind::Add => "Add",
            NodeKind::Multiply => "Multiply",
            NodeKind::Lerp => "Lerp",
            NodeKind::Clamp => "Clamp",
            NodeKind::Remap => "Remap",
            NodeKind::Power => "Power",
            NodeKind::Invert => "Invert",
            NodeKind::Levels => "Levels",
            NodeKind::Blur => "Blur",
            NodeKind::Rect => "Rect",
            NodeKind::HsvAdjust => "HSV Adjust",
            NodeKind::ChannelSplit => "Channel Split",
            NodeKind::ChannelMerge => "Channel Merge",
            NodeKind::Colorize => "Colorize",
            NodeKind::BlendMultiply => "Blend Multiply",
            NodeKind::BlendScreen => "Blend Screen",
            NodeKind::BlendOverlay => "Blend Overlay",
            NodeKind::BlendAdd => "Blend Add",
            NodeKind::InputImage => "Input Image",
            NodeKind::TextureOutput => "Texture Output",
        }
    }

    /// Resolves a type name to a kind. `"Texture Sample"` is accepted as an alias of
    /// `"Input Image"`.
    pub fn from_type_name(name: &str) -> Option<NodeKind> {
        if name == "Texture Sample" {
            return Some(NodeKind::InputImage);
        }
        NodeKind::ALL.into_iter().find(|k| k.type_name() == name)
    }

    pub fn category(self) -> NodeCategory {
        match self {
            NodeKind::PerlinNoise
            | NodeKind::Checkerboard
            | NodeKind::Gradient
            | NodeKind::SolidColor
            | NodeKind::Voronoi
            | NodeKind::Constant => NodeCategory::Generators,
            NodeKind::Add
            | NodeKind::Multiply
            | NodeKind::Lerp
            | NodeKind::Clamp
            | NodeKind::Remap
            | NodeKind::Power => NodeCategory::Math,
            NodeKind::Invert | NodeKind::Levels | NodeKind::Blur | NodeKind::Rect => {
                NodeCategory::Filters
            }
            NodeKind::HsvAdjust
            | NodeKind::ChannelSplit
            | NodeKind::ChannelMerge
            | NodeKind::Colorize => NodeCategory::Color,
            NodeKind::BlendMultiply
            | NodeKind::BlendScreen
            | NodeKind::BlendOverlay
            | NodeKind::BlendAdd => NodeCategory::Blend,
            NodeKind::InputImage => NodeCategory::Input,
            NodeKind::TextureOutput => NodeCategory::Output,
        }
    }

    /// Whether this kind is the graph's designated sink.
    #[inline]
    pub fn is_sink(self) -> bool {
        matches!(self, NodeKind::TextureOutput)
    }

    /// Default input pins. Zero-valued numeric parameters mean "use the kernel's
    /// built-in default" for the kinds that document one.
    pub fn default_inputs(self) -> Vec<Pin> {
        let uv = || Pin::input("UV", PinType::Vec2, Vec2::ZERO);
        let float = |name: &str| Pin::input(name, PinType::Float, 0.0);
        let color = |name: &str| Pin::input(name, PinType::Color, Vec4::ONE);

        match self {
            NodeKind::PerlinNoise => vec![uv(), float("Scale"), float("Octaves")],
            NodeKind::Checkerboard => vec![uv(), float("Scale")],
            NodeKind::Gradient => vec![uv(), color("ColorA"), color("ColorB")],
            NodeKind::SolidColor | NodeKind::TextureOutput => vec![color("Color")],
            NodeKind::Voronoi => vec![uv(), float("Scale"), float("Randomness")],
            NodeKind::Constant => vec![float("Value")],
            NodeKind::Add | NodeKind::Multiply => vec![float("A"), float("B")],
            NodeKind::Lerp => vec![float("A"), float("B"), float("T")],
            NodeKind::Clamp => vec![float("Value"), float("Min"), float("Max")],
            NodeKind::Remap => vec![
                float("Value"),
                float("InMin"),
                float("InMax"),
                float("OutMin"),
                float("OutMax"),
            ],
            NodeKind::Power => vec![float("Base"), float("Exponent")],
            NodeKind::Invert => vec![color("Input")],
            NodeKind::Levels => vec![color("Input"), float("Min"), float("Max"), float("Gamma")],
            NodeKind::Blur => vec![color("Input"), float("Radius")],
            NodeKind::Rect => vec![
                color("Input"),
                float("X"),
                float("Y"),
                float("Width"),
                float("Height"),
            ],
            NodeKind::HsvAdjust => vec![color("Input"), float("H"), float("S"), float("V")],
            NodeKind::ChannelSplit => vec![color("Color")],
            NodeKind::ChannelMerge => vec![float("R"), float("G"), float("B"), float("A")],
            NodeKind::Colorize => vec![float("Value"), color("Color")],
            NodeKind::BlendMultiply
            | NodeKind::BlendScreen
            | NodeKind::BlendOverlay
            | NodeKind::BlendAdd => vec![color("A"), color("B")],
            NodeKind::InputImage => vec![
                uv(),
                Pin::input("Path", PinType::Path, PinValue::Path(String::new())),
            ],
        }
    }

    /// Default output pins.
    pub fn default_outputs(self) -> Vec<Pin> {
        match self {
            NodeKind::PerlinNoise | NodeKind::Voronoi | NodeKind::Constant => {
                vec![Pin::output("Value", PinType::Float)]
            }
            NodeKind::Checkerboard => vec![Pin::output("Pattern", PinType::Float)],
            NodeKind::Add
            | NodeKind::Multiply
            | NodeKind::Lerp
            | NodeKind::Clamp
            | NodeKind::Remap
            | NodeKind::Power => vec![Pin::output("Result", PinType::Float)],
            NodeKind::ChannelSplit => ["R", "G", "B", "A"]
                .into_iter()
                .map(|name| Pin::output(name, PinType::Float))
                .collect(),
            _ => vec![Pin::output("Color", PinType::Color)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_round_trip_through_lookup() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_type_name(kind.type_name()), Some(kind));
        }
    }

    #[test]
    fn texture_sample_is_an_alias_for_input_image() {
        assert_eq!(
            NodeKind::from_type_name("Texture Sample"),
            Some(NodeKind::InputImage)
        );
        assert_eq!(NodeKind::from_type_name("Bogus"), None);
    }

    #[test]
    fn channel_split_has_four_outputs() {
        let outs = NodeKind::ChannelSplit.default_outputs();
        let names: Vec<_> = outs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["R", "G", "B", "A"]);
    }

    #[test]
    fn only_texture_output_is_a_sink() {
        let sinks: Vec<_> = NodeKind::ALL.into_iter().filter(|k| k.is_sink()).collect();
        assert_eq!(sinks, [NodeKind::TextureOutput]);
        assert_eq!(NodeKind::TextureOutput.category(), NodeCategory::Output);
    }

    #[test]
    fn input_image_exposes_a_path_pin() {
        let inputs = NodeKind::InputImage.default_inputs();
        assert_eq!(inputs[1].name, "Path");
        assert_eq!(inputs[1].ty, PinType::Path);
    }
}
