//! Pin types, literal pin values, and the widening rules between them.
//!
//! [`PinValue`] is the closed set of literal values a pin can hold as its default.
//! The `as_*` accessors implement the coercions the evaluator applies when a pin
//! expects a different shape than the one it holds or is connected to:
//! - float from a color or vector takes the first channel,
//! - color from a scalar broadcasts to RGB with alpha `1`,
//! - 2-vector from a color takes the first two channels, from a scalar broadcasts.
use glam::{Vec2, Vec4};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semantic type tag of a pin.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinType {
    Float,
    Int,
    Vec2,
    Vec3,
    /// RGBA color. Interchangeable with a 4-vector.
    Color,
    /// Filesystem path of an external resource.
    Path,
    Any,
}

impl PinType {
    /// Whether an output of type `self` may feed an input of type `to`.
    ///
    /// Numeric types connect freely; the evaluator widens or narrows them at read time.
    /// Paths only connect to paths.
    pub fn can_feed(self, to: PinType) -> bool {
        if self == to || self == PinType::Any || to == PinType::Any {
            return true;
        }
        self.is_numeric() && to.is_numeric()
    }

    fn is_numeric(self) -> bool {
        !matches!(self, PinType::Path | PinType::Any)
    }

    /// The value an unset pin of this type reads as.
    pub fn neutral_value(self) -> PinValue {
        match self {
            PinType::Float | PinType::Any => PinValue::Float(0.0),
            PinType::Int => PinValue::Int(0),
            PinType::Vec2 => PinValue::Vec2(Vec2::ZERO),
            PinType::Vec3 | PinType::Color => PinValue::Color(Vec4::ONE),
            PinType::Path => PinValue::Path(String::new()),
        }
    }
}

/// Direction of a pin relative to its node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinDirection {
    Input,
    Output,
}

/// A literal pin value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum PinValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Color(Vec4),
    /// Resource path; only meaningful on image inputs.
    Path(String),
}

impl PinValue {
    /// Reads the value as a scalar.
    pub fn as_float(&self) -> f32 {
        match self {
            PinValue::Float(v) => *v,
            PinValue::Int(v) => *v as f32,
            PinValue::Vec2(v) => v.x,
            PinValue::Color(c) => c.x,
            PinValue::Path(_) => 0.0,
        }
    }

    /// Reads the value as an RGBA color.
    pub fn as_color(&self) -> Vec4 {
        match self {
            PinValue::Color(c) => *c,
            PinValue::Float(v) => broadcast(*v),
            PinValue::Int(v) => broadcast(*v as f32),
            PinValue::Vec2(v) => Vec4::new(v.x, v.y, 0.0, 1.0),
            PinValue::Path(_) => Vec4::ONE,
        }
    }

    /// Reads the value as a 2-vector.
    pub fn as_vec2(&self) -> Vec2 {
        match self {
            PinValue::Vec2(v) => *v,
            PinValue::Float(v) => Vec2::splat(*v),
            PinValue::Int(v) => Vec2::splat(*v as f32),
            PinValue::Color(c) => Vec2::new(c.x, c.y),
            PinValue::Path(_) => Vec2::ZERO,
        }
    }

    /// The path held by this value, if it is a path.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            PinValue::Path(p) => Some(p.as_str()),
            _ => None,
        }
    }
}

/// Broadcasts a scalar to an opaque gray color.
#[inline]
pub fn broadcast(v: f32) -> Vec4 {
    Vec4::new(v, v, v, 1.0)
}

impl From<f32> for PinValue {
    fn from(value: f32) -> Self {
        PinValue::Float(value)
    }
}

impl From<i32> for PinValue {
    fn from(value: i32) -> Self {
        PinValue::Int(value)
    }
}

impl From<Vec2> for PinValue {
    fn from(value: Vec2) -> Self {
        PinValue::Vec2(value)
    }
}

impl From<Vec4> for PinValue {
    fn from(value: Vec4) -> Self {
        PinValue::Color(value)
    }
}

impl From<mint::Vector2<f32>> for PinValue {
    fn from(value: mint::Vector2<f32>) -> Self {
        PinValue::Vec2(value.into())
    }
}

impl From<mint::Vector4<f32>> for PinValue {
    fn from(value: mint::Vector4<f32>) -> Self {
        PinValue::Color(value.into())
    }
}

impl From<&str> for PinValue {
    fn from(value: &str) -> Self {
        PinValue::Path(value.to_owned())
    }
}

impl From<String> for PinValue {
    fn from(value: String) -> Self {
        PinValue::Path(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_from_color_takes_red_channel() {
        let v = PinValue::Color(Vec4::new(0.3, 0.6, 0.9, 1.0));
        assert_eq!(v.as_float(), 0.3);
    }

    #[test]
    fn color_from_scalar_broadcasts_with_opaque_alpha() {
        assert_eq!(
            PinValue::Float(0.25).as_color(),
            Vec4::new(0.25, 0.25, 0.25, 1.0)
        );
        assert_eq!(PinValue::Int(2).as_color(), Vec4::new(2.0, 2.0, 2.0, 1.0));
    }

    #[test]
    fn vec2_coercions() {
        assert_eq!(PinValue::Float(0.5).as_vec2(), Vec2::splat(0.5));
        assert_eq!(
            PinValue::Color(Vec4::new(0.1, 0.2, 0.3, 0.4)).as_vec2(),
            Vec2::new(0.1, 0.2)
        );
    }

    #[test]
    fn paths_read_as_neutral_numbers() {
        let p = PinValue::from("textures/rock.png");
        assert_eq!(p.as_float(), 0.0);
        assert_eq!(p.as_vec2(), Vec2::ZERO);
        assert_eq!(p.as_path(), Some("textures/rock.png"));
        assert_eq!(PinValue::Float(1.0).as_path(), None);
    }

    #[test]
    fn mint_vectors_convert() {
        let v: PinValue = mint::Vector2 { x: 1.0, y: 2.0 }.into();
        assert_eq!(v, PinValue::Vec2(Vec2::new(1.0, 2.0)));
        let c: PinValue = mint::Vector4 {
            x: 0.1,
            y: 0.2,
            z: 0.3,
            w: 0.4,
        }
        .into();
        assert_eq!(c, PinValue::Color(Vec4::new(0.1, 0.2, 0.3, 0.4)));
    }

    #[test]
    fn type_compatibility_follows_widening_rules() {
        assert!(PinType::Float.can_feed(PinType::Color));
        assert!(PinType::Float.can_feed(PinType::Vec2));
        assert!(PinType::Vec2.can_feed(PinType::Color));
        assert!(PinType::Int.can_feed(PinType::Float));
        assert!(PinType::Color.can_feed(PinType::Any));
        assert!(PinType::Any.can_feed(PinType::Path));
        assert!(PinType::Color.can_feed(PinType::Float));
        assert!(!PinType::Path.can_feed(PinType::Float));
        assert!(!PinType::Color.can_feed(PinType::Path));
    }
}
