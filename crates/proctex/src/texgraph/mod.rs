//! Texture graph subsystem: authoring, scheduling, and compiling node graphs.
//!
//! This module groups the types for describing a directed graph of texture operator
//! nodes ([`TextureGraph`]), ordering it for evaluation ([`Scheduler`]), and compiling it
//! into the dispatch-ready [`TextureProgram`] the evaluator runs.
pub mod node;
pub mod program;
pub mod scheduler;
pub mod spec;
pub mod value;

pub use node::{NodeCategory, NodeKind};
pub use program::{BufferView, InputSource, NodeMeta, ProgramCompiler, TextureProgram};
pub use scheduler::{Schedule, Scheduler};
pub use spec::{Link, Node, Pin, TextureGraph};
pub use value::{broadcast, PinDirection, PinType, PinValue};

pub type NodeId = u32;
pub type LinkId = u32;
