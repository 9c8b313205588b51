#![forbid(unsafe_code)]
//! proctex: procedural texture node graphs evaluated into raster buffers.
//!
//! Modules:
//! - texgraph: author texture graphs, schedule them, and compile them into programs
//! - eval: evaluate programs into per-node buffers, sample images, composite the output
//!
//! For examples and docs, see README and the `proctex_examples` crate.
pub mod error;
pub mod eval;
pub mod texgraph;

/// Convenient re-exports for common types. Import with `use proctex::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::eval::events::{EvalEvent, EvalEventKind, EventSink, FnSink, VecSink};
    pub use crate::eval::{
        Composite, CyclePolicy, EvalConfig, EvalContext, ImageCrateDecoder, ImageDecoder,
        NodeBuffer, OutputCompositor, OutputImage, PassReport, SamplerCache, SamplerEntry,
        TextureRuntime,
    };
    pub use crate::texgraph::{
        Link, LinkId, Node, NodeCategory, NodeId, NodeKind, Pin, PinType, PinValue,
        ProgramCompiler, Schedule, Scheduler, TextureGraph, TextureProgram,
    };
}
