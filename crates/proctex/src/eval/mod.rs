//! Evaluation subsystem: runs compiled texture programs into per-node raster buffers.
//!
//! An [`EvalContext`] owns everything that persists across passes (configuration, node
//! buffers, the image sampler cache). [`TextureRuntime`] performs one pass over a compiled
//! [`crate::texgraph::TextureProgram`], and [`OutputCompositor`] turns the sink node's
//! buffer into 8-bit RGBA.
pub mod context;
pub mod events;
pub mod kernels;
pub mod output;
pub mod raster;
pub mod runtime;
pub mod sampler;

pub use context::{CyclePolicy, EvalConfig, EvalContext};
pub use output::{quantize, Composite, OutputCompositor, OutputImage};
pub use raster::NodeBuffer;
pub use runtime::{PassReport, TextureRuntime, MAGENTA};
pub use sampler::{ImageCrateDecoder, ImageDecoder, SamplerCache, SamplerEntry};
