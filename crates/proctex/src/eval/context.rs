//! Evaluation configuration and the state that persists between passes.
use std::collections::HashMap;

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::eval::raster::NodeBuffer;
use crate::eval::sampler::SamplerCache;
use crate::texgraph::NodeId;

/// Largest accepted buffer side length.
pub const MAX_RESOLUTION: u32 = 8192;

/// What a pass does when the graph contains a cycle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CyclePolicy {
    /// Evaluate every node that can be ordered; leave the rest out.
    #[default]
    Skip,
    /// Evaluate nothing and drop all buffers.
    Reject,
}

/// Configuration for evaluating texture graphs.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    /// Side length of every node buffer, in pixels.
    pub resolution: u32,
    /// Side length of node thumbnails, in pixels.
    pub thumbnail_size: u32,
    /// Byte budget of the sampler cache; `None` keeps every decoded image.
    pub sampler_budget_bytes: Option<usize>,
    pub cycle_policy: CyclePolicy,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            resolution: 256,
            thumbnail_size: 64,
            sampler_budget_bytes: None,
            cycle_policy: CyclePolicy::Skip,
        }
    }
}

impl EvalConfig {
    /// Creates a new [`EvalConfig`] with the specified resolution.
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }

    /// Sets the buffer resolution.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the thumbnail size.
    pub fn with_thumbnail_size(mut self, thumbnail_size: u32) -> Self {
        self.thumbnail_size = thumbnail_size;
        self
    }

    /// Sets the sampler cache byte budget.
    pub fn with_sampler_budget(mut self, bytes: Option<usize>) -> Self {
        self.sampler_budget_bytes = bytes;
        self
    }

    /// Sets the cycle policy.
    pub fn with_cycle_policy(mut self, cycle_policy: CyclePolicy) -> Self {
        self.cycle_policy = cycle_policy;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(Error::InvalidConfig(format!(
                "resolution must be in 1..={MAX_RESOLUTION}, got {}",
                self.resolution
            )));
        }
        if self.thumbnail_size == 0 {
            return Err(Error::InvalidConfig("thumbnail_size must be > 0".into()));
        }

        Ok(())
    }
}

/// State shared by all passes over one graph: configuration, node buffers, and the
/// sampler cache.
pub struct EvalContext {
    config: EvalConfig,
    pub(crate) sampler: SamplerCache,
    pub(crate) buffers: HashMap<NodeId, NodeBuffer>,
}

impl EvalContext {
    pub fn try_new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn new(config: EvalConfig) -> Self {
        Self::with_sampler(config, SamplerCache::new())
    }

    /// Creates a context around an existing sampler cache, e.g. one with a custom decoder.
    pub fn with_sampler(config: EvalConfig, sampler: SamplerCache) -> Self {
        debug_assert!(
            config.resolution > 0 && config.resolution <= MAX_RESOLUTION,
            "resolution must be in 1..=8192"
        );
        debug_assert!(config.thumbnail_size > 0, "thumbnail_size must be > 0");

        let sampler = sampler.with_budget(config.sampler_budget_bytes);
        Self {
            config,
            sampler,
            buffers: HashMap::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    #[inline]
    pub fn resolution(&self) -> u32 {
        self.config.resolution
    }

    /// Changes the resolution. Existing buffers are dropped when it differs.
    pub fn set_resolution(&mut self, resolution: u32) -> Result<()> {
        let next = self.config.clone().with_resolution(resolution);
        next.validate()?;
        if resolution != self.config.resolution {
            debug!(
                "Resolution {} -> {}; dropping {} buffers.",
                self.config.resolution,
                resolution,
                self.buffers.len()
            );
            self.buffers.clear();
        }
        self.config = next;
        Ok(())
    }

    pub fn set_cycle_policy(&mut self, policy: CyclePolicy) {
        self.config.cycle_policy = policy;
    }

    pub fn set_sampler_budget(&mut self, bytes: Option<usize>) {
        self.config.sampler_budget_bytes = bytes;
        self.sampler.set_budget(bytes);
    }

    pub fn sampler(&self) -> &SamplerCache {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut SamplerCache {
        &mut self.sampler
    }

    /// The buffer produced for `id` by the last pass that evaluated it.
    pub fn buffer(&self, id: NodeId) -> Option<&NodeBuffer> {
        self.buffers.get(&id)
    }

    /// Ids of all nodes that currently hold a buffer, in no particular order.
    pub fn buffered_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.buffers.keys().copied()
    }

    pub fn clear_buffers(&mut self) {
        self.buffers.clear();
    }

    /// Takes `id`'s buffer out of the context, sized to the current resolution.
    pub(crate) fn take_buffer(&mut self, id: NodeId) -> NodeBuffer {
        let res = self.config.resolution;
        match self.buffers.remove(&id) {
            Some(mut buf) => {
                if buf.width() != res || buf.height() != res {
                    buf.resize(res);
                }
                buf
            }
            None => NodeBuffer::new(res),
        }
    }

    pub(crate) fn put_buffer(&mut self, id: NodeId, buf: NodeBuffer) {
        self.buffers.insert(id, buf);
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}
