//! Decoded image cache for `Input Image` nodes.
//!
//! [`SamplerCache`] decodes each path once, through an [`ImageDecoder`], and hands out
//! shared [`SamplerEntry`] handles. A failed decode is cached as an empty entry so a
//! broken path is not retried every pass. With a byte budget set, least recently used
//! entries are evicted, except entries touched during the current pass.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Vec2, Vec4};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::eval::raster::{texel_index, wrap_uv};

/// Decoded 8-bit RGBA image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SamplerEntry {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SamplerEntry {
    /// Creates an entry from tightly packed RGBA bytes.
    ///
    /// Dimensions that do not match the byte count produce an empty entry.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        if (width as usize) * (height as usize) * 4 != pixels.len() {
            return Self::empty();
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Zero-sized entry recorded for paths that failed to decode.
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// RGBA bytes of texel `(x, y)`.
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Samples with wraparound addressing and nearest-texel lookup, normalized to `[0, 1]`.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        if self.is_empty() {
            return Vec4::ZERO;
        }
        let w = wrap_uv(uv);
        let [r, g, b, a] = self.texel(
            texel_index(w.x, self.width),
            texel_index(w.y, self.height),
        );
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }
}

/// Decodes an image file into an RGBA [`SamplerEntry`].
pub trait ImageDecoder {
    fn decode(&self, path: &str) -> Result<SamplerEntry>;
}

/// [`ImageDecoder`] backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &str) -> Result<SamplerEntry> {
        let img = image::open(Path::new(path))
            .map_err(|e| Error::Decode {
                path: path.to_owned(),
                message: e.to_string(),
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(SamplerEntry::new(width, height, img.into_raw()))
    }
}

struct CacheSlot {
    entry: Arc<SamplerEntry>,
    last_used: u64,
    pass: u64,
}

/// Path-keyed cache of decoded images.
pub struct SamplerCache {
    decoder: Box<dyn ImageDecoder>,
    entries: HashMap<String, CacheSlot>,
    budget_bytes: Option<usize>,
    bytes: usize,
    pass: u64,
    tick: u64,
    decodes: usize,
}

impl SamplerCache {
    /// Creates an unbounded cache using [`ImageCrateDecoder`].
    pub fn new() -> Self {
        Self::with_decoder(Box::new(ImageCrateDecoder))
    }

    pub fn with_decoder(decoder: Box<dyn ImageDecoder>) -> Self {
        Self {
            decoder,
            entries: HashMap::new(),
            budget_bytes: None,
            bytes: 0,
            pass: 0,
            tick: 0,
            decodes: 0,
        }
    }

    /// Sets the byte budget. `None` disables eviction.
    pub fn with_budget(mut self, budget_bytes: Option<usize>) -> Self {
        self.budget_bytes = budget_bytes;
        self
    }

    pub fn set_budget(&mut self, budget_bytes: Option<usize>) {
        self.budget_bytes = budget_bytes;
        self.evict();
    }

    #[inline]
    pub fn budget(&self) -> Option<usize> {
        self.budget_bytes
    }

    /// Marks the start of a pass. Entries loaded from here on are pinned until the next call.
    pub fn begin_pass(&mut self) {
        self.pass += 1;
        self.evict();
    }

    /// Returns the entry for `path`, decoding it on first request.
    pub fn load(&mut self, path: &str) -> Arc<SamplerEntry> {
        self.tick += 1;
        if let Some(slot) = self.entries.get_mut(path) {
            slot.last_used = self.tick;
            slot.pass = self.pass;
            return Arc::clone(&slot.entry);
        }

        self.decodes += 1;
        let entry = match self.decoder.decode(path) {
            Ok(entry) => {
                debug!(
                    "Decoded '{}' ({}x{}).",
                    path,
                    entry.width(),
                    entry.height()
                );
                entry
            }
            Err(err) => {
                warn!("Image '{}' could not be loaded: {}", path, err);
                SamplerEntry::empty()
            }
        };

        let entry = Arc::new(entry);
        self.bytes += entry.byte_len();
        self.entries.insert(
            path.to_owned(),
            CacheSlot {
                entry: Arc::clone(&entry),
                last_used: self.tick,
                pass: self.pass,
            },
        );
        self.evict();
        entry
    }

    /// Whether `path` currently has an entry.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Drops the entry for `path` so the next load decodes it again.
    pub fn invalidate(&mut self, path: &str) -> bool {
        match self.entries.remove(path) {
            Some(slot) => {
                self.bytes -= slot.entry.byte_len();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total decoded bytes held.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Number of decode attempts made so far.
    pub fn decode_count(&self) -> usize {
        self.decodes
    }

    fn evict(&mut self) {
        let Some(budget) = self.budget_bytes else {
            return;
        };
        while self.bytes > budget {
            let victim = self
                .entries
                .iter()
                .filter(|(_, slot)| slot.pass != self.pass)
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(path, _)| path.clone());
            let Some(path) = victim else {
                break;
            };
            debug!("Evicting '{}' from sampler cache.", path);
            self.invalidate(&path);
        }
    }
}

impl Default for SamplerCache {
    fn default() -> Self {
        Self::new()
    }
}
