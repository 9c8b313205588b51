//! Per-node raster storage.
//!
//! A [`NodeBuffer`] holds one node's output for a pass as a dense row-major grid of
//! unclamped RGBA values. Sampling tiles: coordinates wrap by their fractional part and
//! resolve to the nearest pixel by truncation.
use glam::{Vec2, Vec4};

/// A square raster of RGBA values.
#[derive(Clone, Debug, Default)]
pub struct NodeBuffer {
    width: u32,
    height: u32,
    data: Vec<Vec4>,
}

impl NodeBuffer {
    /// Creates a `size` x `size` buffer filled with zeroes.
    pub fn new(size: u32) -> Self {
        let mut buf = Self::default();
        buf.resize(size);
        buf
    }

    /// Resizes to `size` x `size`, keeping the allocation where possible.
    /// Pixel contents are unspecified afterwards.
    pub fn resize(&mut self, size: u32) {
        self.width = size;
        self.height = size;
        self.data.resize((size as usize) * (size as usize), Vec4::ZERO);
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major pixel values.
    #[inline]
    pub fn pixels(&self) -> &[Vec4] {
        &self.data
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Vec4] {
        &mut self.data
    }

    /// Get the value at pixel `(x, y)`, returning zero if out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        if x >= self.width || y >= self.height {
            return Vec4::ZERO;
        }
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, v: Vec4) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize) * (self.width as usize) + x as usize;
        self.data[i] = v;
    }

    pub fn fill(&mut self, v: Vec4) {
        self.data.fill(v);
    }

    /// Samples with wraparound addressing and nearest-pixel lookup.
    /// An empty buffer samples as zero.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        if self.is_empty() {
            return Vec4::ZERO;
        }
        let w = wrap_uv(uv);
        let x = texel_index(w.x, self.width);
        let y = texel_index(w.y, self.height);
        self.get(x, y)
    }

    /// The pixel at `(width / 2, height / 2)`.
    pub fn center(&self) -> Vec4 {
        self.get(self.width / 2, self.height / 2)
    }
}

/// Wraps each coordinate into `[0, 1)` by subtracting its floor.
#[inline]
pub fn wrap_uv(uv: Vec2) -> Vec2 {
    uv - uv.floor()
}

/// Coordinate of the centre of pixel `(x, y)` in an `n` x `n` raster.
#[inline]
pub fn pixel_uv(x: u32, y: u32, n: u32) -> Vec2 {
    let n = n as f32;
    Vec2::new((x as f32 + 0.5) / n, (y as f32 + 0.5) / n)
}

/// Nearest texel for a wrapped coordinate, clamped to the last texel.
#[inline]
pub(crate) fn texel_index(t: f32, len: u32) -> u32 {
    ((t * len as f32) as u32).min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(size: u32) -> NodeBuffer {
        let mut buf = NodeBuffer::new(size);
        for y in 0..size {
            for x in 0..size {
                buf.set(x, y, Vec4::new(x as f32, y as f32, 0.0, 1.0));
            }
        }
        buf
    }

    #[test]
    fn new_initializes_with_zeroes() {
        let buf = NodeBuffer::new(4);
        assert_eq!((buf.width(), buf.height()), (4, 4));
        assert_eq!(buf.pixels().len(), 16);
        assert!(buf.pixels().iter().all(|v| *v == Vec4::ZERO));
    }

    #[test]
    fn get_returns_zero_outside_bounds() {
        let buf = gradient(2);
        assert_eq!(buf.get(5, 0), Vec4::ZERO);
        assert_eq!(buf.get(1, 1), Vec4::new(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn sampling_wraps_around() {
        let buf = gradient(8);
        assert_eq!(
            buf.sample(Vec2::new(1.3, -0.2)),
            buf.sample(Vec2::new(0.3, 0.8))
        );
        assert_eq!(buf.sample(Vec2::new(0.3, 0.8)), Vec4::new(2.0, 6.0, 0.0, 1.0));
    }

    #[test]
    fn sampling_truncates_to_nearest_pixel() {
        let buf = gradient(4);
        assert_eq!(buf.sample(Vec2::new(0.0, 0.0)).x, 0.0);
        assert_eq!(buf.sample(Vec2::new(0.49, 0.0)).x, 1.0);
        assert_eq!(buf.sample(Vec2::new(0.999, 0.0)).x, 3.0);
    }

    #[test]
    fn empty_buffer_samples_zero() {
        let buf = NodeBuffer::default();
        assert!(buf.is_empty());
        assert_eq!(buf.sample(Vec2::splat(0.5)), Vec4::ZERO);
    }

    #[test]
    fn resize_reuses_and_reshapes() {
        let mut buf = NodeBuffer::new(8);
        buf.resize(2);
        assert_eq!(buf.pixels().len(), 4);
        buf.fill(Vec4::ONE);
        assert_eq!(buf.center(), Vec4::ONE);
    }

    #[test]
    fn pixel_centres_stay_inside_unit_square() {
        assert_eq!(pixel_uv(0, 0, 1), Vec2::splat(0.5));
        let last = pixel_uv(255, 255, 256);
        assert!(last.x < 1.0 && last.y < 1.0);
    }
}
