//! Pure per-pixel math shared by the node kernels: gradient noise, cellular noise,
//! color space conversion, and blend modes.
use glam::{IVec2, Vec2, Vec3, Vec4};

#[rustfmt::skip]
const PERM: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225,
    140, 36, 103, 30, 69, 142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148,
    247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219, 203, 117, 35, 11, 32,
    57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122,
    60, 211, 133, 230, 220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54,
    65, 25, 63, 161, 1, 216, 80, 73, 209, 76, 132, 187, 208, 89, 18, 169,
    200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173, 186, 3, 64,
    52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212,
    207, 206, 59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213,
    119, 248, 152, 2, 44, 154, 163, 70, 221, 153, 101, 155, 167, 43, 172, 9,
    129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232, 178, 185, 112, 104,
    218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162, 241,
    81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157,
    184, 84, 204, 176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93,
    222, 114, 67, 29, 24, 72, 243, 141, 128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn perm(i: usize) -> usize {
    PERM[i & 255] as usize
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn grad(hash: usize, x: f32, y: f32) -> f32 {
    let h = hash & 3;
    let (u, v) = if h < 2 { (x, y) } else { (y, x) };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 2D gradient noise mapped to `[0, 1]`. Tiles every 256 units.
pub fn perlin(p: Vec2) -> f32 {
    let cell = p.floor();
    let xi = (cell.x as i32 & 255) as usize;
    let yi = (cell.y as i32 & 255) as usize;
    let f = p - cell;

    let u = fade(f.x);
    let v = fade(f.y);

    let aa = perm(perm(xi) + yi);
    let ab = perm(perm(xi) + yi + 1);
    let ba = perm(perm(xi + 1) + yi);
    let bb = perm(perm(xi + 1) + yi + 1);

    let x1 = lerp(grad(aa, f.x, f.y), grad(ba, f.x - 1.0, f.y), u);
    let x2 = lerp(
        grad(ab, f.x, f.y - 1.0),
        grad(bb, f.x - 1.0, f.y - 1.0),
        u,
    );
    (lerp(x1, x2, v) + 1.0) * 0.5
}

/// Fractional Brownian motion over [`perlin`]: amplitude starts at `0.5` and halves,
/// frequency starts at `1` and doubles per octave.
pub fn fbm(p: Vec2, octaves: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    for _ in 0..octaves {
        value += amplitude * perlin(p * frequency);
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    value
}

/// Jittered feature point of cell `c`.
fn cell_point(c: IVec2, randomness: f32) -> Vec2 {
    let n = c
        .x
        .wrapping_mul(374_761_393)
        .wrapping_add(c.y.wrapping_mul(668_265_263));
    let hash = (n ^ (n >> 13)).wrapping_mul(1_274_126_177);
    let fx = (hash & 0xFFFF) as f32 / 65535.0;
    let fy = ((hash >> 16) & 0xFFFF) as f32 / 65535.0;
    c.as_vec2() + Vec2::splat(0.5) + (Vec2::new(fx, fy) - Vec2::splat(0.5)) * randomness
}

/// Distance to the nearest feature point among the 3x3 neighbouring cells, clamped to `[0, 1]`.
pub fn voronoi(p: Vec2, randomness: f32) -> f32 {
    let cell = p.floor().as_ivec2();
    let mut min_dist = f32::MAX;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let pt = cell_point(
                IVec2::new(cell.x.wrapping_add(dx), cell.y.wrapping_add(dy)),
                randomness,
            );
            min_dist = min_dist.min(p.distance(pt));
        }
    }
    min_dist.clamp(0.0, 1.0)
}

/// RGB to HSV, all components in `[0, 1]` for in-range input.
pub fn rgb_to_hsv(rgb: Vec3) -> Vec3 {
    let cmax = rgb.max_element();
    let cmin = rgb.min_element();
    let delta = cmax - cmin;
    let mut h = 0.0;
    if delta > 0.0001 {
        h = if cmax == rgb.x {
            ((rgb.y - rgb.z) / delta) % 6.0
        } else if cmax == rgb.y {
            (rgb.z - rgb.x) / delta + 2.0
        } else {
            (rgb.x - rgb.y) / delta + 4.0
        };
        h /= 6.0;
        if h < 0.0 {
            h += 1.0;
        }
    }
    let s = if cmax > 0.0001 { delta / cmax } else { 0.0 };
    Vec3::new(h, s, cmax)
}

/// HSV to RGB, the inverse of [`rgb_to_hsv`].
pub fn hsv_to_rgb(hsv: Vec3) -> Vec3 {
    let h = hsv.x * 6.0;
    let c = hsv.z * hsv.y;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = hsv.z - c;
    let rgb = if h < 1.0 {
        Vec3::new(c, x, 0.0)
    } else if h < 2.0 {
        Vec3::new(x, c, 0.0)
    } else if h < 3.0 {
        Vec3::new(0.0, c, x)
    } else if h < 4.0 {
        Vec3::new(0.0, x, c)
    } else if h < 5.0 {
        Vec3::new(x, 0.0, c)
    } else {
        Vec3::new(c, 0.0, x)
    };
    rgb + Vec3::splat(m)
}

#[inline]
fn overlay_channel(a: f32, b: f32) -> f32 {
    if a < 0.5 {
        2.0 * a * b
    } else {
        1.0 - 2.0 * (1.0 - a) * (1.0 - b)
    }
}

/// Per-channel blend of `b` onto `a`. Alpha always comes from `a`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Multiply,
    Screen,
    Overlay,
    Add,
}

pub fn blend(mode: BlendMode, a: Vec4, b: Vec4) -> Vec4 {
    let (ca, cb) = (a.truncate(), b.truncate());
    let rgb = match mode {
        BlendMode::Multiply => ca * cb,
        BlendMode::Screen => Vec3::ONE - (Vec3::ONE - ca) * (Vec3::ONE - cb),
        BlendMode::Overlay => Vec3::new(
            overlay_channel(ca.x, cb.x),
            overlay_channel(ca.y, cb.y),
            overlay_channel(ca.z, cb.z),
        ),
        BlendMode::Add => (ca + cb).clamp(Vec3::ZERO, Vec3::ONE),
    };
    rgb.extend(a.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn approx_vec3(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn perlin_is_half_on_lattice_points() {
        // Gradients vanish at integer coordinates.
        assert!(approx_eq(perlin(Vec2::new(3.0, 7.0)), 0.5));
        assert!(approx_eq(perlin(Vec2::new(-2.0, 0.0)), 0.5));
    }

    #[test]
    fn perlin_stays_in_unit_range() {
        for i in 0..500 {
            let p = Vec2::new(i as f32 * 0.173, i as f32 * 0.311 - 40.0);
            let v = perlin(p);
            assert!((0.0..=1.0).contains(&v), "perlin({p}) = {v}");
        }
    }

    #[test]
    fn perlin_tiles_every_256_units() {
        let p = Vec2::new(1.37, 4.61);
        assert!(approx_eq(perlin(p), perlin(p + Vec2::new(256.0, 0.0))));
    }

    #[test]
    fn fbm_amplitudes_sum_below_one() {
        for i in 0..200 {
            let v = fbm(Vec2::new(i as f32 * 0.07, 3.3), 8);
            assert!((0.0..1.0).contains(&v));
        }
        assert_eq!(fbm(Vec2::new(0.3, 0.3), 0), 0.0);
    }

    #[test]
    fn voronoi_is_clamped_and_zero_at_feature_points() {
        let c = IVec2::new(2, 5);
        let pt = cell_point(c, 1.0);
        assert!(approx_eq(voronoi(pt, 1.0), 0.0));
        for i in 0..200 {
            let v = voronoi(Vec2::new(i as f32 * 0.13, -(i as f32) * 0.07), 1.0);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn zero_randomness_centres_feature_points() {
        assert_eq!(cell_point(IVec2::new(-3, 4), 0.0), Vec2::new(-2.5, 4.5));
    }

    #[test]
    fn hsv_round_trips_primary_colors() {
        for rgb in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.2, 0.6, 0.4),
            Vec3::new(0.9, 0.1, 0.7),
        ] {
            assert!(approx_vec3(hsv_to_rgb(rgb_to_hsv(rgb)), rgb), "{rgb}");
        }
    }

    #[test]
    fn gray_has_no_hue_or_saturation() {
        let hsv = rgb_to_hsv(Vec3::splat(0.5));
        assert_eq!(hsv, Vec3::new(0.0, 0.0, 0.5));
    }

    #[test]
    fn blends_keep_alpha_of_first_input() {
        let a = Vec4::new(0.25, 0.5, 0.75, 0.3);
        let b = Vec4::new(0.5, 0.5, 0.5, 0.9);
        for mode in [
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Add,
        ] {
            assert_eq!(blend(mode, a, b).w, 0.3);
        }
    }

    #[test]
    fn blend_mode_math() {
        let a = Vec4::new(0.25, 0.5, 0.75, 1.0);
        let b = Vec4::new(0.5, 0.5, 0.5, 1.0);
        assert!(approx_vec3(
            blend(BlendMode::Multiply, a, b).truncate(),
            Vec3::new(0.125, 0.25, 0.375)
        ));
        assert!(approx_vec3(
            blend(BlendMode::Screen, a, b).truncate(),
            Vec3::new(0.625, 0.75, 0.875)
        ));
        assert!(approx_vec3(
            blend(BlendMode::Overlay, a, b).truncate(),
            Vec3::new(0.25, 0.5, 0.75)
        ));
        assert_eq!(
            blend(BlendMode::Add, a, b).truncate(),
            Vec3::new(0.75, 1.0, 1.0)
        );
    }
}
