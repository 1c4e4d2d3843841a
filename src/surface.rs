//! CPU surface renderer: edge and specular highlights from the height field.
//!
//! The overlay never draws a filled surface. Flat water is fully transparent;
//! only steep wavefronts and tight glints produce white with some alpha, which
//! is then difference-blended over the page beneath.

use glam::Vec3;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::params::SurfaceParameters;
use crate::wave::{smoothstep, WaveField};

/// Overlay alpha per texel, row-major with row 0 at the top
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    width: u32,
    height: u32,
    alpha: Vec<f32>,
}

impl OverlayFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn alpha(&self) -> &[f32] {
        &self.alpha
    }

    pub fn alpha_at(&self, col: u32, row: u32) -> f32 {
        self.alpha[row as usize * self.width as usize + col as usize]
    }

    /// Straight (non-premultiplied) RGBA: always white
    pub fn rgba_at(&self, col: u32, row: u32) -> [f32; 4] {
        [1.0, 1.0, 1.0, self.alpha_at(col, row)]
    }

    pub fn max_alpha(&self) -> f32 {
        self.alpha.iter().fold(0.0f32, |acc, a| acc.max(*a))
    }

    /// Bilinearly interpolated alpha at a pixel of a `width` x `height` image
    /// the overlay is stretched over
    pub fn sample_stretched(&self, x: u32, y: u32, width: u32, height: u32) -> f32 {
        let fx = (x as f32 + 0.5) / width as f32 * self.width as f32 - 0.5;
        let fy = (y as f32 + 0.5) / height as f32 * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let at = |c: f32, r: f32| -> f32 {
            let c = (c as i64).clamp(0, self.width as i64 - 1) as u32;
            let r = (r as i64).clamp(0, self.height as i64 - 1) as u32;
            self.alpha_at(c, r)
        };

        let top = at(x0, y0) + (at(x0 + 1.0, y0) - at(x0, y0)) * tx;
        let bottom = at(x0, y0 + 1.0) + (at(x0 + 1.0, y0 + 1.0) - at(x0, y0 + 1.0)) * tx;
        top + (bottom - top) * ty
    }
}

/// Shades a wave field into overlay alpha
#[derive(Debug, Clone)]
pub struct SurfaceRenderer {
    params: SurfaceParameters,
    light: Vec3,
    view: Vec3,
}

impl SurfaceRenderer {
    pub fn new(params: SurfaceParameters) -> Self {
        Self {
            light: params.light(),
            view: params.view(),
            params,
        }
    }

    pub fn params(&self) -> &SurfaceParameters {
        &self.params
    }

    /// Surface normal from central differences, north = up
    pub fn normal(&self, field: &WaveField, col: u32, row: u32) -> Vec3 {
        let (c, r) = (col as i64, row as i64);
        let north = field.height_clamped(c, r - 1);
        let south = field.height_clamped(c, r + 1);
        let east = field.height_clamped(c + 1, r);
        let west = field.height_clamped(c - 1, r);
        let scale = self.params.normal_scale;

        Vec3::new((west - east) * scale, (south - north) * scale, 1.0).normalize()
    }

    /// Overlay alpha for a surface normal
    pub fn shade(&self, normal: Vec3) -> f32 {
        let slope = 1.0 - normal.z;
        let (low, high) = self.params.edge_band;
        let edge = smoothstep(low, high, slope);

        let reflected = reflect(-self.light, normal);
        let specular = self.view.dot(reflected).max(0.0).powf(self.params.shininess);

        ((edge + specular) * self.params.alpha_boost).clamp(0.0, 1.0)
    }

    pub fn shade_texel(&self, field: &WaveField, col: u32, row: u32) -> f32 {
        self.shade(self.normal(field, col, row))
    }

    /// Shade every texel of `field` into `frame`
    pub fn render(&self, field: &WaveField, frame: &mut OverlayFrame) {
        debug_assert_eq!(field.width(), frame.width);
        debug_assert_eq!(field.height(), frame.height);

        let width = frame.width as usize;
        frame
            .alpha
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out)| {
                for (col, alpha) in out.iter_mut().enumerate() {
                    *alpha = self.shade_texel(field, col as u32, row as u32);
                }
            });
    }
}

/// GLSL/WGSL `reflect`: incident `i` about normal `n`
#[inline]
fn reflect(i: Vec3, n: Vec3) -> Vec3 {
    i - 2.0 * n.dot(i) * n
}

/// Page stand-in drawn under the overlay: dark vertical gradient with light
/// diagonal stripes. `backdrop.wgsl` uses the same formula.
pub fn backdrop_color(u: f32, v: f32) -> [f32; 3] {
    let base = 0.08 + 0.12 * v;
    let stripe = if ((u + v) * 6.0).fract() < 0.5 { 0.55 } else { 0.0 };
    let r = base + stripe;
    let g = base + stripe * 0.85;
    let b = base + 0.06 + stripe * 0.7;
    [r.min(1.0), g.min(1.0), b.min(1.0)]
}

/// Difference blend of white at `alpha` over `dst`: `alpha·(1 - dst) + dst·(1 - alpha)`
#[inline]
pub fn difference_blend(dst: f32, alpha: f32) -> f32 {
    alpha * (1.0 - dst) + dst * (1.0 - alpha)
}

/// Render the backdrop with the overlay stretched over it
pub fn composite(frame: &OverlayFrame, width: u32, height: u32) -> RgbaImage {
    let mut image = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let u = (x as f32 + 0.5) / width as f32;
        let v = 1.0 - (y as f32 + 0.5) / height as f32;
        let alpha = frame.sample_stretched(x, y, width, height);
        let [r, g, b] = backdrop_color(u, v).map(|c| difference_blend(c, alpha));
        *pixel = Rgba([to_u8(r), to_u8(g), to_u8(b), 255]);
    }
    image
}

#[inline]
fn to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}
