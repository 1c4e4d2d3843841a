//! Height/velocity grid storage.

use bytemuck::{Pod, Zeroable};

/// One simulation cell: matches the `Rg32Float` layout used on the GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Texel {
    pub height: f32,
    pub velocity: f32,
}

/// Row-major grid of texels.
///
/// Row 0 is the top of the overlay. Texel `(col, row)` sits at the normalized
/// position `((col + 0.5) / width, 1 - (row + 0.5) / height)`, so `v` grows
/// upward like texture coordinates while rows grow downward like pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveField {
    width: u32,
    height: u32,
    texels: Vec<Texel>,
}

impl WaveField {
    /// Allocate a zeroed field
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![Texel::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    pub fn texels_mut(&mut self) -> &mut [Texel] {
        &mut self.texels
    }

    #[inline]
    pub fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    #[inline]
    pub fn get(&self, col: u32, row: u32) -> Texel {
        self.texels[self.index(col, row)]
    }

    pub fn set(&mut self, col: u32, row: u32, texel: Texel) {
        let idx = self.index(col, row);
        self.texels[idx] = texel;
    }

    /// Height at a possibly out-of-range coordinate, clamped to the edge
    #[inline]
    pub fn height_clamped(&self, col: i64, row: i64) -> f32 {
        let col = col.clamp(0, self.width as i64 - 1) as u32;
        let row = row.clamp(0, self.height as i64 - 1) as u32;
        self.texels[self.index(col, row)].height
    }

    /// Normalized position of a texel center
    #[inline]
    pub fn uv(&self, col: u32, row: u32) -> (f32, f32) {
        texel_uv(col, row, self.width, self.height)
    }

    /// Texel whose center is closest to a normalized position
    pub fn nearest_texel(&self, u: f32, v: f32) -> (u32, u32) {
        let col = (u * self.width as f32).floor() as i64;
        let row = ((1.0 - v) * self.height as f32).floor() as i64;
        (
            col.clamp(0, self.width as i64 - 1) as u32,
            row.clamp(0, self.height as i64 - 1) as u32,
        )
    }

    /// Bilinearly interpolated height at a normalized position
    pub fn sample_height(&self, u: f32, v: f32) -> f32 {
        let x = u * self.width as f32 - 0.5;
        let y = (1.0 - v) * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = lerp(
            self.height_clamped(x0, y0),
            self.height_clamped(x0 + 1, y0),
            fx,
        );
        let bottom = lerp(
            self.height_clamped(x0, y0 + 1),
            self.height_clamped(x0 + 1, y0 + 1),
            fx,
        );
        lerp(top, bottom, fy)
    }

    /// Largest absolute height in the grid
    pub fn max_abs_height(&self) -> f32 {
        self.texels
            .iter()
            .fold(0.0f32, |acc, t| acc.max(t.height.abs()))
    }

    /// Copy of all heights in row-major order
    pub fn heights(&self) -> Vec<f32> {
        self.texels.iter().map(|t| t.height).collect()
    }

    /// Reset every texel to rest
    pub fn clear(&mut self) {
        self.texels.fill(Texel::default());
    }
}

/// Normalized position of texel `(col, row)` in a `width` x `height` grid
#[inline]
pub fn texel_uv(col: u32, row: u32, width: u32, height: u32) -> (f32, f32) {
    (
        (col as f32 + 0.5) / width as f32,
        1.0 - (row as f32 + 0.5) / height as f32,
    )
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
