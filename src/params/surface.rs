//! Surface shading parameters for the ripple overlay.

use glam::Vec3;

/// Lighting and edge-detection constants used by both surface renderers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParameters {
    /// Direction towards the light (normalized on use)
    pub light_direction: Vec3,

    /// Direction towards the viewer; constant for a flat orthographic overlay
    pub view_direction: Vec3,

    /// Gain applied to height differences before building the normal
    /// 3.0 = crisp normals on a 512 grid with heights in [-2, 2]
    pub normal_scale: f32,

    /// Slope band mapped through smoothstep into edge intensity
    /// Narrow band so only sharp wavefronts register
    pub edge_band: (f32, f32),

    /// Specular exponent (higher = tighter glint)
    pub shininess: f32,

    /// Multiplier on edge + specular before clamping to [0, 1]
    pub alpha_boost: f32,
}

impl Default for SurfaceParameters {
    fn default() -> Self {
        Self {
            light_direction: Vec3::new(-1.0, 1.0, 1.0),
            view_direction: Vec3::Z,
            normal_scale: 3.0,
            edge_band: (0.005, 0.02),
            shininess: 30.0,
            alpha_boost: 1.5,
        }
    }
}

impl SurfaceParameters {
    /// Normalized light direction
    pub fn light(&self) -> Vec3 {
        self.light_direction.normalize_or_zero()
    }

    /// Normalized view direction
    pub fn view(&self) -> Vec3 {
        self.view_direction.normalize_or_zero()
    }
}
