//! Wave simulation parameters.

use crate::error::{Result, RippleError};

/// Heights are clamped to `[-HEIGHT_LIMIT, HEIGHT_LIMIT]` after every step
pub const HEIGHT_LIMIT: f32 = 2.0;

/// Largest grid side accepted (matches the default wgpu 2D texture limit)
pub const MAX_RESOLUTION: u32 = 8192;

/// Damped spring-lattice wave parameters, fixed for the lifetime of an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    /// Fraction of velocity removed per step (dimensionless, per step)
    /// Default 0.02: ripples fade out quickly enough to avoid clutter
    pub damping: f32,

    /// Spring constant applied to the discrete Laplacian (per step²)
    /// Default 0.04: moderate propagation speed
    pub stiffness: f32,

    /// Radius of the pointer brush in normalized simulation space
    /// Default 0.025: small sharp brush, like a fingertip
    pub disturbance_radius: f32,

    /// Height pushed down at the brush center each step
    pub disturbance_strength: f32,

    /// Grid size in texels (width, height)
    pub resolution: (u32, u32),
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            damping: 0.02,
            stiffness: 0.04,
            disturbance_radius: 0.025,
            disturbance_strength: 0.5,
            resolution: (512, 512),
        }
    }
}

impl SimulationParameters {
    /// Number of texels in one buffer
    pub fn texel_count(&self) -> usize {
        self.resolution.0 as usize * self.resolution.1 as usize
    }

    /// Reject configurations the explicit integrator cannot run stably.
    ///
    /// For a Laplacian eigenvalue `λ` the per-step update matrix has
    /// determinant `1 - damping` and is stable while
    /// `stiffness·λ < 4 - 2·damping`. The 4-neighbour stencil tops out at
    /// `λ = 8`, which gives the bound checked here.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.resolution;
        if width == 0 || height == 0 {
            return Err(RippleError::InvalidParameter(format!(
                "resolution must be non-zero, got {}x{}",
                width, height
            )));
        }
        if width > MAX_RESOLUTION || height > MAX_RESOLUTION {
            return Err(RippleError::InvalidParameter(format!(
                "resolution {}x{} exceeds {}",
                width, height, MAX_RESOLUTION
            )));
        }

        let scalars = [
            ("damping", self.damping),
            ("stiffness", self.stiffness),
            ("disturbance_radius", self.disturbance_radius),
            ("disturbance_strength", self.disturbance_strength),
        ];
        if let Some((name, value)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RippleError::InvalidParameter(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }

        if !(0.0..1.0).contains(&self.damping) {
            return Err(RippleError::InvalidParameter(format!(
                "damping must be in [0, 1), got {}",
                self.damping
            )));
        }
        if self.stiffness <= 0.0 {
            return Err(RippleError::InvalidParameter(format!(
                "stiffness must be > 0, got {}",
                self.stiffness
            )));
        }
        if self.disturbance_radius <= 0.0 || self.disturbance_radius > 1.0 {
            return Err(RippleError::InvalidParameter(format!(
                "disturbance_radius must be in (0, 1], got {}",
                self.disturbance_radius
            )));
        }
        if self.disturbance_strength < 0.0 {
            return Err(RippleError::InvalidParameter(format!(
                "disturbance_strength must be >= 0, got {}",
                self.disturbance_strength
            )));
        }
        if 8.0 * self.stiffness >= 4.0 - 2.0 * self.damping {
            return Err(RippleError::InvalidParameter(format!(
                "stiffness {} with damping {} is outside the stable region (8k < 4 - 2f)",
                self.stiffness, self.damping
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = SimulationParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.texel_count(), 512 * 512);
    }

    #[test]
    fn test_rejects_unstable_stiffness() {
        let params = SimulationParameters {
            stiffness: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(RippleError::InvalidParameter(_))
        ));

        // Just inside the bound for damping = 0.02: k < (4 - 0.04) / 8 = 0.495
        let params = SimulationParameters {
            stiffness: 0.49,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let cases = [
            SimulationParameters {
                resolution: (0, 512),
                ..Default::default()
            },
            SimulationParameters {
                resolution: (MAX_RESOLUTION + 1, 16),
                ..Default::default()
            },
            SimulationParameters {
                damping: 1.0,
                ..Default::default()
            },
            SimulationParameters {
                damping: -0.1,
                ..Default::default()
            },
            SimulationParameters {
                stiffness: 0.0,
                ..Default::default()
            },
            SimulationParameters {
                disturbance_radius: 0.0,
                ..Default::default()
            },
            SimulationParameters {
                disturbance_strength: -1.0,
                ..Default::default()
            },
            SimulationParameters {
                disturbance_strength: f32::NAN,
                ..Default::default()
            },
        ];

        for params in cases {
            assert!(params.validate().is_err(), "accepted {:?}", params);
        }
    }
}
