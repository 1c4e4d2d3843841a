//! Parameter definitions with documented units and defaults.
//!
//! Defaults reproduce the reference ripple look:
//! - 512x512 grid, damping 0.02, stiffness 0.04
//! - fingertip brush (radius 0.025, strength 0.5)
//! - sharp edges plus a tight specular glint

mod render;
mod simulation;
mod surface;

// Re-export all types
pub use render::{RecordingConfig, RenderConfig};
pub use simulation::{SimulationParameters, HEIGHT_LIMIT, MAX_RESOLUTION};
pub use surface::SurfaceParameters;
