//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::params::{RecordingConfig, RenderConfig, SimulationParameters};

/// Simulation backend for headless runs
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Cpu,
    Gpu,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "ripplefx")]
#[command(about = "Cursor-driven water ripple overlay", long_about = None)]
pub struct Args {
    /// Simulation grid size (texels per side)
    #[arg(long, value_name = "TEXELS", default_value_t = 512)]
    pub resolution: u32,

    /// Velocity damping per step
    #[arg(long, default_value_t = 0.02)]
    pub damping: f32,

    /// Spring constant applied to the Laplacian
    #[arg(long, default_value_t = 0.04)]
    pub stiffness: f32,

    /// Pointer brush radius (normalized)
    #[arg(long, default_value_t = 0.025)]
    pub radius: f32,

    /// Pointer brush strength
    #[arg(long, default_value_t = 0.5)]
    pub strength: f32,

    /// Window width (pixels)
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Run without a window and write PNG frames
    #[arg(long)]
    pub headless: bool,

    /// Backend used by --headless
    #[arg(long, value_enum, default_value = "cpu")]
    pub backend: BackendKind,

    /// Frames to simulate in headless mode
    #[arg(long, default_value_t = 240)]
    pub frames: u64,

    /// Save every n-th frame in headless mode
    #[arg(long, value_name = "N", default_value_t = 30)]
    pub capture_every: u64,

    /// Output directory for headless frames
    #[arg(long, value_name = "DIR", default_value = "recording")]
    pub output: PathBuf,
}

impl Args {
    pub fn simulation_parameters(&self) -> SimulationParameters {
        SimulationParameters {
            damping: self.damping,
            stiffness: self.stiffness,
            disturbance_radius: self.radius,
            disturbance_strength: self.strength,
            resolution: (self.resolution, self.resolution),
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..Default::default()
        }
    }

    /// Recording configuration; headless images use the window size
    pub fn recording_config(&self) -> RecordingConfig {
        RecordingConfig {
            total_frames: self.frames,
            capture_every: self.capture_every,
            output_dir: self.output.clone(),
            width: self.width,
            height: self.height,
        }
    }
}
