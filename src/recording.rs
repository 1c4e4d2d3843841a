//! Headless recording: drive a backend with a scripted pointer and save
//! composited frames as PNG.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::backend::WaveBackend;
use crate::driver::FrameDriver;
use crate::error::Result;
use crate::params::RecordingConfig;
use crate::pointer::PointerPort;

/// Pointer path used in place of live input: a circle around `center`
#[derive(Debug, Clone, Copy)]
pub struct PointerScript {
    pub center: Vec2,
    pub radius: f32,
    /// Frames per full revolution
    pub period_frames: u32,
    /// The pointer lifts for the last `lift_frames` of each revolution
    pub lift_frames: u32,
}

impl Default for PointerScript {
    fn default() -> Self {
        Self {
            center: Vec2::new(0.5, 0.5),
            radius: 0.25,
            period_frames: 120,
            lift_frames: 30,
        }
    }
}

impl PointerScript {
    /// Normalized position and active flag at `frame`
    pub fn sample(&self, frame: u64) -> (Vec2, bool) {
        let period = self.period_frames.max(1) as u64;
        let phase = (frame % period) as f32 / period as f32;
        let angle = phase * TAU;
        let position = self.center + Vec2::new(angle.cos(), angle.sin()) * self.radius;
        let active = frame % period < period.saturating_sub(self.lift_frames as u64);
        (position, active)
    }
}

/// Outcome of a recording run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingSummary {
    pub frames_rendered: u64,
    pub frames_saved: u64,
}

/// Run `config.total_frames` frames and write every `capture_every`-th one.
///
/// Stops early if the driver stops (overlay unavailable).
pub fn record<B: WaveBackend>(
    backend: B,
    config: &RecordingConfig,
    script: &PointerScript,
) -> Result<RecordingSummary> {
    std::fs::create_dir_all(config.frames_dir())?;

    let port = PointerPort::new();
    let mut driver = FrameDriver::start(backend, port.clone());
    let mut saved = 0;

    log::info!(
        "Recording {} frames into {}",
        config.total_frames,
        config.frames_dir().display()
    );

    for frame in 0..config.total_frames {
        let (position, active) = script.sample(frame);
        port.update_pointer(position.x, position.y, active);

        if !driver.tick() {
            log::warn!("Recording stopped early at frame {}", frame);
            break;
        }

        if config.should_capture(frame) {
            if let Some(backend) = driver.backend_mut() {
                let image = backend.capture()?;
                let path = config.frame_path(frame);
                image.save(&path)?;
                log::debug!("Saved {}", path.display());
                saved += 1;
            }
        }
    }

    let summary = RecordingSummary {
        frames_rendered: driver.frame_count(),
        frames_saved: saved,
    };
    driver.stop();

    log::info!(
        "Recording finished: {} frames rendered, {} saved",
        summary.frames_rendered,
        summary.frames_saved
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::params::{SimulationParameters, SurfaceParameters};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_script_circle_and_lift() {
        let script = PointerScript {
            center: Vec2::new(0.5, 0.5),
            radius: 0.25,
            period_frames: 4,
            lift_frames: 1,
        };
        let (p0, a0) = script.sample(0);
        assert_abs_diff_eq!(p0.x, 0.75);
        assert_abs_diff_eq!(p0.y, 0.5);
        assert!(a0);

        let (p1, _) = script.sample(1);
        assert_abs_diff_eq!(p1.x, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(p1.y, 0.75);

        assert!(!script.sample(3).1);
        assert!(script.sample(4).1);
    }

    #[test]
    fn test_record_writes_captured_frames() {
        let dir = std::env::temp_dir().join(format!("ripplefx-record-{}", std::process::id()));
        let config = RecordingConfig {
            total_frames: 10,
            capture_every: 4,
            output_dir: dir.clone(),
            width: 32,
            height: 16,
        };
        let params = SimulationParameters {
            resolution: (24, 24),
            disturbance_radius: 0.1,
            ..Default::default()
        };
        let backend = CpuBackend::new(params, SurfaceParameters::default())
            .unwrap()
            .with_capture_size(config.width, config.height);

        let summary = record(backend, &config, &PointerScript::default()).unwrap();
        assert_eq!(
            summary,
            RecordingSummary {
                frames_rendered: 10,
                frames_saved: 3,
            }
        );

        for frame in [0, 4, 8] {
            let image = image::open(config.frame_path(frame)).unwrap();
            assert_eq!((image.width(), image.height()), (32, 16));
        }
        assert!(!config.frame_path(1).exists());

        std::fs::remove_dir_all(dir).unwrap();
    }
}
