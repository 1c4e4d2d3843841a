//! Window and recording configuration.

use std::path::PathBuf;

/// Window configuration for the interactive overlay
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            title: "ripplefx".to_string(),
        }
    }
}

/// Headless recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Number of frames to simulate
    pub total_frames: u64,

    /// Save every n-th frame (frame 0 included)
    pub capture_every: u64,

    /// Output directory; frames go to `<output_dir>/frames`
    pub output_dir: PathBuf,

    /// Size of the saved images (pixels)
    pub width: u32,
    pub height: u32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            total_frames: 240,
            capture_every: 30,
            output_dir: PathBuf::from("recording"),
            width: 640,
            height: 360,
        }
    }
}

impl RecordingConfig {
    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Path of a captured frame
    pub fn frame_path(&self, frame: u64) -> PathBuf {
        self.frames_dir().join(format!("frame_{:05}.png", frame))
    }

    /// Whether `frame` should be written to disk
    pub fn should_capture(&self, frame: u64) -> bool {
        self.capture_every > 0 && frame % self.capture_every == 0
    }

    /// Number of frames that will be written
    pub fn captured_frames(&self) -> u64 {
        if self.capture_every == 0 {
            return 0;
        }
        self.total_frames.div_ceil(self.capture_every)
    }
}
