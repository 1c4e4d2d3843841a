//! Frame driver: one simulate → swap → render cycle per display frame.

use crate::backend::WaveBackend;
use crate::pointer::PointerPort;

/// Owns a backend for the lifetime of the effect and runs it frame by frame.
///
/// The host loop calls [`FrameDriver::tick`] once per display refresh and
/// keeps scheduling frames while it returns `true`.
pub struct FrameDriver<B: WaveBackend> {
    backend: Option<B>,
    pointer: PointerPort,
    frames: u64,
}

impl<B: WaveBackend> FrameDriver<B> {
    /// Begin driving a freshly allocated backend
    pub fn start(backend: B, pointer: PointerPort) -> Self {
        let (width, height) = backend.resolution();
        log::info!(
            "Ripple overlay started ({} backend, {}x{} grid)",
            backend.name(),
            width,
            height
        );
        Self {
            backend: Some(backend),
            pointer,
            frames: 0,
        }
    }

    /// Run one frame. Returns whether another frame should be scheduled.
    ///
    /// A render failure stops the driver instead of surfacing an error.
    pub fn tick(&mut self) -> bool {
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };

        let pointer = self.pointer.snapshot();
        backend.simulate(pointer);
        backend.swap();

        match backend.render() {
            Ok(()) => {
                self.frames += 1;
                true
            }
            Err(e) => {
                log::warn!("Ripple overlay stopped: {}", e);
                self.stop();
                false
            }
        }
    }

    /// Stop the frame loop and release the buffers. Safe to call twice.
    pub fn stop(&mut self) {
        if let Some(backend) = self.backend.take() {
            log::info!(
                "Ripple overlay stopped after {} frames ({} backend)",
                self.frames,
                backend.name()
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.backend.is_some()
    }

    /// Frames rendered successfully since start
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn pointer(&self) -> &PointerPort {
        &self.pointer
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Zero the wave field, keeping the loop running
    pub fn reset(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            backend.reset();
        }
    }
}

impl<B: WaveBackend> Drop for FrameDriver<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::error::{Result, RippleError};
    use crate::params::{SimulationParameters, SurfaceParameters};
    use crate::pointer::PointerState;
    use image::RgbaImage;
    use std::borrow::Cow;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records the call sequence and fails rendering after `fail_after` frames
    struct ScriptedBackend {
        calls: Rc<RefCell<Vec<String>>>,
        fail_after: Option<usize>,
        renders: usize,
    }

    impl WaveBackend for ScriptedBackend {
        fn simulate(&mut self, pointer: PointerState) {
            self.calls
                .borrow_mut()
                .push(format!("simulate:{}", pointer.active));
        }

        fn swap(&mut self) {
            self.calls.borrow_mut().push("swap".to_string());
        }

        fn render(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("render".to_string());
            self.renders += 1;
            match self.fail_after {
                Some(limit) if self.renders > limit => {
                    Err(RippleError::OverlayUnavailable("view unmounted".to_string()))
                }
                _ => Ok(()),
            }
        }

        fn heights(&self) -> Result<Cow<'_, [f32]>> {
            Ok(Cow::Owned(Vec::new()))
        }

        fn resolution(&self) -> (u32, u32) {
            (1, 1)
        }

        fn reset(&mut self) {
            self.calls.borrow_mut().push("reset".to_string());
        }

        fn capture(&mut self) -> Result<RgbaImage> {
            Err(RippleError::CaptureUnsupported)
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn scripted(fail_after: Option<usize>) -> (ScriptedBackend, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let backend = ScriptedBackend {
            calls: Rc::clone(&calls),
            fail_after,
            renders: 0,
        };
        (backend, calls)
    }

    #[test]
    fn test_tick_order() {
        let (backend, calls) = scripted(None);
        let port = PointerPort::new();
        let mut driver = FrameDriver::start(backend, port.clone());

        assert!(driver.tick());
        port.update_pointer(0.5, 0.5, true);
        assert!(driver.tick());

        assert_eq!(
            *calls.borrow(),
            vec![
                "simulate:false",
                "swap",
                "render",
                "simulate:true",
                "swap",
                "render"
            ]
        );
        assert_eq!(driver.frame_count(), 2);
    }

    #[test]
    fn test_unavailable_overlay_stops_loop() {
        let (backend, calls) = scripted(Some(2));
        let mut driver = FrameDriver::start(backend, PointerPort::new());

        assert!(driver.tick());
        assert!(driver.tick());
        assert!(!driver.tick());
        assert!(!driver.is_running());

        // No further work is scheduled
        let recorded = calls.borrow().len();
        assert!(!driver.tick());
        assert_eq!(calls.borrow().len(), recorded);
        assert_eq!(driver.frame_count(), 2);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (backend, _) = scripted(None);
        let mut driver = FrameDriver::start(backend, PointerPort::new());
        driver.stop();
        driver.stop();
        assert!(!driver.is_running());
        assert!(driver.backend().is_none());
        assert!(!driver.tick());
    }

    #[test]
    fn test_cpu_driver_reads_last_written_buffer() {
        let params = SimulationParameters {
            resolution: (32, 32),
            disturbance_radius: 0.1,
            ..Default::default()
        };
        let port = PointerPort::new();
        let mut driver = FrameDriver::start(
            CpuBackend::new(params, SurfaceParameters::default()).unwrap(),
            port.clone(),
        );

        port.update_pointer(0.5, 0.5, true);
        for _ in 0..5 {
            let cpu = driver.backend().unwrap();
            let read_before = cpu.buffers().read_index();
            let read_ptr = cpu.field() as *const _;

            assert!(driver.tick());

            let cpu = driver.backend().unwrap();
            assert_eq!(cpu.buffers().read_index(), 1 - read_before);
            assert!(!std::ptr::eq(read_ptr, cpu.field()));
        }
        assert!(driver.backend().unwrap().field().max_abs_height() > 0.0);

        driver.reset();
        assert_eq!(driver.backend().unwrap().field().max_abs_height(), 0.0);
    }
}
