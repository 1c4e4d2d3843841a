//! Ripplefx - Water ripples that follow the cursor
//!
//! A damped wave field is disturbed by the pointer and drawn as a
//! difference-blended highlight over a striped backdrop.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use ripplefx::cli::{Args, BackendKind};
use ripplefx::params::{RenderConfig, SimulationParameters, SurfaceParameters};
use ripplefx::recording::{record, PointerScript};
use ripplefx::{CpuBackend, FrameDriver, GpuBackend, PointerPort};

/// Main application state
struct App {
    window: Option<Arc<Window>>,
    driver: Option<FrameDriver<GpuBackend>>,
    pointer: PointerPort,

    // Configuration
    params: SimulationParameters,
    surface: SurfaceParameters,
    render_config: RenderConfig,
}

impl App {
    fn new(params: SimulationParameters, render_config: RenderConfig) -> Self {
        Self {
            window: None,
            driver: None,
            pointer: PointerPort::new(),
            params,
            surface: SurfaceParameters::default(),
            render_config,
        }
    }

    fn is_running(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| d.is_running())
    }

    fn viewport(&self) -> (u32, u32) {
        self.window
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                (size.width, size.height)
            })
            .unwrap_or((0, 0))
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(driver) = self.driver.as_mut() {
            driver.stop();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.is_running() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let backend = match pollster::block_on(GpuBackend::for_window(
            Arc::clone(&window),
            self.params,
            self.surface,
        )) {
            Ok(backend) => backend,
            Err(e) => {
                // No GPU means no effect; leave quietly
                log::warn!("Ripple overlay unavailable: {}", e);
                event_loop.exit();
                return;
            }
        };

        log::info!("Move the cursor to make ripples. R resets, ESC quits");

        self.driver = Some(FrameDriver::start(backend, self.pointer.clone()));
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => self.shutdown(event_loop),
                KeyCode::KeyR => {
                    if let Some(driver) = self.driver.as_mut() {
                        driver.reset();
                        log::info!("Wave field reset");
                    }
                }
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                let (width, height) = self.viewport();
                self.pointer
                    .update_from_page(position.x, position.y, width, height, true);
            }
            WindowEvent::CursorLeft { .. } => self.pointer.deactivate(),
            WindowEvent::Touch(Touch {
                phase, location, id, ..
            }) => match phase {
                TouchPhase::Started | TouchPhase::Moved => {
                    let (width, height) = self.viewport();
                    self.pointer
                        .update_touch(id, location.x, location.y, width, height);
                }
                TouchPhase::Ended | TouchPhase::Cancelled => self.pointer.end_touch(id),
            },
            WindowEvent::Resized(size) => {
                if let Some(backend) = self.driver.as_mut().and_then(|d| d.backend_mut()) {
                    backend.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(driver) = self.driver.as_mut() {
                    if !driver.tick() {
                        log::warn!("Frame loop halted; close the window to exit");
                    }
                }
            }
            _ => {}
        }
    }
}

fn run_headless(args: &Args, params: SimulationParameters) -> anyhow::Result<()> {
    let config = args.recording_config();
    let surface = SurfaceParameters::default();
    let script = PointerScript::default();

    let summary = match args.backend {
        BackendKind::Cpu => {
            let backend =
                CpuBackend::new(params, surface)?.with_capture_size(config.width, config.height);
            record(backend, &config, &script)?
        }
        BackendKind::Gpu => {
            let backend = pollster::block_on(GpuBackend::offscreen(
                config.width,
                config.height,
                params,
                surface,
            ))
            .context("GPU backend requested but unavailable")?;
            record(backend, &config, &script)?
        }
    };

    log::info!(
        "Wrote {} frames to {}",
        summary.frames_saved,
        config.frames_dir().display()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let params = args.simulation_parameters();
    params.validate().context("invalid simulation parameters")?;

    if args.headless {
        return run_headless(&args, params);
    }

    let mut app = App::new(params, args.render_config());
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
