use crate::config::AppConfig;
use crate::recording::spawn_recording;
use anyhow::Result;
use log::{debug, error, info, warn};
use nback_render::{load_stimuli, TaskRenderer};
use nback_task::{TaskEvent, TaskStateMachine};
use nback_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::sync::Arc;
use std::thread::JoinHandle;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;

pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<TaskRenderer>,
    task: TaskStateMachine<HighPrecisionTimer, ThreadRng>,
    recorder: Option<JoinHandle<()>>,
    scale_factor: f64,
    results_written: bool,
    should_exit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let stimuli = config.task.stimulus_set()?;
        let timer = HighPrecisionTimer::new();
        let rng = rand::rng();
        let task = TaskStateMachine::new(config.task.clone(), stimuli, timer, rng);

        Ok(Self {
            config,
            window: None,
            pixels: None,
            renderer: None,
            task,
            recorder: None,
            scale_factor: 1.0,
            results_written: false,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;

        info!("platform: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
        info!("press SPACE when the image repeats the one shown two steps earlier; ESC exits");

        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Image Display")
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH as f64, WINDOW_HEIGHT as f64))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(attributes)?);

        if let Some(monitor) = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
        {
            let monitor_size = monitor.size();
            let outer = window.outer_size();
            let position = PhysicalPosition::new(
                monitor.position().x + (monitor_size.width.saturating_sub(outer.width) / 2) as i32,
                monitor.position().y
                    + (monitor_size.height.saturating_sub(outer.height) / 2) as i32,
            );
            window.set_outer_position(position);
        }

        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();
        info!(
            "window: {}x{} at scale {:.2}",
            physical_size.width, physical_size.height, self.scale_factor
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        let stimuli = load_stimuli(&self.config.task.stimulus_set()?)?;
        self.renderer = Some(TaskRenderer::new(
            physical_size.width,
            physical_size.height,
            stimuli,
        )?);

        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (&mut self.pixels, &mut self.renderer) else {
            return Ok(());
        };
        let start = self.task.timer.now();

        let view = self.task.view();
        renderer.render_frame(&view, pixels.frame_mut())?;
        pixels.render()?;

        let elapsed = self.task.timer.elapsed(start);
        self.task.timer.record_frame(elapsed);
        Ok(())
    }

    fn update(&mut self) {
        for event in self.task.update() {
            match event {
                TaskEvent::CountdownTick(remaining) => debug!("countdown: {}", remaining),
                TaskEvent::CountdownFinished => self.start_recording(),
                TaskEvent::StimulusShown(index) => debug!("stimulus {} shown", index),
                TaskEvent::TaskFinished => self.finish_task(),
            }
        }
    }

    /// The trial start is the only signal the recorder shares with the
    /// presentation loop; from here on it runs to completion on its own.
    fn start_recording(&mut self) {
        if self.recorder.is_some() {
            return;
        }
        let duration = self.config.task.task_duration();
        info!("trial started, recording for {} s", duration.as_secs());
        self.recorder = Some(spawn_recording(
            self.config.cortex.clone(),
            self.config.recording.clone(),
            duration,
        ));
    }

    fn finish_task(&mut self) {
        if self.results_written {
            return;
        }
        self.results_written = true;
        let summary = self.task.summary();
        match nback_task::write_summary(&self.config.task.results_path, &summary) {
            Ok(()) => info!(
                "results saved to {}",
                self.config.task.results_path.display()
            ),
            Err(e) => error!("failed to save results: {:#}", e),
        }
    }

    fn handle_input(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::{KeyCode, PhysicalKey};
        if let PhysicalKey::Code(code) = key {
            match code {
                KeyCode::Space => {
                    if self.task.flag_repeat() {
                        debug!("repeat flagged, score now {}", self.task.score());
                    }
                }
                KeyCode::Escape => self.cleanup_and_exit(event_loop),
                _ => {}
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!("failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!("failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                warn!("failed to resize canvas: {}", e);
            }
        }
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        info!("final score: {}", self.task.score());
        let stats = self.task.timer.timing_stats();
        if stats.average_frame_time_ns > 0.0 {
            debug!(
                "frame time {:.3} ms avg, jitter {:.3} ms, {:.1} fps",
                stats.average_frame_time_ns / 1e6,
                stats.jitter_ns / 1e6,
                stats.effective_fps
            );
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!("render error: {:#}", e);
                }
                self.update();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
