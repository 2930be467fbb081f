//! av - live audio-reactive spectrum strip
//!
//! Listens to the default microphone and lights up one band per musical
//! note, redrawn at the display's refresh rate.

mod cli;

use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId, WindowLevel},
};

use av_strip::audio::{list_input_devices, AudioCapture, RingReader, SampleRing, SpectralBank};
use av_strip::params::{AnalysisConfig, CaptureConfig, RenderConfig};
use av_strip::rendering::{
    load_shader_source, Extent, FrameOutcome, GeometryBuffer, GpuContext, PipelineState,
    PresentationPipeline, WgpuBackend,
};
use av_strip::strip::{PeakNormalizer, StripMesh, StripSystem};
use cli::Args;

/// Nominal rate used to build the bank when no device could be opened
const SILENT_SAMPLE_RATE: u32 = 48_000;

struct FpsTracker {
    frame_times: VecDeque<Duration>,
    last_frame: Instant,
    last_report: Instant,
}

impl FpsTracker {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_times: VecDeque::new(),
            last_frame: now,
            last_report: now,
        }
    }

    fn record_frame(&mut self) {
        let now = Instant::now();
        self.frame_times.push_back(now - self.last_frame);
        self.last_frame = now;
        if self.frame_times.len() > 60 {
            self.frame_times.pop_front();
        }

        if now - self.last_report > Duration::from_secs(1) {
            log::debug!("FPS: {:.1}", self.current_fps());
            self.last_report = now;
        }
    }

    fn current_fps(&self) -> f32 {
        let total: Duration = self.frame_times.iter().sum();
        let average = total.as_secs_f32() / self.frame_times.len().max(1) as f32;
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }
}

/// Main application state
struct App {
    render_config: RenderConfig,
    shader: Cow<'static, str>,

    strip: StripSystem,
    reader: RingReader,
    capture: Option<AudioCapture>,
    geometry: GeometryBuffer,

    // Window and rendering
    window: Option<Arc<Window>>,
    pipeline: Option<PresentationPipeline<WgpuBackend>>,

    fps: FpsTracker,
    /// First fatal error; returned from `main` after the loop exits
    error: Option<anyhow::Error>,
}

impl App {
    fn new(
        render_config: RenderConfig,
        shader: Cow<'static, str>,
        strip: StripSystem,
        reader: RingReader,
        capture: Option<AudioCapture>,
    ) -> Self {
        let mut geometry = GeometryBuffer::new(strip.mesh.vertex_count(), strip.mesh.index_count());
        let (vertices, indices) = geometry.regions_mut();
        strip.mesh.write_topology(vertices, indices);

        Self {
            render_config,
            shader,
            strip,
            reader,
            capture,
            geometry,
            window: None,
            pipeline: None,
            fps: FpsTracker::new(),
            error: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));
        if self.render_config.floating {
            window_attributes = window_attributes.with_window_level(WindowLevel::AlwaysOnTop);
        }

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let gpu = pollster::block_on(GpuContext::new(Arc::clone(&window)))
            .context("Failed to initialise GPU")?;
        let backend = WgpuBackend::new(
            gpu,
            self.shader.clone(),
            &self.geometry,
            self.render_config.clear_color,
        );
        let pipeline = PresentationPipeline::new(
            backend,
            self.render_config.frames_in_flight,
            window.inner_size().into(),
        )
        .context("Failed to build swapchain")?;

        self.window = Some(window);
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        let (Some(window), Some(pipeline)) = (&self.window, &mut self.pipeline) else {
            return Ok(());
        };
        let extent = Extent::from(window.inner_size());

        self.strip.update(&self.reader);
        let strip = &self.strip;
        let outcome = pipeline.draw_frame(extent, &mut self.geometry, |geometry| {
            strip.write_frame(geometry.vertices_mut())
        })?;

        if matches!(
            outcome,
            FrameOutcome::Presented | FrameOutcome::PresentedThenRecreated
        ) {
            self.fps.record_frame();
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    /// Drain the GPU and stop the microphone. Safe to call more than once.
    fn shutdown(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.shutdown() {
                log::error!("Failed to drain GPU: {}", e);
            }
            log::info!("Presented {} frames", pipeline.frames_presented());
        }
        if let Some(capture) = self.capture.take() {
            if let Err(e) = capture.stop() {
                log::warn!("{}", e);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let flow = control_flow(self.pipeline.as_ref().map(|p| p.state()));
        event_loop.set_control_flow(flow);
        if let (Some(window), ControlFlow::Poll) = (&self.window, flow) {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }
        if let Err(e) = self.init_graphics(event_loop) {
            self.fail(event_loop, e);
            return;
        }
        log::info!("Running, press ESC to quit");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                if let Some(pipeline) = &mut self.pipeline {
                    pipeline.request_resize();
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render_frame() {
                    self.fail(event_loop, e.context("Frame failed"));
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Poll while frames are wanted; block on events while minimised so the
/// loop does not spin.
fn control_flow(state: Option<PipelineState>) -> ControlFlow {
    match state {
        Some(state) if !state.wants_frames() => ControlFlow::Wait,
        _ => ControlFlow::Poll,
    }
}

fn print_input_devices() -> Result<()> {
    let devices = list_input_devices().context("Failed to enumerate capture devices")?;
    println!("capture devices (* denotes default):");
    for device in devices {
        let marker = if device.is_default { '*' } else { ' ' };
        println!("{} {}", marker, device.name);
    }
    Ok(())
}

/// Open and start the microphone. With `allow_silent`, failure yields an
/// idle ring instead so the window still runs.
fn open_audio(
    config: &CaptureConfig,
    allow_silent: bool,
) -> Result<(Option<AudioCapture>, RingReader, u32)> {
    let opened = AudioCapture::open(config).and_then(|capture| {
        capture.start()?;
        Ok(capture)
    });

    match opened {
        Ok(capture) => {
            let reader = capture.reader().clone();
            let sample_rate = capture.format().sample_rate;
            Ok((Some(capture), reader, sample_rate))
        }
        Err(e) if allow_silent => {
            log::warn!("{}; continuing without audio", e);
            let (_writer, reader) =
                SampleRing::with_history(config.min_history_samples, config.requested_period as usize)
                    .split();
            Ok((None, reader, SILENT_SAMPLE_RATE))
        }
        Err(e) => Err(e).context("Failed to open microphone (use --allow-silent to run anyway)"),
    }
}

fn build_strip(
    analysis: &AnalysisConfig,
    render: &RenderConfig,
    sample_rate: u32,
) -> Result<StripSystem> {
    let bank = SpectralBank::new(&analysis.frequencies(), sample_rate)
        .context("Failed to build frequency bank")?;
    log::info!(
        "Analysing {} bands, {:.1} Hz to {:.1} Hz",
        bank.len(),
        bank.frequencies().first().copied().unwrap_or_default(),
        bank.frequencies().last().copied().unwrap_or_default()
    );
    Ok(StripSystem::new(
        StripMesh::new(render.layout, analysis.band_count),
        bank,
        PeakNormalizer::new(analysis.peak_decay, analysis.peak_floor),
    ))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.list_devices {
        return print_input_devices();
    }

    let capture_config = args.capture_config();
    let analysis_config = args.analysis_config();
    let render_config = args.render_config();
    analysis_config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid analysis parameters")?;
    render_config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid render parameters")?;

    let shader = load_shader_source(args.shader.as_deref())?;
    let (capture, reader, sample_rate) = open_audio(&capture_config, args.allow_silent)?;
    let strip = build_strip(&analysis_config, &render_config, sample_rate)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(render_config, shader, strip, reader, capture);
    event_loop.run_app(&mut app).context("Event loop failed")?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimized_pipeline_waits_for_events() {
        assert_eq!(control_flow(Some(PipelineState::Minimized)), ControlFlow::Wait);
    }

    #[test]
    fn test_active_pipeline_polls() {
        assert_eq!(control_flow(Some(PipelineState::Ready)), ControlFlow::Poll);
        assert_eq!(control_flow(Some(PipelineState::Recreating)), ControlFlow::Poll);
        assert_eq!(control_flow(None), ControlFlow::Poll);
    }
}
