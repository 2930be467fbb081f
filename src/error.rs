//! Error types for capture, analysis and rendering.
//!
//! Surface staleness is not an error: it is reported through `Acquired` /
//! `PresentStatus` and drives the rebuild state machine.

use std::path::PathBuf;

/// Errors from the capture device.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No audio input device found")]
    NoInputDevice,
    #[error("Failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),
    #[error("Failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("Failed to query supported input configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),
    #[error("Unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error("Failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("Failed to start input stream: {0}")]
    Start(#[from] cpal::PlayStreamError),
    #[error("Failed to stop input stream: {0}")]
    Stop(#[from] cpal::PauseStreamError),
}

/// Errors from building the frequency bank.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Target frequency {frequency_hz} Hz is not a positive finite value")]
    InvalidFrequency { frequency_hz: f32 },
    #[error("Target frequency {frequency_hz} Hz is at or above Nyquist ({nyquist_hz} Hz)")]
    AboveNyquist { frequency_hz: f32, nyquist_hz: f32 },
    #[error("Sample rate must be > 0")]
    ZeroSampleRate,
    #[error("No target frequencies given")]
    NoFrequencies,
}

/// Fatal rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("Surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("Surface reports no supported present modes")]
    NoPresentMode,
    #[error("Failed to read shader {path}: {source}")]
    ShaderLoad {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to acquire surface image: {0}")]
    Acquire(wgpu::SurfaceError),
}
