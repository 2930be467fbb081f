//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use av_strip::params::{AnalysisConfig, CaptureConfig, Layout, RenderConfig};

/// Command line arguments. Unset options keep the `params` defaults.
#[derive(Parser, Debug)]
#[command(name = "av")]
#[command(about = "Live audio-reactive spectrum strip", long_about = None)]
pub struct Args {
    /// Window title
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Window width (logical pixels)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Window height (logical pixels)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Keep the window above other windows
    #[arg(long)]
    pub floating: bool,

    /// Shape: strip (default), ring
    #[arg(long, value_name = "LAYOUT", default_value = "strip")]
    pub layout: String,

    /// Frames the CPU may record ahead of the GPU
    #[arg(long, value_name = "COUNT")]
    pub frames_in_flight: Option<usize>,

    /// Minimum analysis history (samples)
    #[arg(long, value_name = "SAMPLES")]
    pub history: Option<usize>,

    /// Requested capture period (samples per callback)
    #[arg(long, value_name = "SAMPLES")]
    pub period: Option<u32>,

    /// Number of frequency bands
    #[arg(long, value_name = "COUNT")]
    pub bands: Option<usize>,

    /// Lowest band frequency (Hz)
    #[arg(long, value_name = "HZ")]
    pub base_frequency: Option<f32>,

    /// Band spacing: 12 = semitones, 24 = quarter tones
    #[arg(long, value_name = "STEPS")]
    pub steps_per_octave: Option<u32>,

    /// Per-frame decay of the normalisation peak (0..1)
    #[arg(long, value_name = "FACTOR")]
    pub decay: Option<f32>,

    /// Load this WGSL file instead of the built-in shader
    #[arg(long, value_name = "PATH")]
    pub shader: Option<PathBuf>,

    /// Keep running with a flat spectrum if the microphone cannot be opened
    #[arg(long)]
    pub allow_silent: bool,

    /// Print capture devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

impl Args {
    /// Parse layout from command-line arguments
    pub fn parse_layout(&self) -> Layout {
        match self.layout.to_lowercase().as_str() {
            "strip" => Layout::Strip,
            "ring" => Layout::Ring,
            other => {
                log::warn!("Unknown layout '{}', using strip", other);
                Layout::Strip
            }
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        let mut config = CaptureConfig::default();
        if let Some(history) = self.history {
            config.min_history_samples = history;
        }
        if let Some(period) = self.period {
            config.requested_period = period;
        }
        config
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        if let Some(bands) = self.bands {
            config.band_count = bands;
        }
        if let Some(base) = self.base_frequency {
            config.base_frequency_hz = base;
        }
        if let Some(steps) = self.steps_per_octave {
            config.steps_per_octave = steps;
        }
        if let Some(decay) = self.decay {
            config.peak_decay = decay;
        }
        config
    }

    pub fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig::default();
        if let Some(title) = &self.title {
            config.title = title.clone();
        }
        if let Some(width) = self.width {
            config.window_width = width;
        }
        if let Some(height) = self.height {
            config.window_height = height;
        }
        if let Some(frames) = self.frames_in_flight {
            config.frames_in_flight = frames;
        }
        config.floating = self.floating;
        config.layout = self.parse_layout();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_params() {
        let args = Args::parse_from(["av"]);
        let render = args.render_config();
        assert_eq!(render.title, "av");
        assert_eq!((render.window_width, render.window_height), (240, 800));
        assert!(!render.floating);
        assert_eq!(render.frames_in_flight, 2);
        assert_eq!(render.layout, Layout::Strip);
        assert_eq!(args.analysis_config().band_count, AnalysisConfig::default().band_count);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "av",
            "--width",
            "320",
            "--floating",
            "--layout",
            "ring",
            "--bands",
            "24",
            "--steps-per-octave",
            "24",
            "--history",
            "4096",
        ]);
        let render = args.render_config();
        assert_eq!(render.window_width, 320);
        assert!(render.floating);
        assert_eq!(render.layout, Layout::Ring);
        let analysis = args.analysis_config();
        assert_eq!((analysis.band_count, analysis.steps_per_octave), (24, 24));
        assert_eq!(args.capture_config().min_history_samples, 4096);
    }

    #[test]
    fn test_unknown_layout_falls_back_to_strip() {
        let args = Args::parse_from(["av", "--layout", "spiral"]);
        assert_eq!(args.parse_layout(), Layout::Strip);
    }
}
