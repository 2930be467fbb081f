//! Window and rendering configuration.

/// Shape the spectrum is drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Bands stacked bottom (low) to top (high), each spanning the full width
    #[default]
    Strip,
    /// Bands arranged as segments of an annulus, low frequencies first
    Ring,
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window title
    pub title: String,

    /// Window width (logical pixels)
    pub window_width: u32,

    /// Window height (logical pixels)
    pub window_height: u32,

    /// Keep the window above other windows
    pub floating: bool,

    /// Frames the CPU may record ahead of the GPU (K)
    pub frames_in_flight: usize,

    /// Strip or ring topology
    pub layout: Layout,

    /// Background colour (linear RGB)
    pub clear_color: [f64; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "av".to_string(),
            window_width: 240,
            window_height: 800,
            floating: false,
            frames_in_flight: 2,
            layout: Layout::Strip,
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.frames_in_flight == 0 {
            return Err("frames in flight must be at least 1".to_string());
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(format!(
                "window size must be non-zero, got {}x{}",
                self.window_width, self.window_height
            ));
        }
        Ok(())
    }
}
