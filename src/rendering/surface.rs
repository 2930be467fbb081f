//! Swapchain parameter derivation.
//!
//! [`SurfaceConfig`] is an immutable value recomputed from scratch on every
//! (re)build; nothing patches it in place.

use crate::error::RenderError;

/// Pixel size of a surface or window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Minimised windows report a zero-area framebuffer.
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn clamp(self, min: Extent, max: Extent) -> Extent {
        Extent {
            width: self.width.clamp(min.width, max.width.max(min.width)),
            height: self.height.clamp(min.height, max.height.max(min.height)),
        }
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Extent {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// What the device/surface pair reports it can do.
#[derive(Debug, Clone)]
pub struct SurfaceCapabilities {
    pub formats: Vec<wgpu::TextureFormat>,
    pub present_modes: Vec<wgpu::PresentMode>,
    pub alpha_modes: Vec<wgpu::CompositeAlphaMode>,
    /// `None` means the client picks the extent (from the window size)
    pub current_extent: Option<Extent>,
    pub min_extent: Extent,
    pub max_extent: Extent,
    pub min_image_count: u32,
    /// `None` means no upper bound
    pub max_image_count: Option<u32>,
}

/// Chosen swapchain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub format: wgpu::TextureFormat,
    pub present_mode: wgpu::PresentMode,
    pub alpha_mode: wgpu::CompositeAlphaMode,
    pub extent: Extent,
    pub image_count: u32,
}

/// Which swapchain-dependent resources a new config invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigChange {
    pub format: bool,
    pub extent: bool,
    pub present_mode: bool,
    pub image_count: bool,
}

impl ConfigChange {
    /// Everything is new on first build.
    pub const INITIAL: ConfigChange = ConfigChange {
        format: true,
        extent: true,
        present_mode: true,
        image_count: true,
    };

    pub fn is_empty(&self) -> bool {
        *self == ConfigChange::default()
    }

    /// Render pass and pipeline depend on the target format only; extent is
    /// dynamic viewport state.
    pub fn needs_pipeline(&self) -> bool {
        self.format
    }
}

impl SurfaceConfig {
    /// Derive the swapchain parameters from capabilities and window size.
    pub fn derive(caps: &SurfaceCapabilities, window: Extent) -> Result<Self, RenderError> {
        Ok(Self {
            format: choose_format(&caps.formats)?,
            present_mode: choose_present_mode(&caps.present_modes)?,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            extent: choose_extent(caps, window),
            image_count: choose_image_count(caps),
        })
    }

    pub fn changes_from(&self, previous: &SurfaceConfig) -> ConfigChange {
        ConfigChange {
            format: self.format != previous.format,
            extent: self.extent != previous.extent,
            present_mode: self.present_mode != previous.present_mode,
            image_count: self.image_count != previous.image_count,
        }
    }

    /// Frames the presentation engine may queue, i.e. images minus the one
    /// being displayed.
    pub fn frame_latency(&self) -> u32 {
        self.image_count.saturating_sub(1).max(1)
    }
}

/// First sRGB format, so shader output is gamma-encoded by the hardware;
/// otherwise whatever the surface lists first.
fn choose_format(formats: &[wgpu::TextureFormat]) -> Result<wgpu::TextureFormat, RenderError> {
    formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first())
        .copied()
        .ok_or(RenderError::NoSurfaceFormat)
}

/// Mailbox for low latency; FIFO is always supported.
fn choose_present_mode(modes: &[wgpu::PresentMode]) -> Result<wgpu::PresentMode, RenderError> {
    if modes.is_empty() {
        return Err(RenderError::NoPresentMode);
    }
    if modes.contains(&wgpu::PresentMode::Mailbox) {
        Ok(wgpu::PresentMode::Mailbox)
    } else {
        Ok(wgpu::PresentMode::Fifo)
    }
}

fn choose_extent(caps: &SurfaceCapabilities, window: Extent) -> Extent {
    match caps.current_extent {
        Some(extent) => extent,
        None => window.clamp(caps.min_extent, caps.max_extent),
    }
}

fn choose_image_count(caps: &SurfaceCapabilities) -> u32 {
    let wanted = caps.min_image_count + 1;
    match caps.max_image_count {
        Some(max) => wanted.min(max),
        None => wanted,
    }
}
