//! The seam between the frame state machine and a concrete GPU API.

use super::geometry::GeometryBuffer;
use super::surface::{ConfigChange, SurfaceCapabilities, SurfaceConfig};
use crate::error::RenderError;

/// Result of asking the surface for its next presentable image.
#[derive(Debug)]
pub enum Acquired<I> {
    Image(I),
    /// The swapchain no longer matches the surface and must be rebuilt
    Stale,
    /// No image became available in time; try again next frame
    Timeout,
}

/// Result of presenting an image. Never an error: staleness and
/// suboptimality are routine and feed the rebuild protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Optimal,
    /// Shown, but the swapchain should be rebuilt
    Suboptimal,
    /// Not shown; the swapchain must be rebuilt
    Stale,
}

/// GPU operations the presentation pipeline drives.
///
/// Ordering between acquire, draw and present is the backend's
/// responsibility (semaphores or equivalent); the only CPU-side wait the
/// pipeline performs is [`FrameBackend::wait_fence`].
pub trait FrameBackend {
    /// Per-slot recording resources, created once per frame slot
    type Slot;
    /// An acquired presentable image
    type Image;
    /// Signalled when a submission has finished on the GPU
    type Fence;

    fn capabilities(&self) -> SurfaceCapabilities;

    fn create_slot(&mut self, index: usize) -> Self::Slot;

    /// Block until `fence` has signalled.
    fn wait_fence(&mut self, fence: Self::Fence) -> Result<(), RenderError>;

    fn acquire(&mut self) -> Result<Acquired<Self::Image>, RenderError>;

    /// Upload `geometry`, record the draw into `slot` and submit it.
    fn submit(
        &mut self,
        slot: &mut Self::Slot,
        image: &Self::Image,
        geometry: &GeometryBuffer,
    ) -> Result<Self::Fence, RenderError>;

    fn present(&mut self, image: Self::Image) -> PresentStatus;

    /// Block until no submitted work remains on the device.
    fn wait_idle(&mut self) -> Result<(), RenderError>;

    /// Recreate swapchain-dependent resources for `config`. `change` says
    /// which parts differ from the previous config.
    fn rebuild(&mut self, config: &SurfaceConfig, change: ConfigChange) -> Result<(), RenderError>;
}
