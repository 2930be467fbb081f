//! GPU frame pipeline: swapchain derivation, frames in flight, persistent
//! geometry and the acquire → submit → present loop.

mod backend;
mod frame;
mod geometry;
mod gpu;
mod presenter;
mod surface;

pub use backend::{Acquired, FrameBackend, PresentStatus};
pub use frame::{FrameSlot, FrameSlots};
pub use geometry::GeometryBuffer;
pub use gpu::{load_shader_source, GpuContext, GpuSlot, WgpuBackend};
pub use presenter::{FrameOutcome, PipelineState, PresentationPipeline};
pub use surface::{ConfigChange, Extent, SurfaceCapabilities, SurfaceConfig};
