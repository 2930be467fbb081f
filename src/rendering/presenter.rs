//! Render-loop state machine: acquire → record → submit → present → advance,
//! plus the resize / staleness recovery protocol.
//!
//! ```text
//! Ready --acquire stale-----------------------> Recreating
//! Ready --present suboptimal / resize flag----> Recreating (after presenting)
//! Recreating --framebuffer extent is zero-----> Minimized
//! Minimized --framebuffer extent non-zero-----> Recreating
//! Recreating --rebuild complete---------------> Ready
//! ```

use super::backend::{Acquired, FrameBackend, PresentStatus};
use super::frame::FrameSlots;
use super::geometry::GeometryBuffer;
use super::surface::{ConfigChange, Extent, SurfaceConfig};
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Ready,
    Recreating,
    /// Zero-area framebuffer; nothing is drawn until the window comes back
    Minimized,
}

impl PipelineState {
    /// Whether the event loop should keep asking for frames
    pub fn wants_frames(self) -> bool {
        self != PipelineState::Minimized
    }
}

/// What a call to [`PresentationPipeline::draw_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// The frame was shown, then the swapchain was rebuilt
    PresentedThenRecreated,
    /// Submitted, but present found the swapchain stale so the image was
    /// never shown; rebuilt
    DroppedThenRecreated,
    /// Acquire found the swapchain stale; rebuilt without drawing
    SkippedStale,
    /// Acquire timed out; nothing submitted
    SkippedTimeout,
    Minimized,
}

/// Owns the swapchain state (through the backend) and the frame slots.
pub struct PresentationPipeline<B: FrameBackend> {
    backend: B,
    slots: FrameSlots<B::Slot, B::Fence>,
    config: Option<SurfaceConfig>,
    state: PipelineState,
    /// Set by the window's resize notification, consumed after present
    resize_requested: bool,
    /// Device idle and no submission made since
    drained: bool,
    frames_presented: u64,
}

impl<B: FrameBackend> PresentationPipeline<B> {
    /// Create the frame slots and build the swapchain for `window`.
    pub fn new(mut backend: B, frames_in_flight: usize, window: Extent) -> Result<Self, RenderError> {
        let slots = FrameSlots::new(frames_in_flight, |index| backend.create_slot(index));
        let mut pipeline = Self {
            backend,
            slots,
            config: None,
            state: PipelineState::Recreating,
            resize_requested: false,
            drained: true,
            frames_presented: 0,
        };
        pipeline.recreate(window)?;
        Ok(pipeline)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Current swapchain parameters (`None` until the first non-minimised build)
    pub fn config(&self) -> Option<&SurfaceConfig> {
        self.config.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Slots whose last submission has not been observed complete
    pub fn in_flight_count(&self) -> usize {
        self.slots.in_flight_count()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// External resize notification; honoured after the next present.
    pub fn request_resize(&mut self) {
        self.resize_requested = true;
    }

    /// Run one render-loop iteration.
    ///
    /// `write` fills the geometry for this frame; it runs only once the
    /// frame's slot is free and an image has been acquired.
    pub fn draw_frame(
        &mut self,
        window: Extent,
        geometry: &mut GeometryBuffer,
        write: impl FnOnce(&mut GeometryBuffer),
    ) -> Result<FrameOutcome, RenderError> {
        if self.state != PipelineState::Ready {
            self.recreate(window)?;
            if self.state == PipelineState::Minimized {
                return Ok(FrameOutcome::Minimized);
            }
        }

        // Bound the CPU to K frames ahead of the GPU
        let slot = self.slots.current_mut();
        if let Some(fence) = slot.take_fence() {
            self.backend.wait_fence(fence)?;
        }

        let image = match self.backend.acquire()? {
            Acquired::Image(image) => image,
            Acquired::Stale => {
                log::debug!("Swapchain stale on acquire, rebuilding");
                self.state = PipelineState::Recreating;
                self.recreate(window)?;
                return Ok(FrameOutcome::SkippedStale);
            }
            Acquired::Timeout => {
                log::debug!("Acquire timed out, skipping frame");
                return Ok(FrameOutcome::SkippedTimeout);
            }
        };

        write(geometry);
        let fence = self
            .backend
            .submit(slot.resources_mut(), &image, geometry)?;
        slot.set_fence(fence);
        self.drained = false;

        let status = self.backend.present(image);
        self.slots.advance();
        if status != PresentStatus::Stale {
            self.frames_presented += 1;
        }

        if status != PresentStatus::Optimal || self.resize_requested {
            log::debug!(
                "Rebuilding after present ({:?}, resize requested: {})",
                status,
                self.resize_requested
            );
            self.state = PipelineState::Recreating;
            self.recreate(window)?;
            return Ok(if status == PresentStatus::Stale {
                FrameOutcome::DroppedThenRecreated
            } else {
                FrameOutcome::PresentedThenRecreated
            });
        }

        Ok(FrameOutcome::Presented)
    }

    /// Rebuild protocol: drain the device, derive a fresh config, recreate
    /// swapchain-dependent resources. Frame slots and geometry are untouched.
    fn recreate(&mut self, window: Extent) -> Result<(), RenderError> {
        if window.is_zero() {
            if self.state != PipelineState::Minimized {
                log::debug!("Framebuffer has zero extent, pausing rendering");
            }
            self.state = PipelineState::Minimized;
            return Ok(());
        }
        self.state = PipelineState::Recreating;

        self.backend.wait_idle()?;
        self.slots.clear_fences();
        self.drained = true;

        let next = SurfaceConfig::derive(&self.backend.capabilities(), window)?;
        let change = match &self.config {
            Some(previous) => next.changes_from(previous),
            None => ConfigChange::INITIAL,
        };
        self.backend.rebuild(&next, change)?;

        if !change.is_empty() {
            log::info!(
                "Surface: {:?} {}x{} {:?}, {} images",
                next.format,
                next.extent.width,
                next.extent.height,
                next.present_mode,
                next.image_count
            );
        }

        self.config = Some(next);
        self.resize_requested = false;
        self.state = PipelineState::Ready;
        Ok(())
    }

    /// Drain all in-flight work. Must run before GPU resources are dropped.
    pub fn shutdown(&mut self) -> Result<(), RenderError> {
        self.backend.wait_idle()?;
        self.slots.clear_fences();
        self.drained = true;
        Ok(())
    }
}

impl<B: FrameBackend> Drop for PresentationPipeline<B> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(
                self.drained,
                "presentation pipeline dropped with frames in flight; call shutdown() first"
            );
        }
    }
}
