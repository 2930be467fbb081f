//! Scripted in-memory `FrameBackend` for driving the presentation pipeline
//! without a GPU.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use av_strip::error::RenderError;
use av_strip::rendering::{
    Acquired, ConfigChange, Extent, FrameBackend, GeometryBuffer, PresentStatus,
    SurfaceCapabilities, SurfaceConfig,
};
use av_strip::strip::Vertex;

pub fn default_caps() -> SurfaceCapabilities {
    SurfaceCapabilities {
        formats: vec![wgpu::TextureFormat::Bgra8UnormSrgb],
        present_modes: vec![wgpu::PresentMode::Fifo],
        alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
        current_extent: None,
        min_extent: Extent::new(1, 1),
        max_extent: Extent::new(4096, 4096),
        min_image_count: 2,
        max_image_count: None,
    }
}

/// Fences never complete on their own: they are retired only by
/// `wait_fence` or `wait_idle`, so `outstanding` is exactly the number of
/// submissions the CPU has not yet waited for.
pub struct MockBackend {
    pub caps: SurfaceCapabilities,
    /// Next acquire results; an empty queue yields a fresh image
    pub acquire_script: VecDeque<Acquired<u64>>,
    /// Next present results; an empty queue yields `Optimal`
    pub present_script: VecDeque<PresentStatus>,

    pub slots_created: usize,
    pub outstanding: Vec<u64>,
    pub max_outstanding: usize,
    pub idle_waits: usize,
    pub rebuilds: Vec<(SurfaceConfig, ConfigChange)>,
    pub pipelines_built: usize,
    /// Vertex region as uploaded by each submission
    pub submitted: Vec<Vec<Vertex>>,
    pub presented: Vec<u64>,

    next_image: u64,
    next_fence: u64,
    slot_fences: HashMap<usize, u64>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_caps(default_caps())
    }

    pub fn with_caps(caps: SurfaceCapabilities) -> Self {
        Self {
            caps,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            slots_created: 0,
            outstanding: Vec::new(),
            max_outstanding: 0,
            idle_waits: 0,
            rebuilds: Vec::new(),
            pipelines_built: 0,
            submitted: Vec::new(),
            presented: Vec::new(),
            next_image: 0,
            next_fence: 0,
            slot_fences: HashMap::new(),
        }
    }

    pub fn last_change(&self) -> Option<ConfigChange> {
        self.rebuilds.last().map(|(_, change)| *change)
    }
}

impl FrameBackend for MockBackend {
    type Slot = usize;
    type Image = u64;
    type Fence = u64;

    fn capabilities(&self) -> SurfaceCapabilities {
        self.caps.clone()
    }

    fn create_slot(&mut self, index: usize) -> usize {
        self.slots_created += 1;
        index
    }

    fn wait_fence(&mut self, fence: u64) -> Result<(), RenderError> {
        self.outstanding.retain(|&f| f != fence);
        Ok(())
    }

    fn acquire(&mut self) -> Result<Acquired<u64>, RenderError> {
        if let Some(scripted) = self.acquire_script.pop_front() {
            return Ok(scripted);
        }
        self.next_image += 1;
        Ok(Acquired::Image(self.next_image))
    }

    fn submit(
        &mut self,
        slot: &mut usize,
        _image: &u64,
        geometry: &GeometryBuffer,
    ) -> Result<u64, RenderError> {
        if let Some(previous) = self.slot_fences.get(slot) {
            assert!(
                !self.outstanding.contains(previous),
                "slot {} re-recorded while its last submission is in flight",
                slot
            );
        }
        self.next_fence += 1;
        let fence = self.next_fence;
        self.slot_fences.insert(*slot, fence);
        self.outstanding.push(fence);
        self.max_outstanding = self.max_outstanding.max(self.outstanding.len());
        self.submitted.push(geometry.vertices().to_vec());
        Ok(fence)
    }

    fn present(&mut self, image: u64) -> PresentStatus {
        let status = self
            .present_script
            .pop_front()
            .unwrap_or(PresentStatus::Optimal);
        if status != PresentStatus::Stale {
            self.presented.push(image);
        }
        status
    }

    fn wait_idle(&mut self) -> Result<(), RenderError> {
        self.idle_waits += 1;
        self.outstanding.clear();
        Ok(())
    }

    fn rebuild(&mut self, config: &SurfaceConfig, change: ConfigChange) -> Result<(), RenderError> {
        if change.needs_pipeline() {
            self.pipelines_built += 1;
        }
        self.rebuilds.push((*config, change));
        Ok(())
    }
}
