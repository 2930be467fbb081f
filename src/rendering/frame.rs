//! Frames in flight.
//!
//! K slots are created once when the pipeline starts and cycled for the life
//! of the process; swapchain rebuilds never touch them. A slot's fence must
//! be observed signalled before its recording resources are reused.

/// One in-flight frame: backend recording resources plus the fence of the
/// last submission made through it.
pub struct FrameSlot<S, F> {
    index: usize,
    resources: S,
    in_flight: Option<F>,
}

impl<S, F> FrameSlot<S, F> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn resources_mut(&mut self) -> &mut S {
        &mut self.resources
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Remove the pending fence so the caller can wait on it.
    pub fn take_fence(&mut self) -> Option<F> {
        self.in_flight.take()
    }

    pub fn set_fence(&mut self, fence: F) {
        debug_assert!(
            self.in_flight.is_none(),
            "slot {} reused before its fence was observed",
            self.index
        );
        self.in_flight = Some(fence);
    }
}

/// Fixed ring of K frame slots with the current slot index.
pub struct FrameSlots<S, F> {
    slots: Vec<FrameSlot<S, F>>,
    current: usize,
}

impl<S, F> FrameSlots<S, F> {
    /// # Panics
    /// If `count` is zero.
    pub fn new(count: usize, mut create: impl FnMut(usize) -> S) -> Self {
        assert!(count > 0, "need at least one frame in flight");
        let slots = (0..count)
            .map(|index| FrameSlot {
                index,
                resources: create(index),
                in_flight: None,
            })
            .collect();
        Self { slots, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_mut(&mut self) -> &mut FrameSlot<S, F> {
        &mut self.slots[self.current]
    }

    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
    }

    pub fn in_flight_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_in_flight()).count()
    }

    /// Forget every pending fence (after the device has been drained).
    pub fn clear_fences(&mut self) {
        for slot in &mut self.slots {
            slot.in_flight = None;
        }
    }
}
