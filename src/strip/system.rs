//! Per-frame spectrum update: scan, normalise, colour.

use super::mesh::StripMesh;
use super::Vertex;
use crate::audio::{RingReader, SpectralBank};

/// Rolling maximum with exponential decay.
///
/// `peak = max(peak * decay, current_max, floor)`; values are mapped to
/// `value / peak`, which keeps the display range stable as loudness drifts.
#[derive(Debug, Clone)]
pub struct PeakNormalizer {
    peak: f32,
    decay: f32,
    floor: f32,
}

impl PeakNormalizer {
    pub fn new(decay: f32, floor: f32) -> Self {
        Self {
            peak: floor,
            decay,
            floor,
        }
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn normalize(&mut self, values: &[f32], out: &mut [f32]) {
        let current = values.iter().copied().fold(0.0f32, f32::max);
        self.peak = (self.peak * self.decay).max(current).max(self.floor);

        for (slot, &value) in out.iter_mut().zip(values) {
            *slot = (value / self.peak).clamp(0.0, 1.0);
        }
    }
}

/// Analysis bank, normaliser and mesh driven together once per frame
pub struct StripSystem {
    pub mesh: StripMesh,
    bank: SpectralBank,
    normalizer: PeakNormalizer,
    /// Squared magnitudes from the last scan
    power: Vec<f32>,
    /// Display levels in 0..=1 from the last scan
    levels: Vec<f32>,
}

impl StripSystem {
    /// # Panics
    /// If the mesh and bank disagree on the number of bands.
    pub fn new(mesh: StripMesh, bank: SpectralBank, normalizer: PeakNormalizer) -> Self {
        assert_eq!(mesh.band_count(), bank.len(), "one band per frequency");
        let bands = bank.len();
        Self {
            mesh,
            bank,
            normalizer,
            power: vec![0.0; bands],
            levels: vec![0.0; bands],
        }
    }

    pub fn bank(&self) -> &SpectralBank {
        &self.bank
    }

    /// Rescan the whole ring and refresh the display levels.
    pub fn update(&mut self, ring: &RingReader) -> &[f32] {
        self.bank.scan_into(ring, &mut self.power);
        // Normalise amplitudes rather than power for a less peaky display
        for p in &mut self.power {
            *p = p.sqrt();
        }
        self.normalizer.normalize(&self.power, &mut self.levels);
        &self.levels
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    /// Write this frame's colours into every vertex.
    pub fn write_frame(&self, vertices: &mut [Vertex]) {
        self.mesh.write_colors(&self.levels, vertices);
    }
}
