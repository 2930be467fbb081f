//! Spectrum shape: fixed strip/ring topology whose vertex colours follow the
//! analysed levels.

use bytemuck::{Pod, Zeroable};

mod mesh;
mod system;

pub use mesh::{StripMesh, INDICES_PER_BAND, VERTICES_PER_BAND};
pub use system::{PeakNormalizer, StripSystem};

/// Vertex data for the spectrum shape (NDC position + linear RGB colour)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}
