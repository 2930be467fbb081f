//! Band geometry for the strip and ring layouts.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;

use super::Vertex;
use crate::params::Layout;

/// Each band is one quad
pub const VERTICES_PER_BAND: usize = 4;
pub const INDICES_PER_BAND: usize = 6;

/// Fraction of each band's extent left empty as a separator
const BAND_GAP: f32 = 0.15;

const RING_INNER_RADIUS: f32 = 0.45;
const RING_OUTER_RADIUS: f32 = 0.9;

/// Fixed topology plus a per-band base colour.
///
/// Positions and indices are generated once; only colours change per frame.
pub struct StripMesh {
    layout: Layout,
    positions: Vec<[f32; 2]>,
    indices: Vec<u32>,
    palette: Vec<[f32; 3]>,
}

impl StripMesh {
    pub fn new(layout: Layout, band_count: usize) -> Self {
        let mut positions = Vec::with_capacity(band_count * VERTICES_PER_BAND);
        let mut indices = Vec::with_capacity(band_count * INDICES_PER_BAND);

        for band in 0..band_count {
            let corners = match layout {
                Layout::Strip => strip_quad(band, band_count),
                Layout::Ring => ring_quad(band, band_count),
            };
            let base = positions.len() as u32;
            positions.extend_from_slice(&corners);
            // Two triangles, counter-clockwise
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        let palette = (0..band_count).map(|band| band_color(band, band_count)).collect();

        Self {
            layout,
            positions,
            indices,
            palette,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn band_count(&self) -> usize {
        self.palette.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Write positions (colours cleared to black) and indices.
    ///
    /// # Panics
    /// If the slices are not sized to this mesh.
    pub fn write_topology(&self, vertices: &mut [Vertex], indices: &mut [u32]) {
        assert_eq!(vertices.len(), self.vertex_count(), "vertex region size");
        assert_eq!(indices.len(), self.index_count(), "index region size");

        for (vertex, &position) in vertices.iter_mut().zip(&self.positions) {
            *vertex = Vertex {
                position,
                color: [0.0; 3],
            };
        }
        indices.copy_from_slice(&self.indices);
    }

    /// Rewrite the colour of every vertex from per-band levels in `0..=1`.
    ///
    /// Every vertex is written, including silent bands, so nothing from an
    /// earlier frame survives in persistent storage.
    pub fn write_colors(&self, levels: &[f32], vertices: &mut [Vertex]) {
        assert_eq!(levels.len(), self.band_count(), "one level per band");
        assert_eq!(vertices.len(), self.vertex_count(), "vertex region size");

        for ((quad, base), &level) in vertices
            .chunks_exact_mut(VERTICES_PER_BAND)
            .zip(&self.palette)
            .zip(levels)
        {
            let level = level.clamp(0.0, 1.0);
            let color = base.map(|c| c * level);
            for vertex in quad {
                vertex.color = color;
            }
        }
    }
}

/// Horizontal bar: low bands at the bottom of the window.
fn strip_quad(band: usize, band_count: usize) -> [[f32; 2]; 4] {
    let height = 2.0 / band_count as f32;
    let y0 = -1.0 + band as f32 * height;
    let y1 = y0 + height * (1.0 - BAND_GAP);
    [[-1.0, y0], [1.0, y0], [1.0, y1], [-1.0, y1]]
}

/// Annulus segment, starting at 12 o'clock and running clockwise.
fn ring_quad(band: usize, band_count: usize) -> [[f32; 2]; 4] {
    let sweep = TAU / band_count as f32;
    let a0 = FRAC_PI_2 - band as f32 * sweep;
    let a1 = a0 - sweep * (1.0 - BAND_GAP);
    let (d0, d1) = (Vec2::from_angle(a0), Vec2::from_angle(a1));
    [
        (d0 * RING_INNER_RADIUS).to_array(),
        (d1 * RING_INNER_RADIUS).to_array(),
        (d1 * RING_OUTER_RADIUS).to_array(),
        (d0 * RING_OUTER_RADIUS).to_array(),
    ]
}

/// Hue sweep from red (lowest band) towards violet.
fn band_color(band: usize, band_count: usize) -> [f32; 3] {
    let hue = 0.8 * band as f32 / band_count.max(1) as f32;
    hsv_to_rgb(hue, 1.0, 1.0)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let h6 = (h.rem_euclid(1.0)) * 6.0;
    let c = v * s;
    let x = c * (1.0 - ((h6 % 2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h6 as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}
