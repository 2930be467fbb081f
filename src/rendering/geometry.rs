//! Host-side vertex + index storage, written every frame without
//! reallocation.
//!
//! One word allocation holds the vertex region followed by the index region.
//! The split point is fixed at construction and both regions are exposed as
//! typed slices; no offsets are computed at call sites.

use crate::strip::Vertex;

const VERTEX_WORDS: usize = std::mem::size_of::<Vertex>() / std::mem::size_of::<u32>();

pub struct GeometryBuffer {
    words: Box<[u32]>,
    /// Word offset where the index region begins
    split: usize,
    vertex_count: usize,
    index_count: usize,
}

impl GeometryBuffer {
    /// Zeroed storage for a fixed topology.
    pub fn new(vertex_count: usize, index_count: usize) -> Self {
        let split = vertex_count * VERTEX_WORDS;
        Self {
            words: vec![0u32; split + index_count].into_boxed_slice(),
            split,
            vertex_count,
            index_count,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn vertices(&self) -> &[Vertex] {
        bytemuck::cast_slice(&self.words[..self.split])
    }

    pub fn indices(&self) -> &[u32] {
        &self.words[self.split..]
    }

    /// Both regions at once, for writing topology in one go.
    pub fn regions_mut(&mut self) -> (&mut [Vertex], &mut [u32]) {
        let (vertices, indices) = self.words.split_at_mut(self.split);
        (bytemuck::cast_slice_mut(vertices), indices)
    }

    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        bytemuck::cast_slice_mut(&mut self.words[..self.split])
    }

    /// Size of the vertex region in bytes; the index region starts here.
    pub fn vertex_bytes(&self) -> u64 {
        (self.split * std::mem::size_of::<u32>()) as u64
    }

    /// The vertex region as bytes; the per-frame upload.
    pub fn vertex_region_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words[..self.split])
    }

    /// Whole allocation as bytes, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }
}
