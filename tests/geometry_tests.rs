//! Integration tests for per-frame geometry: every vertex colour is
//! rewritten each frame, and silence renders black.

mod common;

use av_strip::audio::{synth, SampleRing, SpectralBank};
use av_strip::params::Layout;
use av_strip::rendering::{Extent, GeometryBuffer, PresentationPipeline};
use av_strip::strip::{
    PeakNormalizer, StripMesh, StripSystem, Vertex, INDICES_PER_BAND, VERTICES_PER_BAND,
};
use common::MockBackend;

const SAMPLE_RATE: u32 = 48_000;
const SENTINEL: [f32; 3] = [-1.0, -1.0, -1.0];

fn strip_system(layout: Layout, frequencies: &[f32]) -> StripSystem {
    let bank = SpectralBank::new(frequencies, SAMPLE_RATE).unwrap();
    StripSystem::new(
        StripMesh::new(layout, frequencies.len()),
        bank,
        PeakNormalizer::new(0.99, 1.0),
    )
}

fn geometry_for(system: &StripSystem) -> GeometryBuffer {
    let mut geometry = GeometryBuffer::new(system.mesh.vertex_count(), system.mesh.index_count());
    let (vertices, indices) = geometry.regions_mut();
    system.mesh.write_topology(vertices, indices);
    geometry
}

fn poison_colors(geometry: &mut GeometryBuffer) {
    for vertex in geometry.vertices_mut() {
        vertex.color = SENTINEL;
    }
}

#[test]
fn test_silence_with_four_bands_is_black() {
    let mut system = strip_system(Layout::Strip, &[110.0, 220.0, 440.0, 880.0]);
    let (_writer, reader) = SampleRing::with_history(4096, 512).split();
    let mut geometry = geometry_for(&system);
    poison_colors(&mut geometry);

    let levels = system.update(&reader).to_vec();
    assert_eq!(levels, vec![0.0; 4]);

    system.write_frame(geometry.vertices_mut());
    assert_eq!(geometry.vertex_count(), 4 * VERTICES_PER_BAND);
    assert!(geometry
        .vertices()
        .iter()
        .all(|v| v.color == [0.0, 0.0, 0.0]));
}

#[test]
fn test_topology_is_complete() {
    for layout in [Layout::Strip, Layout::Ring] {
        let system = strip_system(layout, &synth_ladder(24));
        let geometry = geometry_for(&system);

        assert_eq!(geometry.vertex_count(), 24 * VERTICES_PER_BAND);
        assert_eq!(geometry.index_count(), 24 * INDICES_PER_BAND);
        assert!(geometry
            .indices()
            .iter()
            .all(|&i| (i as usize) < geometry.vertex_count()));

        // Every vertex is referenced by some triangle
        let mut used = vec![false; geometry.vertex_count()];
        for &i in geometry.indices() {
            used[i as usize] = true;
        }
        assert!(used.into_iter().all(|u| u), "{:?} leaves vertices unused", layout);

        // Positions stay in clip space
        assert!(geometry
            .vertices()
            .iter()
            .all(|v| v.position.iter().all(|p| (-1.0..=1.0).contains(p))));
    }
}

#[test]
fn test_tone_lights_only_its_band() {
    let frequencies = synth_ladder(12);
    let mut system = strip_system(Layout::Strip, &frequencies);
    let (mut writer, reader) = SampleRing::with_history(8192, 512).split();
    writer.write(&synth::sine(frequencies[6], SAMPLE_RATE, 8192, 0.5));

    let levels = system.update(&reader).to_vec();
    assert!((levels[6] - 1.0).abs() < 1e-6, "loudest band is full scale");

    let mut geometry = geometry_for(&system);
    system.write_frame(geometry.vertices_mut());
    let band = |b: usize| &geometry.vertices()[b * VERTICES_PER_BAND..(b + 1) * VERTICES_PER_BAND];

    assert!(band(6).iter().all(|v| v.color.iter().any(|&c| c > 0.5)));
    for b in [0, 1, 2, 10, 11] {
        assert!(
            band(b).iter().all(|v| v.color.iter().all(|&c| c < 0.1)),
            "band {} should be nearly dark",
            b
        );
    }
}

#[test]
fn test_every_vertex_rewritten_each_frame() {
    let frequencies = synth_ladder(8);
    let mut system = strip_system(Layout::Ring, &frequencies);
    let (mut writer, reader) = SampleRing::with_history(2048, 256).split();
    let mut geometry = geometry_for(&system);
    let indices_before = geometry.indices().to_vec();

    let mut pipeline =
        PresentationPipeline::new(MockBackend::new(), 2, Extent::new(240, 800)).unwrap();

    for frame in 0..6 {
        // Alternate between a tone and silence
        let samples = if frame % 2 == 0 {
            synth::sine(frequencies[frame % 8], SAMPLE_RATE, 2048, 0.8)
        } else {
            synth::silence(2048)
        };
        writer.write(&samples);
        poison_colors(&mut geometry);

        system.update(&reader);
        pipeline
            .draw_frame(Extent::new(240, 800), &mut geometry, |g| {
                system.write_frame(g.vertices_mut())
            })
            .unwrap();

        let uploaded: &Vec<Vertex> = pipeline.backend().submitted.last().unwrap();
        assert_eq!(uploaded.len(), geometry.vertex_count());
        assert!(
            uploaded.iter().all(|v| v.color != SENTINEL),
            "frame {} left stale colours",
            frame
        );
    }

    // Topology is written once and never disturbed
    assert_eq!(geometry.indices(), indices_before.as_slice());
    pipeline.shutdown().unwrap();
}

/// Semitone ladder from A2 upwards.
fn synth_ladder(count: usize) -> Vec<f32> {
    av_strip::params::note_ladder(110.0, 12, count)
}
