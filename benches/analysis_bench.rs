//! Benchmarks for the per-frame analysis pass.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use av_strip::audio::{synth, SampleRing, SpectralBank};
use av_strip::params::{note_ladder, Layout};
use av_strip::strip::{PeakNormalizer, StripMesh, StripSystem, Vertex};

const SAMPLE_RATE: u32 = 48_000;

fn filled_ring(history: usize) -> av_strip::audio::RingReader {
    let (mut writer, reader) = SampleRing::with_history(history, 512).split();
    writer.write(&synth::sine(440.0, SAMPLE_RATE, history, 0.5));
    reader
}

fn bench_full_rescan(c: &mut Criterion) {
    let mut group = c.benchmark_group("Goertzel Rescan");

    for history in [2048, 8192, 16384] {
        let reader = filled_ring(history);
        let bank = SpectralBank::new(&note_ladder(55.0, 12, 72), SAMPLE_RATE).unwrap();
        let mut out = vec![0.0; bank.len()];

        group.throughput(Throughput::Elements(history as u64));
        group.bench_with_input(BenchmarkId::new("scan_into", history), &history, |b, _| {
            b.iter(|| {
                bank.scan_into(black_box(&reader), &mut out);
                black_box(&out);
            });
        });
    }

    group.finish();
}

fn bench_band_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("Band Count");
    let reader = filled_ring(8192);

    for bands in [24, 72, 144] {
        let bank = SpectralBank::new(&note_ladder(55.0, 24, bands), SAMPLE_RATE).unwrap();
        let mut out = vec![0.0; bands];

        group.bench_with_input(BenchmarkId::new("scan_into", bands), &bands, |b, _| {
            b.iter(|| {
                bank.scan_into(black_box(&reader), &mut out);
                black_box(&out);
            });
        });
    }

    group.finish();
}

fn bench_frame_update(c: &mut Criterion) {
    let reader = filled_ring(8192);
    let frequencies = note_ladder(55.0, 12, 72);
    let bank = SpectralBank::new(&frequencies, SAMPLE_RATE).unwrap();
    let mut system = StripSystem::new(
        StripMesh::new(Layout::Strip, frequencies.len()),
        bank,
        PeakNormalizer::new(0.99, 1.0),
    );
    let mut vertices = vec![Vertex::default(); system.mesh.vertex_count()];

    c.bench_function("frame update (72 bands, 8192 samples)", |b| {
        b.iter(|| {
            system.update(black_box(&reader));
            system.write_frame(&mut vertices);
            black_box(&vertices);
        });
    });
}

criterion_group!(benches, bench_full_rescan, bench_band_count, bench_frame_update);
criterion_main!(benches);
