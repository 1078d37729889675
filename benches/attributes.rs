//! Benchmarks for CPU-side scene preparation.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vitrine::attributes::InstanceAttributes;
use vitrine::environment::EnvironmentImage;
use vitrine::theme::Theme;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribute_generation");
    let palette = Theme::dark().particle_palette();

    for count in [1_000u32, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("instances", count), &count, |b, &count| {
            b.iter(|| {
                black_box(InstanceAttributes::generate_seeded(count, 10.0, palette, 42).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_pack(c: &mut Criterion) {
    let palette = Theme::dark().particle_palette();
    let attributes = InstanceAttributes::generate_seeded(10_000, 10.0, palette, 42).unwrap();

    c.bench_function("pack_10k_instances", |b| {
        b.iter(|| black_box(attributes.to_instances()))
    });
}

fn bench_prefilter(c: &mut Criterion) {
    let mut group = c.benchmark_group("environment_prefilter");

    for (width, height) in [(64u32, 32u32), (256, 128)] {
        let pixels = vec![128u8; (width * height * 4) as usize];
        group.bench_with_input(
            BenchmarkId::new("mip_chain", format!("{}x{}", width, height)),
            &pixels,
            |b, pixels| {
                b.iter(|| black_box(EnvironmentImage::from_rgba(pixels.clone(), width, height)))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_pack, bench_prefilter);
criterion_main!(benches);
