//! Benchmarks for layout, PDF writing and PCM quantization.
//!
//! Run with: cargo bench --package conversion-heaven-core

use conversion_heaven_core::audio::{quantize, PCM_BLOCK_SIZE};
use conversion_heaven_core::config::{LayoutConfig, PageGeometry, TextMetrics};
use conversion_heaven_core::layout::{paginate, wrap_text};
use conversion_heaven_core::encode::pdf::LopdfWriter;
use conversion_heaven_core::{encode, ExtractedContent};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

fn sample_text(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            format!(
                "Line {} of the quarterly report with enough words to need wrapping \
                 across the printable width of an A4 page at eleven points.",
                i
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn benchmark_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(5));

    let config = LayoutConfig::paged(PageGeometry::default(), TextMetrics::new(11.0, 15.0));
    for lines in [100usize, 1_000] {
        let text = sample_text(lines);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("paginate", lines), &text, |b, text| {
            b.iter(|| paginate(ExtractedContent::plain(text.clone()), black_box(&config)))
        });
    }

    let long_line = sample_text(1).repeat(20);
    group.bench_function("wrap_text", |b| {
        b.iter(|| wrap_text(black_box(&long_line), 515.28, 11.0))
    });

    group.finish();
}

fn benchmark_pdf(c: &mut Criterion) {
    let config = LayoutConfig::paged(PageGeometry::default(), TextMetrics::new(11.0, 15.0));
    let pages = paginate(ExtractedContent::plain(sample_text(1_000)), &config);

    let mut group = c.benchmark_group("pdf");
    group.sample_size(10);
    group.bench_function("encode_text_pages", |b| {
        b.iter(|| encode::pdf::encode(&LopdfWriter, black_box(&pages)))
    });
    group.finish();
}

fn benchmark_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("audio");

    // Ten seconds of a 44.1 kHz channel.
    let samples: Vec<f32> = (0..441_000)
        .map(|i| ((i as f32) * 0.01).sin() * 1.2)
        .collect();
    group.throughput(Throughput::Elements(samples.len() as u64));
    group.bench_function("quantize_10s", |b| b.iter(|| quantize(black_box(&samples))));

    let block = &samples[..PCM_BLOCK_SIZE];
    group.bench_function("quantize_block", |b| b.iter(|| quantize(black_box(block))));

    group.finish();
}

criterion_group!(benches, benchmark_layout, benchmark_pdf, benchmark_quantize);
criterion_main!(benches);
