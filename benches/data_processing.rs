//! Benchmarks for the telemetry hot path
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gyro_telemetry::frontend::axis_series;
use gyro_telemetry::pipeline::{parser, PipelineDriver, NullSink, ReaderLineSource, WindowBuffer, CAPACITY};

fn telemetry_line(i: u64) -> String {
    let v = i as f64 * 0.01;
    format!(
        "$:{:.3},{:.3},{:.3},0.012,-0.981,0.054,{:.1},{:.1},{:.1}",
        v.sin(),
        v.cos(),
        -v.sin(),
        20.0 + v,
        -4.5,
        41.0 - v
    )
}

fn bench_line_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_parsing");

    let valid = telemetry_line(42);
    let noise = "I (1234) wifi: connected, rssi -61".to_string();
    let short = "$:1.0,2.0".to_string();

    group.throughput(Throughput::Elements(1));
    group.bench_function("valid", |b| {
        b.iter(|| black_box(parser::parse(black_box(&valid))))
    });
    group.bench_function("not_telemetry", |b| {
        b.iter(|| black_box(parser::parse(black_box(&noise))))
    });
    group.bench_function("too_few_fields", |b| {
        b.iter(|| black_box(parser::parse(black_box(&short))))
    });

    group.finish();
}

fn bench_window_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_push");

    for capacity in [CAPACITY, 1000, 10_000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("push_at_capacity", capacity),
            capacity,
            |b, &capacity| {
                let mut window = WindowBuffer::with_capacity(capacity);
                window.extend((0..capacity).map(|i| (i as f64, 0.0, 0.0)));
                let mut i = 0u64;
                b.iter(|| {
                    window.push(black_box((i as f64, 1.0, 2.0)));
                    i = i.wrapping_add(1);
                });
            },
        );
    }

    group.finish();
}

fn bench_redraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("redraw");

    for capacity in [CAPACITY, 1000, 10_000].iter() {
        let mut window = WindowBuffer::with_capacity(*capacity);
        window.extend((0..*capacity).map(|i| {
            let v = i as f64;
            (v.sin(), v.cos(), -v.sin())
        }));

        group.throughput(Throughput::Elements(*capacity as u64));
        group.bench_with_input(BenchmarkId::new("snapshot", capacity), &window, |b, w| {
            b.iter(|| black_box(w.snapshot()))
        });
        group.bench_with_input(
            BenchmarkId::new("snapshot_to_series", capacity),
            &window,
            |b, w| {
                b.iter(|| {
                    let snapshot = w.snapshot();
                    let series: Vec<Vec<[f64; 2]>> =
                        (0..3).map(|axis| axis_series(&snapshot, axis)).collect();
                    black_box(series)
                })
            },
        );
    }

    group.finish();
}

fn bench_driver_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver");

    let lines = 10_000u64;
    // Every tenth line is noise, like a device that also logs text
    let text: String = (0..lines)
        .map(|i| {
            if i % 10 == 0 {
                "debug: tick\n".to_string()
            } else {
                telemetry_line(i) + "\n"
            }
        })
        .collect();

    group.throughput(Throughput::Elements(lines));
    group.bench_function("drain_stream", |b| {
        b.iter(|| {
            let driver = PipelineDriver::new(ReaderLineSource::from_text(text.clone()), NullSink);
            black_box(driver.count())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_line_parsing,
    bench_window_push,
    bench_redraw,
    bench_driver_throughput,
);

criterion_main!(benches);
