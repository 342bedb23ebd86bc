//! Benchmark for build and lazy-read throughput.
//!
//! Run with: cargo bench --package vellum_wire --bench wire_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vellum_wire::{frame, read_frames, root_table, Builder};

/// Builds a scoreboard-shaped message: a vector of 32 two-field records.
fn build_scoreboard(builder: &mut Builder) -> Vec<u8> {
    let entries: Vec<_> = (0..32u32)
        .map(|team| {
            builder.start_table(2);
            builder.push_slot_scalar(0, team, 0);
            builder.push_slot_scalar(1, team * 3, 0);
            builder.end_table()
        })
        .collect();
    let vector = builder.create_vector_of_offsets(&entries);
    builder.start_table(1);
    builder.push_slot_offset(0, vector);
    let root = builder.end_table();
    builder.finish(root);
    builder.finished_data().to_vec()
}

fn benchmark_build(c: &mut Criterion) {
    let mut builder = Builder::new();

    c.bench_function("build_scoreboard_32_entries", |b| {
        b.iter(|| {
            builder.reset();
            let player_id = builder.create_string("p-42");
            let message = builder.create_string("welcome");
            builder.start_table(3);
            builder.push_slot_offset(0, player_id);
            builder.push_slot_offset(1, message);
            builder.push_slot_scalar::<u16>(2, 60, 0);
            let root = builder.end_table();
            builder.finish(root);
            black_box(builder.finished_data().len())
        });
    });
}

fn benchmark_lazy_read(c: &mut Criterion) {
    let mut builder = Builder::new();
    let buf = build_scoreboard(&mut builder);

    c.bench_function("read_scoreboard_32_entries", |b| {
        b.iter(|| {
            let table = root_table(&buf).unwrap();
            let entries = table.get_table_vector(0).unwrap().unwrap();
            let mut total = 0u64;
            for index in 0..entries.len() {
                let entry = entries.get(index).unwrap();
                total += u64::from(entry.get_scalar::<u32>(1, 0).unwrap());
            }
            black_box(total)
        });
    });
}

fn benchmark_framing(c: &mut Criterion) {
    let mut builder = Builder::new();
    let buf = build_scoreboard(&mut builder);
    let mut stream = Vec::new();
    for _ in 0..16 {
        stream.extend_from_slice(&frame(&buf));
    }

    c.bench_function("read_frames_16", |b| {
        b.iter(|| {
            let count = read_frames(black_box(&stream)).count();
            black_box(count)
        });
    });
}

criterion_group!(benches, benchmark_build, benchmark_lazy_read, benchmark_framing);
criterion_main!(benches);
