//! Benchmarks for list compilation and the simulation loop.
//!
//! Run with: cargo bench -p adsim

use adsim::{FilterFormat, Simulator};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Filter list mixing hostname, pattern and exception rules.
fn generate_list(count: usize) -> String {
    let mut list = String::from("! generated\n");
    for i in 0..count {
        match i % 4 {
            0 => list.push_str(&format!("||ads{i}.example.com^\n")),
            1 => list.push_str(&format!("/banner{i}/*$image\n")),
            2 => list.push_str(&format!("||cdn{i}.tracker.net/pixel^$third-party\n")),
            _ => list.push_str(&format!("@@||ads{}.example.com/allowed/\n", i - 3)),
        }
    }
    list
}

fn generate_destinations(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 3 {
            0 => format!("ads{i}.example.com/x.js"),
            1 => format!("https://cdn{i}.tracker.net/pixel?id={i}"),
            _ => format!("www.site{i}.org/index.html"),
        })
        .collect()
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for &size in &[100usize, 1_000, 10_000] {
        let list = generate_list(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &list, |b, list| {
            b.iter(|| {
                let mut sim = Simulator::new().unwrap();
                sim.add_filter_list_from_string(black_box(list), FilterFormat::Standard).unwrap();
                sim
            })
        });
    }

    group.finish();
}

fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");

    let mut sim = Simulator::new().unwrap();
    sim.add_filter_list_from_string(&generate_list(1_000), FilterFormat::Standard).unwrap();

    for &size in &[10usize, 100, 1_000] {
        let destinations = generate_destinations(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &destinations, |b, destinations| {
            b.iter(|| sim.simulate(black_box("http://site.test"), destinations.as_slice()).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_simulate);
criterion_main!(benches);
