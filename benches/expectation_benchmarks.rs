use std::hint::black_box;

use attr_verify::expectation::{ExpectationParser, MarkerPolicy};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Fixture text where one line in `every` carries a marker
fn generate_text(lines: usize, every: usize) -> String {
    (0..lines)
        .map(|i| {
            if i % every == 0 {
                format!("  @NSCopying let p{i} : C  // expected-error@+0 2 {{{{message {i}}}}}\n")
            } else {
                format!("  var plain{i} : Int = {i}\n")
            }
        })
        .collect()
}

fn bench_marker_density(c: &mut Criterion) {
    let parser = ExpectationParser::new(MarkerPolicy::Collapse);
    let mut group = c.benchmark_group("expectation_density");

    for every in [1, 10, 100] {
        let text = generate_text(2000, every);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("one_in", every), &text, |b, text| {
            b.iter(|| parser.parse_all(black_box(text)))
        });
    }
    group.finish();
}

fn bench_lazy_first(c: &mut Criterion) {
    let parser = ExpectationParser::new(MarkerPolicy::Repeat);
    let text = generate_text(10_000, 50);
    c.bench_function("expectation_first_only", |b| {
        b.iter(|| parser.parse(black_box(&text)).next())
    });
}

criterion_group!(benches, bench_marker_density, bench_lazy_first);
criterion_main!(benches);
