use std::hint::black_box;

use attr_verify::expectation::MarkerPolicy;
use attr_verify::frontend::Scanner;
use attr_verify::runner::{Fixture, FixtureRunner};
use attr_verify::{AttributeValidator, DiagnosticRecorder, RuleRegistry};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Generate a fixture with `properties` attributed class properties
fn generate_fixture(properties: usize, scenario: &str) -> String {
    let mut out = String::from("class Copyable : NSCopying {}\nclass Holder {\n");

    for i in 0..properties {
        let line = match scenario {
            "all_valid" => format!("  @NSCopying var p{i} : Copyable?\n"),
            "mixed" => match i % 4 {
                0 => format!("  @NSCopying var p{i} : Copyable\n"),
                1 => format!(
                    "  @NSCopying let p{i} : Copyable  // expected-error {{{{'NSCopying' attribute requires property to be mutable}}}}\n"
                ),
                2 => format!(
                    "  @NSCopying var p{i} : Copyable {{ get {{}} set {{}} }}  // expected-error {{{{'NSCopying' attribute is only valid on stored properties}}}}\n"
                ),
                _ => format!(
                    "  @NSCopying var p{i} : Int  // expected-error {{{{'NSCopying' attribute is only valid with types that conform to the NSCopying protocol}}}}\n"
                ),
            },
            _ => format!("  @NSCopying func f{i}() {{}}  // expected-error {{{{'NSCopying' may only be used on 'var' declarations}}}}\n"),
        };
        out.push_str(&line);
    }

    out.push_str("}\n");
    out
}

fn bench_validation_scenarios(c: &mut Criterion) {
    let registry = RuleRegistry::with_builtin().expect("built-in rule sets");
    let mut group = c.benchmark_group("validation_scenarios");

    for scenario in ["all_valid", "mixed", "gated"] {
        let source = generate_fixture(500, scenario);
        let scanned = Scanner::new().scan(&source);
        group.throughput(Throughput::Elements(scanned.attributes.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("validate_all", scenario),
            &scanned,
            |b, scanned| {
                let validator = AttributeValidator::new(&registry);
                b.iter(|| {
                    let mut recorder = DiagnosticRecorder::new();
                    validator.validate_all(black_box(&scanned.attributes), &mut recorder);
                    recorder.drain()
                })
            },
        );
    }
    group.finish();
}

fn bench_fixture_scalability(c: &mut Criterion) {
    let registry = RuleRegistry::with_builtin().expect("built-in rule sets");
    let runner = FixtureRunner::new(&registry, MarkerPolicy::Collapse);
    let mut group = c.benchmark_group("fixture_scalability");

    for size in [10, 100, 1000, 5000] {
        let fixture = Fixture::from_source("bench", generate_fixture(size, "mixed"));
        group.throughput(Throughput::Bytes(fixture.source.len() as u64));
        group.bench_with_input(BenchmarkId::new("size", size), &fixture, |b, fixture| {
            b.iter(|| runner.run(black_box(fixture)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validation_scenarios, bench_fixture_scalability);
criterion_main!(benches);
