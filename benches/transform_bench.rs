/// Benchmarks for the docstring template engine.
///
/// Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stubdoc::domain::doc_rules::{doc_rule_table, RulesConfig};
use stubdoc::domain::template::TemplateEngine;

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// A stub module with `functions` documented functions, each docstring
/// carrying a few tokens.
fn synthetic_module(functions: usize) -> String {
    let mut src = String::from("\"\"\"\n{{module_title[transport]}}\n\"\"\"\n\n");
    for i in 0..functions {
        src.push_str(&format!(
            "def function_{i}(value: int) -> None:\n    \"\"\"\n    Uses {{{{docs_url_fn[transport.getSongPos]}}}} and\n    \
             {{{{docs_url_page(\"absolute ticks\", \"midi_controller_scripting/tutorials/time_units/#ticks\")}}}}.\n\n    \
             {{{{note[playlist_indexes]}}}}\n    \"\"\"\n\n\n"
        ));
    }
    src
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("template/transform");
    let rules = doc_rule_table(RulesConfig::default());
    let engine = TemplateEngine::new(&rules);

    for functions in [10, 100, 1000].iter() {
        let src = synthetic_module(*functions);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::new("functions", functions), &src, |b, src| {
            b.iter(|| engine.transform(black_box(src), "bench.py").unwrap())
        });
    }

    group.finish();
}

fn bench_plain_text(c: &mut Criterion) {
    let rules = doc_rule_table(RulesConfig::default());
    let engine = TemplateEngine::new(&rules);
    let src = "def f():\n    \"\"\"Nothing to expand here.\"\"\"\n".repeat(1000);

    c.bench_function("template/plain_text", |b| {
        b.iter(|| engine.transform(black_box(&src), "bench.py").unwrap())
    });
}

criterion_group!(benches, bench_transform, bench_plain_text);
criterion_main!(benches);
