use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mcq_bench::{definitions, seeds};
use mcq_core::ChoiceGroup;

fn bench_build_and_render(c: &mut Criterion) {
    let mut g = c.benchmark_group("mcq_core_render");
    let seeds = seeds(64);
    for &n in &[4usize, 32] {
        let defs = definitions(n, 4);
        g.bench_with_input(BenchmarkId::new("build_render", n), &defs, |b, defs| {
            b.iter(|| {
                for &s in seeds.iter() {
                    let group = ChoiceGroup::build(defs, true, s).unwrap();
                    black_box(group.render());
                }
            })
        });
    }

    // Cached path: the gate hands back the same state.
    let group = ChoiceGroup::build(&definitions(32, 4), true, 341).unwrap();
    group.render();
    g.bench_function("render_cached/32", |b| b.iter(|| black_box(group.render())));
    g.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut g = c.benchmark_group("mcq_core_resolve");
    let group = ChoiceGroup::build(&definitions(32, 0), true, 7).unwrap();
    let tokens: Vec<String> = group.display().iter().map(|d| d.visible_id.to_string()).collect();
    g.bench_function("resolve_submission/32", |b| {
        b.iter(|| black_box(group.resolve_submission(black_box(&tokens)).unwrap()))
    });
    g.finish();
}

criterion_group!(benches, bench_build_and_render, bench_resolve);
criterion_main!(benches);
