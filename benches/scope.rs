use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scoperc::{Context, HEADER_SIZE};

fn bench_scope_cycle(c: &mut Criterion) {
    c.bench_function("push_pop_empty", |b| {
        let mut cx = Context::new();
        b.iter(|| {
            cx.push_scope();
            cx.pop_scope();
        });
    });

    c.bench_function("guarded_scope_with_local", |b| {
        let mut cx = Context::new();
        b.iter(|| {
            let mut scope = cx.scope();
            let obj = scope.allocate(HEADER_SIZE + 32);
            scope.inc_stack(obj);
            scope.dec_stack(obj);
            scope.dec_stack(obj);
        });
    });
}

fn bench_deferred_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("deferred_drain");

    for count in [16usize, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut cx = Context::new();
            b.iter(|| {
                cx.push_scope();
                let objs: Vec<_> = (0..count).map(|_| cx.allocate(HEADER_SIZE)).collect();
                cx.push_scope();
                for obj in objs {
                    cx.dec_heap(black_box(obj));
                }
                cx.pop_scope();
                cx.pop_scope();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scope_cycle, bench_deferred_drain);
criterion_main!(benches);
