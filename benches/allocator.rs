use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scoperc::{Context, ElemKind, Value, HEADER_SIZE};

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");

    for payload in [0usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(payload), &payload, |b, &payload| {
            let mut cx = Context::new();
            b.iter(|| {
                let obj = cx.allocate(black_box(HEADER_SIZE + payload));
                cx.dec_stack(obj);
            });
        });
    }

    group.finish();
}

fn bench_list_push(c: &mut Criterion) {
    c.bench_function("list_push_1k_ints", |b| {
        let mut cx = Context::new();
        b.iter(|| {
            let list = cx.new_list(&[], ElemKind::Int);
            for i in 0..1000 {
                cx.list_push(list, Value::Int(black_box(i)));
            }
            cx.dec_stack(list);
        });
    });

    c.bench_function("list_push_1k_strs", |b| {
        let mut cx = Context::new();
        let s = cx.new_str(b"shared");
        b.iter(|| {
            let list = cx.new_list(&[], ElemKind::Str);
            for _ in 0..1000 {
                cx.list_push(list, Value::Str(Some(s)));
            }
            cx.dec_stack(list);
        });
    });
}

fn bench_lookup(c: &mut Criterion) {
    let mut cx = Context::new();
    let keys: Vec<Value> = (0..64).map(Value::Int).collect();
    let values: Vec<Value> = (0..64).map(|i| Value::Float(i as f64)).collect();
    let dict = cx.new_dict(&keys, &values, ElemKind::Int, ElemKind::Float);

    c.bench_function("dict_at_64", |b| {
        b.iter(|| black_box(cx.dict_at(dict, Value::Int(black_box(63)))));
    });
}

criterion_group!(benches, bench_allocation, bench_list_push, bench_lookup);
criterion_main!(benches);
