use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stagecraft::combinators::{collect, concurrent, iterate, map};
use stagecraft::error::EmptySet;
use stagecraft::interrupt::Interrupt;

fn iterate_map_collect_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("iterate map collect 10k", |b| {
        b.to_async(&runtime).iter(|| async {
            let items: Vec<i64> = (0..10_000).collect();
            let pipeline = iterate::<_, EmptySet, _>(black_box(items));
            let pipeline = map(pipeline, |x| x * 2);
            let out: Vec<i64> = collect(pipeline).await.unwrap();
            black_box(out);
        });
    });
}

fn concurrent_fan_out_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("concurrent fan-out 1k fibers", |b| {
        b.to_async(&runtime).iter(|| async {
            let items: Vec<i64> = (0..1_000).collect();
            let upstream = iterate::<_, EmptySet, _>(black_box(items));
            let interrupt = Interrupt::new();
            let fan_out = concurrent(upstream, interrupt, |v, _interrupt| async move {
                Ok::<_, stagecraft::Error<EmptySet>>(v * v)
            });
            futures::pin_mut!(fan_out);
            let mut total = 0i64;
            while let Some(result) = futures::StreamExt::next(&mut fan_out).await {
                total += result.unwrap();
            }
            black_box(total);
        });
    });
}

criterion_group!(benches, iterate_map_collect_benchmark, concurrent_fan_out_benchmark);
criterion_main!(benches);
