use criterion::{criterion_group, criterion_main, Criterion};
use std::{sync::Arc, time::Duration};
use yao_engine::{
    local_provider_pair, CircuitBuilder, GateExecutor, OutputRecipient, Role, RunTimeStats,
    YaoConfig, YaoProvider,
};

fn and_layer(provider: Arc<YaoProvider>, num_wires: usize, num_simd: usize) {
    let mut builder = CircuitBuilder::new(provider.clone());
    let x = builder.input(Role::Garbler, num_wires, num_simd, false).unwrap();
    let y = builder.input(Role::Evaluator, num_wires, num_simd, false).unwrap();
    let z = builder.and(&x.wires, &y.wires).unwrap();
    let z = builder.xor(&z, &x.wires).unwrap();
    let out = builder.output(&z, OutputRecipient::Both).unwrap();
    let zeros = vec![bitvec::vec::BitVec::repeat(false, num_simd); num_wires];
    for handle in [x, y] {
        if handle.promise.is_some() {
            handle.provide(zeros.clone()).unwrap();
        }
    }
    let register = builder.finish();
    let executor = GateExecutor::for_provider(&register, &provider);
    executor
        .evaluate_setup_online(&mut RunTimeStats::new())
        .unwrap();
    criterion::black_box(out.unwrap().get().unwrap());
}

fn bench_and_layer(c: &mut Criterion, num_threads: usize) {
    let name = format!("yao: 256x64 AND layer, {} threads", num_threads);
    let config = YaoConfig {
        num_threads,
        ..Default::default()
    };
    c.bench_function(&name, move |b| {
        b.iter(|| {
            let (garbler, evaluator) = local_provider_pair(&config).unwrap();
            std::thread::scope(|s| {
                s.spawn(|| and_layer(garbler, 256, 64));
                s.spawn(|| and_layer(evaluator, 256, 64));
            });
        })
    });
}

fn bench_single_threaded(c: &mut Criterion) {
    bench_and_layer(c, 1);
}

fn bench_multi_threaded(c: &mut Criterion) {
    bench_and_layer(c, 4);
}

criterion_group! {
    name = garbling;
    config = Criterion::default().warm_up_time(Duration::from_millis(100)).sample_size(10);
    targets = bench_single_threaded, bench_multi_threaded
}
criterion_main!(garbling);
