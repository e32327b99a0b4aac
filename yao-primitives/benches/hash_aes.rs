use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use yao_primitives::{AesHash, Block};

fn bench_mmo_single(c: &mut Criterion) {
    c.bench_function("AesHash::mmo_single", |b| {
        let hash = AesHash::new(rand::random::<Block>());
        let x = rand::random::<Block>();
        b.iter(|| {
            let z = hash.mmo_single(black_box(x));
            black_box(z)
        });
    });
}

fn bench_tmmo_batch_4(c: &mut Criterion) {
    c.bench_function("AesHash::tmmo_batch_4", |b| {
        let hash = AesHash::new(rand::random::<Block>());
        let xs = rand::random::<[Block; 4]>();
        let i = rand::random::<Block>();
        b.iter(|| {
            let z = hash.tmmo_batch_4(black_box(i), black_box(xs));
            black_box(z)
        });
    });
}

criterion_group! {
    name = hash_aes;
    config = Criterion::default().warm_up_time(Duration::from_millis(100));
    targets = bench_mmo_single, bench_tmmo_batch_4
}
criterion_main!(hash_aes);
