// -*- mode: rust; -*-
//
// This file is part of `yao-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use criterion::{criterion_group, criterion_main, Criterion};
use std::time::Duration;
use yao_primitives::{ctr_stream_blocks, key_expansion, Aes128, Block};

fn bench_key_expansion(c: &mut Criterion) {
    c.bench_function("key_expansion", |b| {
        let key = rand::random::<[u8; 16]>();
        b.iter(|| {
            let rkeys = key_expansion(&key);
            criterion::black_box(rkeys)
        });
    });
}

fn bench_aes_encrypt(c: &mut Criterion) {
    c.bench_function("Aes128::encrypt", |b| {
        let aes = Aes128::new(rand::random::<Block>());
        let block = rand::random::<Block>();
        b.iter(|| {
            let c = aes.encrypt(block);
            criterion::black_box(c)
        });
    });
}

fn bench_aes_encrypt8(c: &mut Criterion) {
    c.bench_function("Aes128::encrypt8", |b| {
        let aes = Aes128::new(rand::random::<Block>());
        let blocks = rand::random::<[Block; 8]>();
        b.iter(|| {
            let c = aes.encrypt8(blocks);
            criterion::black_box(c)
        });
    });
}

fn bench_ctr_stream(c: &mut Criterion) {
    c.bench_function("ctr_stream_blocks (1024)", |b| {
        let aes = Aes128::new(rand::random::<Block>());
        let mut out = vec![Block::ZERO; 1024];
        let mut counter = 0;
        b.iter(|| {
            ctr_stream_blocks(&aes, &mut counter, &mut out);
            criterion::black_box(&out);
        });
    });
}

criterion_group! {
    name = aes128;
    config = Criterion::default().warm_up_time(Duration::from_millis(100));
    targets = bench_key_expansion, bench_aes_encrypt, bench_aes_encrypt8, bench_ctr_stream
}
criterion_main!(aes128);
