// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fluac::{Decoder, Encoder, EncoderSettings};

fn encode_fixture(n_samples: usize, bits_per_sample: u32) -> Vec<u8> {
    let left: Vec<i32> = (0..n_samples).map(|i| (((i * 37) % 10_000) as i32) - 5000).collect();
    let right: Vec<i32> = (0..n_samples).map(|i| (((i * 53) % 10_000) as i32) - 5000).collect();
    let settings =
        EncoderSettings { sample_rate: 44_100, channels: 2, bits_per_sample, block_size: 4096, ..Default::default() };
    let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
    encoder.process(&[left, right]).unwrap();
    encoder.finish_seekable().unwrap().into_inner()
}

fn bench_decode(c: &mut Criterion) {
    let stream_16bit = encode_fixture(200_000, 16);
    c.bench_function("decode 200k samples, 16 bit", |b| {
        b.iter(|| {
            let mut decoder = Decoder::new(Cursor::new(&stream_16bit[..]));
            decoder
                .process_until_end_of_stream(
                    |channels, _header| {
                        black_box(channels.len());
                        Ok(())
                    },
                    |_e| false,
                )
                .unwrap();
        })
    });

    let stream_24bit = encode_fixture(200_000, 24);
    c.bench_function("decode 200k samples, 24 bit", |b| {
        b.iter(|| {
            let mut decoder = Decoder::new(Cursor::new(&stream_24bit[..]));
            decoder
                .process_until_end_of_stream(
                    |channels, _header| {
                        black_box(channels.len());
                        Ok(())
                    },
                    |_e| false,
                )
                .unwrap();
        })
    });
}

fn bench_encode(c: &mut Criterion) {
    let left: Vec<i32> = (0..200_000).map(|i| (((i * 37) % 10_000) as i32) - 5000).collect();
    let right: Vec<i32> = (0..200_000).map(|i| (((i * 53) % 10_000) as i32) - 5000).collect();

    c.bench_function("encode 200k samples, 16 bit", |b| {
        b.iter(|| {
            let settings =
                EncoderSettings { sample_rate: 44_100, channels: 2, bits_per_sample: 16, ..Default::default() };
            let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
            encoder.process(&[left.clone(), right.clone()]).unwrap();
            black_box(encoder.finish().unwrap());
        })
    });
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
