// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Verifies that encoding and then decoding a variety of synthetic signals
//! reproduces the original samples exactly, standing in for the reference
//! decoder's comparison against a corpus of real-world recordings.

use std::io::Cursor;

use fluac::{Decoder, Encoder, EncoderSettings};
use proptest::prelude::*;

fn roundtrip(channels: Vec<Vec<i32>>, bits_per_sample: u32, block_size: u32) {
    let settings = EncoderSettings {
        sample_rate: 44_100,
        channels: channels.len() as u32,
        bits_per_sample,
        block_size,
        ..Default::default()
    };
    let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
    encoder.process(&channels).unwrap();
    let cursor = encoder.finish_seekable().unwrap();

    let mut decoder = Decoder::new(cursor);
    let mut decoded: Vec<Vec<i32>> = vec![Vec::new(); channels.len()];
    decoder
        .process_until_end_of_stream(
            |block, _header| {
                for (out, ch) in decoded.iter_mut().zip(block.iter()) {
                    out.extend_from_slice(ch);
                }
                Ok(())
            },
            |_e| false,
        )
        .unwrap();
    decoder.finish().unwrap();

    assert_eq!(decoded, channels);
}

#[test]
fn silence_roundtrips() {
    roundtrip(vec![vec![0i32; 5000], vec![0i32; 5000]], 16, 4096);
}

#[test]
fn full_scale_square_wave_roundtrips() {
    let left: Vec<i32> = (0..2048).map(|i| if i % 2 == 0 { 32_767 } else { -32_768 }).collect();
    roundtrip(vec![left], 16, 512);
}

#[test]
fn ramps_roundtrip_at_various_bit_depths() {
    for &bps in &[8u32, 12, 16, 20, 24] {
        let max = 1i64 << (bps - 1);
        let ramp: Vec<i32> = (0..3000).map(|i| (((i as i64) % (2 * max)) - max) as i32).collect();
        roundtrip(vec![ramp.clone(), ramp], bps, 1024);
    }
}

#[test]
fn short_final_block_roundtrips() {
    let left: Vec<i32> = (0..100).map(|i| i - 50).collect();
    let right: Vec<i32> = (0..100).map(|i| 50 - i).collect();
    roundtrip(vec![left, right], 16, 64);
}

#[test]
fn mono_stream_roundtrips() {
    let samples: Vec<i32> = (0..4096).map(|i| ((i * 17) % 1000) - 500).collect();
    roundtrip(vec![samples], 16, 1024);
}

proptest! {
    #[test]
    fn arbitrary_stereo_pcm_roundtrips(
        left in prop::collection::vec(-1000i32..1000, 16..512),
        right in prop::collection::vec(-1000i32..1000, 16..512),
    ) {
        let n = left.len().min(right.len());
        roundtrip(vec![left[..n].to_vec(), right[..n].to_vec()], 16, 128);
    }
}
