// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Encodes a WAV file to a FLAC file of the same name.

use std::env;
use std::fs;
use std::io;
use std::path;

use fluac::{Encoder, EncoderSettings};
use hound::WavReader;

fn main() {
    let arg = env::args().nth(1).expect("usage: encode <file.wav>");
    let fname = path::Path::new(&arg);
    let mut reader = WavReader::open(fname).expect("failed to open wav file");
    let spec = reader.spec();

    let settings = EncoderSettings {
        sample_rate: spec.sample_rate,
        channels: spec.channels as u32,
        bits_per_sample: spec.bits_per_sample as u32,
        ..Default::default()
    };
    let channels = settings.channels as usize;
    let block_size = settings.block_size as usize;

    let fname_flac = fname.with_extension("flac");
    let output = fs::File::create(&fname_flac).expect("failed to create output file");
    let mut encoder = Encoder::new(io::BufWriter::new(output), settings).expect("invalid encoder settings");

    let mut chunk = Vec::with_capacity(channels * block_size);
    for maybe_sample in reader.samples::<i32>() {
        let sample = maybe_sample.expect("failed to read sample");
        chunk.push(sample);
        if chunk.len() == chunk.capacity() {
            encoder.process_interleaved(&chunk).expect("failed to encode block");
            chunk.clear();
        }
    }
    if !chunk.is_empty() {
        encoder.process_interleaved(&chunk).expect("failed to encode final block");
    }

    encoder.finish_seekable().expect("failed to finish stream");
    println!("wrote {}", fname_flac.display());
}
