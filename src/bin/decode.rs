// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Decodes a FLAC file to a WAV file of the same name.

use std::env;
use std::fs;
use std::io;
use std::path;

use fluac::Decoder;
use hound::{SampleFormat, WavSpec, WavWriter};

fn main() {
    let arg = env::args().nth(1).expect("usage: decode <file.flac>");
    let fname = path::Path::new(&arg);
    let input = fs::File::open(fname).expect("failed to open input file");
    let mut decoder = Decoder::new(io::BufReader::new(input));

    decoder.process_until_end_of_metadata(|_block| {}).expect("failed to read metadata");
    let info = *decoder.streaminfo().expect("stream has no streaminfo block");

    let spec = WavSpec {
        channels: info.channels as u16,
        sample_rate: info.sample_rate,
        bits_per_sample: info.bits_per_sample as u16,
        sample_format: SampleFormat::Int,
    };
    let fname_wav = fname.with_extension("wav");
    let mut output = WavWriter::create(&fname_wav, spec).expect("failed to create wav file");

    decoder
        .process_until_end_of_stream(
            |channels, _header| {
                let n = channels[0].len();
                for i in 0..n {
                    for channel in channels {
                        output.write_sample(channel[i]).expect("failed to write sample");
                    }
                }
                Ok(())
            },
            |err| {
                eprintln!("warning: skipping corrupt frame: {}", err);
                true
            },
        )
        .expect("failed to decode stream");

    decoder.finish().expect("md5 signature mismatch");
    output.finalize().expect("failed to finalize wav file");
    println!("wrote {}", fname_wav.display());
}
