// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Prints per-frame diagnostics for a FLAC file: block size, channel
//! assignment, and the first and last few samples of each channel.

use std::env;
use std::fs;
use std::io;

use fluac::Decoder;

fn main() {
    let arg = env::args().nth(1).expect("usage: debug <file.flac>");
    let input = fs::File::open(&arg).expect("failed to open input file");
    let mut decoder = Decoder::new(io::BufReader::new(input));

    decoder.process_until_end_of_metadata(|block| println!("metadata: {:?}", block)).expect("failed to read metadata");
    println!("streaminfo: {:?}", decoder.streaminfo().unwrap());

    let mut frame_index = 0u64;
    decoder
        .process_until_end_of_stream(
            |channels, header| {
                let n = channels[0].len();
                let edge = n.min(12);
                println!(
                    "frame {}: {} samples, {:?}",
                    frame_index, header.block_size, header.channel_assignment
                );
                for (i, channel) in channels.iter().enumerate() {
                    println!("  channel {}: {:?} .. {:?}", i, &channel[..edge], &channel[n - edge..]);
                }
                frame_index += 1;
                Ok(())
            },
            |err| {
                eprintln!("error in frame {}: {}", frame_index, err);
                true
            },
        )
        .expect("failed to decode stream");
}
