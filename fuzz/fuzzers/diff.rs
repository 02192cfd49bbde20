// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

/// Decodes the full stream once, returning the concatenated per-channel
/// samples, or `None` if decoding fails anywhere.
fn decode_all(data: &[u8]) -> Option<Vec<Vec<i32>>> {
    let mut decoder = fluac::Decoder::new(Cursor::new(data));
    decoder.process_until_end_of_metadata(|_block| {}).ok()?;

    let channels = decoder.streaminfo()?.channels as usize;
    let mut out = vec![Vec::new(); channels];
    decoder
        .process_until_end_of_stream(
            |blocks, _header| {
                for (c, block) in out.iter_mut().zip(blocks.iter()) {
                    c.extend_from_slice(block);
                }
                Ok(())
            },
            |_err| false,
        )
        .ok()?;
    Some(out)
}

fuzz_target!(|data: &[u8]| {
    // Decoding is pure: running it twice over the same bytes must produce the
    // same samples both times, with no state leaking between decoders.
    let result0 = decode_all(data);
    let result1 = decode_all(data);
    assert_eq!(result0, result1);
});
