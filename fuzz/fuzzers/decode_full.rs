// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let mut decoder = fluac::Decoder::new(Cursor::new(data));
    if decoder.process_until_end_of_metadata(|_block| {}).is_err() {
        return;
    }

    let _ = decoder.process_until_end_of_stream(
        |_channels, _header| Ok(()),
        // Keep scanning past corrupt frames rather than aborting the whole
        // fuzz iteration on the first one; that is what callers do too.
        |_err| true,
    );
});
