// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! MD5 signature of the unencoded audio, matching STREAMINFO's `md5sum`
//! field. The digest itself is computed by the `md-5` crate; this module
//! only knows how to feed it FLAC's own sample layout (little-endian,
//! `bits_per_sample` rounded up to a whole byte, channels interleaved).

use md5::{Digest, Md5};

/// Accumulates the MD5 signature of interleaved audio samples as they are
/// decoded or encoded, one block at a time.
pub struct Md5Accumulator {
    hasher: Md5,
}

impl Md5Accumulator {
    pub fn new() -> Md5Accumulator {
        Md5Accumulator { hasher: Md5::new() }
    }

    /// Feeds one block of interleaved samples, `bytes_per_sample` bytes each
    /// (the bits-per-sample value rounded up to a whole byte), little-endian.
    pub fn update_interleaved(&mut self, channels: &[Vec<i32>], bytes_per_sample: usize) {
        if channels.is_empty() {
            return;
        }
        let n = channels[0].len();
        let mut buf = Vec::with_capacity(n * channels.len() * bytes_per_sample);
        for i in 0..n {
            for channel in channels {
                let sample = channel[i];
                let le = sample.to_le_bytes();
                buf.extend_from_slice(&le[..bytes_per_sample]);
            }
        }
        self.hasher.update(&buf);
    }

    /// Finalizes the accumulator, consuming it, and returns the 16-byte digest.
    pub fn finalize(self) -> [u8; 16] {
        self.hasher.finalize().into()
    }
}

impl Default for Md5Accumulator {
    fn default() -> Md5Accumulator {
        Md5Accumulator::new()
    }
}

/// Bytes needed to hold one sample of `bits_per_sample` bits, rounded up.
pub fn bytes_per_sample(bits_per_sample: u32) -> usize {
    ((bits_per_sample + 7) / 8) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_the_md5_of_empty_string() {
        let acc = Md5Accumulator::new();
        let digest = acc.finalize();
        // MD5("") is a well-known constant.
        assert_eq!(
            digest,
            [
                0xd4, 0x1d, 0x8c, 0xd9, 0x8f, 0x00, 0xb2, 0x04, 0xe9, 0x80, 0x09, 0x98, 0xec, 0xf8, 0x42, 0x7e,
            ]
        );
    }

    #[test]
    fn interleaving_matches_manual_byte_layout() {
        let left = vec![1i32, -1];
        let right = vec![2i32, -2];
        let mut acc = Md5Accumulator::new();
        acc.update_interleaved(&[left, right], 2);
        let digest = acc.finalize();

        let mut expected = Vec::new();
        for &(l, r) in &[(1i16, 2i16), (-1, -2)] {
            expected.extend_from_slice(&l.to_le_bytes());
            expected.extend_from_slice(&r.to_le_bytes());
        }
        let mut hasher = Md5::new();
        hasher.update(&expected);
        let expected_digest: [u8; 16] = hasher.finalize().into();
        assert_eq!(digest, expected_digest);
    }

    #[test]
    fn bytes_per_sample_rounds_up() {
        assert_eq!(bytes_per_sample(8), 1);
        assert_eq!(bytes_per_sample(16), 2);
        assert_eq!(bytes_per_sample(20), 3);
        assert_eq!(bytes_per_sample(24), 3);
        assert_eq!(bytes_per_sample(32), 4);
    }
}
