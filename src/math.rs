// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Small integer helpers shared by the predictor and entropy coder modules.

/// Returns `floor(log2(v))` for `v > 0`.
///
/// # Panics
/// Panics if `v == 0`.
#[inline]
pub fn ilog2(v: u64) -> u32 {
    debug_assert!(v > 0);
    63 - v.leading_zeros()
}

/// Returns the number of bits needed to represent `v` as a two's complement
/// signed integer, i.e. the smallest `n` such that `-(1 << (n - 1)) <= v < (1 << (n - 1))`.
///
/// This mirrors the reference encoder's raw-bit-width estimation used to decide
/// whether a Rice partition should escape to unencoded binary.
#[inline]
pub fn silog2(v: i64) -> u32 {
    if v == 0 {
        return 0;
    }
    // A value v needs ilog2(|v|) + 2 bits when v is negative and not a power of
    // two shy of the negative boundary; the simplest correct rule is to find the
    // smallest n with -(1 << (n-1)) <= v <= (1 << (n-1)) - 1.
    let mut n = 2u32;
    loop {
        let lo = -(1i64 << (n - 1));
        let hi = (1i64 << (n - 1)) - 1;
        if v >= lo && v <= hi {
            return n;
        }
        n += 1;
        if n > 64 {
            return 64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ilog2_powers_of_two() {
        assert_eq!(ilog2(1), 0);
        assert_eq!(ilog2(2), 1);
        assert_eq!(ilog2(3), 1);
        assert_eq!(ilog2(4), 2);
        assert_eq!(ilog2(1023), 9);
        assert_eq!(ilog2(1024), 10);
    }

    #[test]
    fn silog2_boundaries() {
        assert_eq!(silog2(0), 0);
        assert_eq!(silog2(1), 2);
        assert_eq!(silog2(-1), 2);
        assert_eq!(silog2(-2), 2);
        assert_eq!(silog2(1), 2);
        assert_eq!(silog2(-3), 3);
        assert_eq!(silog2(3), 3);
        assert_eq!(silog2(-4), 3);
        assert_eq!(silog2(4), 4);
    }
}
