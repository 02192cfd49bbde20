// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Linear predictive coding: autocorrelation, Levinson-Durbin recursion,
//! coefficient quantization, and the residual/restore kernels that use the
//! quantized coefficients.

pub const MAX_LPC_ORDER: usize = 32;
pub const MIN_PRECISION: u32 = 5;
pub const MAX_PRECISION: u32 = 15;

/// Computes `autoc[0..=max_order]`, the autocorrelation of `data` at lags
/// `0..=max_order`, in double precision.
pub fn compute_autocorrelation(data: &[i32], max_order: usize) -> Vec<f64> {
    let mut autoc = vec![0.0f64; max_order + 1];
    for lag in 0..=max_order {
        let mut sum = 0.0f64;
        for i in lag..data.len() {
            sum += data[i] as f64 * data[i - lag] as f64;
        }
        autoc[lag] = sum;
    }
    autoc
}

/// The Levinson-Durbin recursion. Returns, for each order `1..=max_order`, the
/// LPC coefficients `lp_coeff[order - 1][0..order]` (coefficient `j` predicts
/// using the sample `j + 1` steps in the past) and the prediction error
/// `err[order]`. If `autoc[0] == 0.0` the signal is silent/constant and no
/// coefficients are produced.
pub fn compute_lpc_coefficients(autoc: &[f64], max_order: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut err = vec![0.0f64; max_order + 1];
    let mut lpc_per_order = Vec::with_capacity(max_order);

    if autoc[0] == 0.0 {
        return (lpc_per_order, err);
    }

    err[0] = autoc[0];
    let mut lpc = vec![0.0f64; max_order];

    for i in 0..max_order {
        let mut acc = autoc[i + 1];
        for j in 0..i {
            acc -= lpc[j] * autoc[i - j];
        }
        let k = if err[i] != 0.0 { acc / err[i] } else { 0.0 };

        lpc[i] = k;
        for j in 0..i / 2 {
            let tmp = lpc[j];
            lpc[j] = tmp - k * lpc[i - 1 - j];
            lpc[i - 1 - j] -= k * tmp;
        }
        if i & 1 != 0 {
            let mid = i / 2;
            lpc[mid] -= k * lpc[mid];
        }

        err[i + 1] = err[i] * (1.0 - k * k);
        lpc_per_order.push(lpc[0..=i].to_vec());
    }

    (lpc_per_order, err)
}

/// Quantized LPC coefficients plus the shift needed to use them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedLpc {
    pub coefficients: Vec<i32>,
    pub shift: i32,
    pub precision: u32,
}

/// Quantizes a floating-point coefficient vector to `precision` bits, scaling
/// by `2^shift` and clamping to the representable range. Returns `None` if no
/// usable shift exists (e.g. all coefficients are zero, or the magnitude
/// requires a negative shift beyond the format's 5-bit signed field).
pub fn quantize_coefficients(lpc: &[f64], precision: u32) -> Option<QuantizedLpc> {
    debug_assert!((MIN_PRECISION..=MAX_PRECISION).contains(&precision));

    let cmax = lpc.iter().fold(0.0f64, |m, &c| m.max(c.abs()));
    if cmax <= 0.0 {
        return None;
    }

    let headroom = (precision - 1) as i32;
    let log2cmax = cmax.log2().floor() as i32 + 1;
    let mut shift = headroom - log2cmax;
    // The encoded shift is a signed 5-bit field, [-16, 15], but the `>>`
    // kernels in compute_residual/restore_signal only ever shift right, so a
    // negative shift (coefficients too large for the available headroom) is
    // not usable; the reference encoder skips the candidate in that case
    // rather than ever emitting one.
    if shift > 15 {
        shift = 15;
    }
    if shift < 0 {
        return None;
    }

    let qmax = (1i64 << (precision - 1)) - 1;
    let qmin = -(1i64 << (precision - 1));

    let mut coefficients = Vec::with_capacity(lpc.len());
    let mut carry = 0.0f64;
    for &c in lpc {
        let scaled = c * (1i64 << shift) as f64;
        let scaled = scaled + carry;
        let mut q = scaled.round() as i64;
        if q > qmax {
            q = qmax;
        } else if q < qmin {
            q = qmin;
        }
        carry = scaled - q as f64;
        coefficients.push(q as i32);
    }

    Some(QuantizedLpc { coefficients, shift, precision })
}

/// Computes the residual `r[i] = x[i] - (sum_j coeff[j] * x[i-1-j]) >> shift`
/// for `i` in `order..data.len()`. `residual.len()` must equal
/// `data.len() - order`, `order == coefficients.len()`.
pub fn compute_residual(data: &[i32], coefficients: &[i32], shift: i32, residual: &mut [i32]) {
    let order = coefficients.len();
    debug_assert_eq!(residual.len(), data.len() - order);

    for i in order..data.len() {
        let mut prediction: i64 = 0;
        for (j, &c) in coefficients.iter().enumerate() {
            prediction += c as i64 * data[i - 1 - j] as i64;
        }
        prediction >>= shift;
        residual[i - order] = data[i].wrapping_sub(prediction as i32);
    }
}

/// Restores `data[order..]` from `residual`, given `data[..order]` already
/// filled in with the warm-up samples. Inverse of [`compute_residual`].
pub fn restore_signal(residual: &[i32], coefficients: &[i32], shift: i32, data: &mut [i32]) {
    let order = coefficients.len();
    debug_assert_eq!(residual.len(), data.len() - order);

    for i in order..data.len() {
        let mut prediction: i64 = 0;
        for (j, &c) in coefficients.iter().enumerate() {
            prediction += c as i64 * data[i - 1 - j] as i64;
        }
        prediction >>= shift;
        data[i] = residual[i - order].wrapping_add(prediction as i32);
    }
}

/// Estimates the total number of bits needed to encode a block of `data_len`
/// samples at `order` with prediction error `err`, used to pick an order
/// without exhaustively quantizing and coding every candidate.
pub fn estimate_bits_per_order(err: f64, order: usize, data_len: usize, bits_per_sample: u32) -> f64 {
    if data_len == 0 {
        return 0.0;
    }
    let bits_per_residual_sample = if err > 0.0 {
        0.5 * (err / data_len as f64).log2()
    } else {
        0.0
    };
    let header_bits = order as f64 * (bits_per_sample as f64 + (data_len as f64).log2());
    data_len as f64 * bits_per_residual_sample.max(0.0) + header_bits
}

/// Picks the order (1-indexed, in `1..=max_order`) with the lowest estimated
/// total bit count, given the error terms from [`compute_lpc_coefficients`].
pub fn estimate_best_order(err: &[f64], max_order: usize, data_len: usize, bits_per_sample: u32) -> usize {
    let mut best_order = 1;
    let mut best_bits = f64::INFINITY;
    for order in 1..=max_order {
        let bits = estimate_bits_per_order(err[order], order, data_len, bits_per_sample);
        if bits < best_bits {
            best_bits = bits;
            best_order = order;
        }
    }
    best_order
}
