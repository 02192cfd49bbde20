// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Fixed (polynomial) predictors of order 0 through 4.
//!
//! Order `n` predicts each sample as the `n`-th forward difference of the
//! previous `n` samples; order 0 is the identity (no prediction at all). The
//! coefficients for orders 1-4 are the binomial coefficients with alternating
//! sign, which is why `compute_residual`/`restore_signal` below hardcode them
//! rather than running a general convolution.

pub const MAX_FIXED_ORDER: usize = 4;

/// Computes the order-`order` residual of `data[order..]`, using `data[..order]`
/// as prior context. `residual.len()` must equal `data.len() - order`.
pub fn compute_residual(data: &[i32], order: usize, residual: &mut [i32]) {
    debug_assert_eq!(residual.len(), data.len() - order);
    match order {
        0 => {
            residual.copy_from_slice(&data[0..]);
        }
        1 => {
            for i in 1..data.len() {
                residual[i - 1] = data[i].wrapping_sub(data[i - 1]);
            }
        }
        2 => {
            for i in 2..data.len() {
                residual[i - 2] = data[i]
                    .wrapping_sub(data[i - 1].wrapping_shl(1))
                    .wrapping_add(data[i - 2]);
            }
        }
        3 => {
            for i in 3..data.len() {
                let d = data[i - 1].wrapping_sub(data[i - 2]);
                residual[i - 3] = data[i]
                    .wrapping_sub(d.wrapping_shl(1).wrapping_add(d))
                    .wrapping_sub(data[i - 3]);
            }
        }
        4 => {
            for i in 4..data.len() {
                residual[i - 4] = data[i]
                    .wrapping_sub((data[i - 1].wrapping_add(data[i - 3])).wrapping_shl(2))
                    .wrapping_add((data[i - 2].wrapping_shl(2)).wrapping_add(data[i - 2].wrapping_shl(1)))
                    .wrapping_add(data[i - 4]);
            }
        }
        _ => unreachable!("fixed predictor order must be 0..=4"),
    }
}

/// Restores `data[order..]` from `residual`, given `data[..order]` already
/// filled in with the warm-up samples. `residual.len()` must equal
/// `data.len() - order`.
pub fn restore_signal(residual: &[i32], order: usize, data: &mut [i32]) {
    debug_assert_eq!(residual.len(), data.len() - order);
    match order {
        0 => {
            data[0..].copy_from_slice(residual);
        }
        1 => {
            for i in 1..data.len() {
                data[i] = residual[i - 1].wrapping_add(data[i - 1]);
            }
        }
        2 => {
            for i in 2..data.len() {
                data[i] = residual[i - 2]
                    .wrapping_add(data[i - 1].wrapping_shl(1))
                    .wrapping_sub(data[i - 2]);
            }
        }
        3 => {
            for i in 3..data.len() {
                let d = data[i - 1].wrapping_sub(data[i - 2]);
                data[i] = residual[i - 3]
                    .wrapping_add(d.wrapping_shl(1).wrapping_add(d))
                    .wrapping_add(data[i - 3]);
            }
        }
        4 => {
            for i in 4..data.len() {
                data[i] = residual[i - 4]
                    .wrapping_add((data[i - 1].wrapping_add(data[i - 3])).wrapping_shl(2))
                    .wrapping_sub((data[i - 2].wrapping_shl(2)).wrapping_add(data[i - 2].wrapping_shl(1)))
                    .wrapping_sub(data[i - 4]);
            }
        }
        _ => unreachable!("fixed predictor order must be 0..=4"),
    }
}

/// Picks the fixed predictor order (0-4) with the smallest sum of absolute
/// residuals, given `data[..4]` as history before the subframe proper.
///
/// `data` must hold at least 4 samples of context followed by the samples to
/// model; this mirrors `FLAC__fixed_compute_best_predictor_wide`, which is
/// always used here since 64-bit accumulators make the computation exact
/// regardless of bit depth or block size.
pub fn compute_best_predictor(history: [i32; 4], data: &[i32]) -> (usize, [f64; MAX_FIXED_ORDER + 1]) {
    let mut last_error_0 = history[3];
    let mut last_error_1 = history[3] - history[2];
    let mut last_error_2 = last_error_1 - (history[2] - history[1]);
    let mut last_error_3 = last_error_2 - (history[2] - 2 * history[1] + history[0]);

    let mut total: [u64; MAX_FIXED_ORDER + 1] = [0; MAX_FIXED_ORDER + 1];

    for &sample in data {
        let mut error = sample;
        total[0] += error.unsigned_abs() as u64;
        let save = error;
        error -= last_error_0;
        total[1] += error.unsigned_abs() as u64;
        last_error_0 = save;
        let save = error;
        error -= last_error_1;
        total[2] += error.unsigned_abs() as u64;
        last_error_1 = save;
        let save = error;
        error -= last_error_2;
        total[3] += error.unsigned_abs() as u64;
        last_error_2 = save;
        let save = error;
        error -= last_error_3;
        total[4] += error.unsigned_abs() as u64;
        last_error_3 = save;
    }

    let mut order = 0;
    for n in 1..=MAX_FIXED_ORDER {
        if total[n] < total[order] {
            order = n;
        }
    }

    let data_len = data.len() as f64;
    let mut bits_per_sample = [0.0f64; MAX_FIXED_ORDER + 1];
    for n in 0..=MAX_FIXED_ORDER {
        if !data.is_empty() && total[n] > 0 {
            bits_per_sample[n] =
                (std::f64::consts::LN_2 * total[n] as f64 / data_len).ln() / std::f64::consts::LN_2;
        }
    }

    (order, bits_per_sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_zero_is_identity() {
        let data = [1i32, -2, 3, -4, 5];
        let mut residual = [0i32; 5];
        compute_residual(&data, 0, &mut residual);
        assert_eq!(residual, data);
        let mut restored = [0i32; 5];
        restore_signal(&residual, 0, &mut restored);
        assert_eq!(restored, data);
    }

    #[test]
    fn roundtrip_all_orders_on_a_ramp() {
        let data: Vec<i32> = (0..32).map(|i| (i * 37 % 101) - 50).collect();
        for order in 0..=MAX_FIXED_ORDER {
            let mut residual = vec![0i32; data.len() - order];
            compute_residual(&data, order, &mut residual);
            let mut restored = data.clone();
            for s in &mut restored[order..] {
                *s = 0;
            }
            restore_signal(&residual, order, &mut restored);
            assert_eq!(restored, data, "order {} failed to roundtrip", order);
        }
    }

    #[test]
    fn constant_signal_is_exactly_predicted_from_order_one() {
        // A constant signal has zero first difference, so order >= 1 residuals
        // are all zero.
        let data = [7i32; 16];
        for order in 1..=MAX_FIXED_ORDER {
            let mut residual = vec![0i32; data.len() - order];
            compute_residual(&data, order, &mut residual);
            assert!(residual.iter().all(|&r| r == 0), "order {}", order);
        }
    }

    #[test]
    fn best_predictor_picks_zero_for_silence() {
        let (order, _) = compute_best_predictor([0, 0, 0, 0], &[0i32; 64]);
        assert_eq!(order, 0);
    }

    #[test]
    fn best_predictor_picks_high_order_for_a_ramp() {
        let history = [-4, -3, -2, -1];
        let data: Vec<i32> = (0..64).collect();
        let (order, _) = compute_best_predictor(history, &data);
        // A linear ramp has zero second difference, so order 2 (or higher)
        // should win over orders 0 and 1.
        assert!(order >= 1);
    }
}
