// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! The partitioned Rice entropy coder: parameter estimation, escape-coded
//! raw binary fallback, and the matching bit emit/parse routines built on
//! top of [`crate::bitstream`].

use crate::bitstream::{rice_bits, zigzag, BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::math::silog2;
use std::io;

/// Maximum Rice parameter; a partition header storing this value means the
/// partition escapes to unencoded binary instead.
pub const ESCAPE_PARAM: u32 = 15;
/// Maximum Rice parameter for the larger (`PARTITIONED_RICE2`) scheme.
pub const ESCAPE_PARAM2: u32 = 31;
const PARAM_BITS: u32 = 4;
const PARAM_BITS2: u32 = 5;
const RAW_LEN_BITS: u32 = 5;

/// Which of the two partitioned-Rice residual coding methods a subframe uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualMethod {
    /// 4-bit Rice parameters, escape value 15.
    PartitionedRice,
    /// 5-bit Rice parameters, escape value 31; decode-only, see module docs.
    PartitionedRice2,
}

impl ResidualMethod {
    fn param_bits(self) -> u32 {
        match self {
            ResidualMethod::PartitionedRice => PARAM_BITS,
            ResidualMethod::PartitionedRice2 => PARAM_BITS2,
        }
    }

    fn escape_value(self) -> u32 {
        match self {
            ResidualMethod::PartitionedRice => ESCAPE_PARAM,
            ResidualMethod::PartitionedRice2 => ESCAPE_PARAM2,
        }
    }
}

/// Picks the best Rice parameter for a partition given the sum of the
/// zigzag-mapped residuals, using the LOCO-I closed-form estimate and then
/// searching `search_dist` parameters around it for the true minimum.
pub fn estimate_rice_parameter(residual: &[i32], max_param: u32, search_dist: u32) -> (u32, u64) {
    if residual.is_empty() {
        return (0, 0);
    }

    let mean: f64 = residual.iter().map(|&r| zigzag(r as i64) as f64).sum::<f64>() / residual.len() as f64;
    let mut k_estimate = if mean > 0.0 {
        (mean.log2().ceil().max(0.0)) as u32
    } else {
        0
    };
    k_estimate = k_estimate.min(max_param);

    let lo = k_estimate.saturating_sub(search_dist);
    let hi = (k_estimate + search_dist).min(max_param);

    let mut best_k = lo;
    let mut best_bits = u64::MAX;
    for k in lo..=hi {
        let bits: u64 = residual.iter().map(|&r| rice_bits(r as i64, k)).sum();
        if bits < best_bits {
            best_bits = bits;
            best_k = k;
        }
    }
    log::trace!("rice parameter: {}, partition of {} residuals", best_k, residual.len());
    (best_k, best_bits)
}

/// The bit-width needed to store every residual in the partition as raw
/// two's complement binary, for the escape-coding fallback.
pub fn raw_bit_width(residual: &[i32]) -> u32 {
    residual.iter().map(|&r| silog2(r as i64)).max().unwrap_or(0)
}

/// A single partition's chosen coding: either a Rice parameter, or an escape
/// to raw binary at a given bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionCoding {
    Rice { parameter: u32 },
    Escape { raw_bits: u32 },
}

/// Chooses the cheapest partition order (`0..=max_partition_order`) and the
/// per-partition coding at that order, for a residual of `predictor_order`
/// fewer samples than the block.
pub fn choose_partition_order(
    residual: &[i32],
    block_size: usize,
    predictor_order: usize,
    method: ResidualMethod,
    min_partition_order: u32,
    max_partition_order: u32,
    search_dist: u32,
    do_escape_coding: bool,
) -> (u32, Vec<PartitionCoding>, u64) {
    let max_param = method.escape_value() - 1;
    let mut best_order = min_partition_order;
    let mut best_codings = Vec::new();
    let mut best_bits = u64::MAX;

    for order in min_partition_order..=max_partition_order {
        if order > 0 && (block_size >> order) << order != block_size {
            continue;
        }
        let n_partitions = 1usize << order;
        let n_samples = block_size >> order;
        if n_samples <= predictor_order && order > 0 {
            continue;
        }
        if n_samples == 0 {
            continue;
        }

        let mut codings = Vec::with_capacity(n_partitions);
        let mut total_bits: u64 = 4; // partition order field

        let mut start = 0usize;
        let mut ok = true;
        for i in 0..n_partitions {
            let len = n_samples - if i == 0 { predictor_order } else { 0 };
            if start + len > residual.len() {
                ok = false;
                break;
            }
            let part = &residual[start..start + len];
            let (param, rice_cost) = estimate_rice_parameter(part, max_param, search_dist);
            let rice_total = rice_cost + method.param_bits() as u64;

            let coding = if do_escape_coding {
                let raw_bits = raw_bit_width(part);
                let raw_total = method.param_bits() as u64 + RAW_LEN_BITS as u64 + raw_bits as u64 * len as u64;
                if raw_total < rice_total {
                    total_bits += raw_total;
                    PartitionCoding::Escape { raw_bits }
                } else {
                    total_bits += rice_total;
                    PartitionCoding::Rice { parameter: param }
                }
            } else {
                total_bits += rice_total;
                PartitionCoding::Rice { parameter: param }
            };
            codings.push(coding);
            start += len;
        }

        if ok && total_bits < best_bits {
            best_bits = total_bits;
            best_order = order;
            best_codings = codings;
        }
    }

    (best_order, best_codings, best_bits)
}

/// Writes a residual encoded as `method` with the given `partition_order` and
/// per-partition `codings`, previously chosen by [`choose_partition_order`].
pub fn write_residual<W: io::Write>(
    writer: &mut BitWriter<W>,
    residual: &[i32],
    block_size: usize,
    predictor_order: usize,
    method: ResidualMethod,
    partition_order: u32,
    codings: &[PartitionCoding],
) -> Result<()> {
    let method_bits: u32 = match method {
        ResidualMethod::PartitionedRice => 0b00,
        ResidualMethod::PartitionedRice2 => 0b01,
    };
    writer.write_leq_u32(method_bits, 2)?;
    writer.write_leq_u32(partition_order, 4)?;

    let n_partitions = 1usize << partition_order;
    let n_samples = block_size >> partition_order;
    let mut start = 0usize;
    for (i, coding) in codings.iter().enumerate().take(n_partitions) {
        let len = n_samples - if i == 0 { predictor_order } else { 0 };
        let part = &residual[start..start + len];
        match *coding {
            PartitionCoding::Rice { parameter } => {
                writer.write_leq_u32(parameter, method.param_bits())?;
                for &r in part {
                    writer.write_rice_signed(r as i64, parameter)?;
                }
            }
            PartitionCoding::Escape { raw_bits } => {
                writer.write_leq_u32(method.escape_value(), method.param_bits())?;
                writer.write_leq_u32(raw_bits, RAW_LEN_BITS)?;
                for &r in part {
                    if raw_bits == 0 {
                        continue;
                    }
                    writer.write_leq_u32(crate::sample::truncate_to_bits(r, raw_bits), raw_bits)?;
                }
            }
        }
        start += len;
    }
    Ok(())
}

/// Reads a residual coding method tag (2 bits) and dispatches to the matching
/// partitioned-Rice reader, filling `residual` (length `block_size -
/// predictor_order`).
pub fn read_residual<R: io::Read>(
    reader: &mut BitReader<R>,
    block_size: usize,
    predictor_order: usize,
    bps: u32,
    residual: &mut [i32],
) -> Result<()> {
    let method_bits = reader.read_leq_u32(2)?;
    let method = match method_bits {
        0b00 => ResidualMethod::PartitionedRice,
        0b01 => ResidualMethod::PartitionedRice2,
        _ => return Err(Error::InvalidResidual),
    };
    read_partitioned_rice(reader, block_size, predictor_order, bps, method, residual)
}

fn read_partitioned_rice<R: io::Read>(
    reader: &mut BitReader<R>,
    block_size: usize,
    predictor_order: usize,
    bps: u32,
    method: ResidualMethod,
    residual: &mut [i32],
) -> Result<()> {
    let order = reader.read_leq_u32(4)?;
    let n_partitions = 1usize << order;
    let n_samples = block_size >> order;
    if predictor_order > n_samples {
        return Err(Error::InvalidResidual);
    }
    debug_assert_eq!(residual.len(), block_size - predictor_order);

    let mut start = 0usize;
    for i in 0..n_partitions {
        let len = n_samples - if i == 0 { predictor_order } else { 0 };
        if start + len > residual.len() {
            return Err(Error::InvalidResidual);
        }
        let part = &mut residual[start..start + len];
        let parameter = reader.read_leq_u32(method.param_bits())?;
        if parameter == method.escape_value() {
            let raw_bits = reader.read_leq_u32(RAW_LEN_BITS)?;
            if raw_bits > 32 {
                return Err(Error::InvalidBitsPerSample);
            }
            for sample in part.iter_mut() {
                *sample = if raw_bits == 0 {
                    0
                } else {
                    crate::sample::extend_sign_u32(reader.read_leq_u32(raw_bits)?, raw_bits)
                };
            }
        } else {
            for sample in part.iter_mut() {
                *sample = reader.read_rice_signed(parameter)? as i32;
            }
        }
        start += len;
    }

    Ok(())
}
