// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Subframes: the per-channel payload inside a frame. A subframe is one of
//! constant, verbatim, a fixed predictor (order 0-4), or LPC (order 1-32),
//! optionally preceded by a wasted-bits count. The decode side parses whatever
//! the header says; the encode side ([`plan_subframe`]/[`write_subframe`])
//! searches the available models and keeps the cheapest.

use std::io;

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::fixed;
use crate::lpc;
use crate::rice::{self, PartitionCoding, ResidualMethod};
use crate::sample;

/// The subframe type named by a subframe header's 6-bit type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubframeType {
    Constant,
    Verbatim,
    /// Fixed predictor, order 0-4.
    Fixed(u32),
    /// LPC, order 1-32.
    Lpc(u32),
}

/// Reads a subframe header: the reserved bit, the 6-bit type code, and the
/// optional wasted-bits unary count. Returns the parsed type and the number
/// of wasted bits (0 if the subframe has none).
pub fn read_subframe_header<R: io::Read>(reader: &mut BitReader<R>) -> Result<(SubframeType, u32)> {
    if reader.read_bit()? != 0 {
        return Err(Error::InvalidSubframeHeader);
    }
    let type_code = reader.read_leq_u32(6)?;
    let sftype = match type_code {
        0b000_000 => SubframeType::Constant,
        0b000_001 => SubframeType::Verbatim,
        n if (n & 0b111_110 == 0b000_010) || (n & 0b111_100 == 0b000_100) || (n & 0b110_000 == 0b010_000) => {
            return Err(Error::InvalidSubframeHeader);
        }
        n if n & 0b111_000 == 0b001_000 => {
            let order = n & 0b000_111;
            if order > fixed::MAX_FIXED_ORDER as u32 {
                return Err(Error::InvalidSubframeHeader);
            }
            SubframeType::Fixed(order)
        }
        n => SubframeType::Lpc((n & 0b011_111) + 1),
    };
    let has_wasted = reader.read_bit()? == 1;
    let wasted_bits = if has_wasted { reader.read_unary()? + 1 } else { 0 };
    Ok((sftype, wasted_bits))
}

/// Writes a subframe header.
pub fn write_subframe_header<W: io::Write>(
    writer: &mut BitWriter<W>,
    sftype: SubframeType,
    wasted_bits: u32,
) -> Result<()> {
    writer.write_bit(0)?;
    let type_code = match sftype {
        SubframeType::Constant => 0b000_000,
        SubframeType::Verbatim => 0b000_001,
        SubframeType::Fixed(order) => 0b001_000 | order,
        SubframeType::Lpc(order) => 0b100_000 | (order - 1),
    };
    writer.write_leq_u32(type_code, 6)?;
    if wasted_bits > 0 {
        writer.write_bit(1)?;
        writer.write_unary(wasted_bits - 1)?;
    } else {
        writer.write_bit(0)?;
    }
    Ok(())
}

/// Decodes one subframe of `block_size` samples at `bps` bits per sample
/// into `out`, growing or shrinking it to `block_size` as needed.
pub fn decode_subframe<R: io::Read>(
    reader: &mut BitReader<R>,
    bps: u32,
    block_size: usize,
    out: &mut Vec<i32>,
) -> Result<()> {
    let (sftype, wasted_bits) = read_subframe_header(reader)?;
    log::trace!("encountered subframe of type {:?}", sftype);
    let eff_bps = bps
        .checked_sub(wasted_bits)
        .filter(|&b| b > 0)
        .ok_or(Error::InvalidSubframe("wasted bits consume the entire sample width"))?;

    out.clear();
    out.resize(block_size, 0);

    match sftype {
        SubframeType::Constant => {
            let v = reader.read_leq_u32(eff_bps)?;
            let s = sample::extend_sign_u32(v, eff_bps);
            out.iter_mut().for_each(|sample| *sample = s);
        }
        SubframeType::Verbatim => {
            for sample in out.iter_mut() {
                let v = reader.read_leq_u32(eff_bps)?;
                *sample = sample::extend_sign_u32(v, eff_bps);
            }
        }
        SubframeType::Fixed(order) => {
            let order = order as usize;
            if order > block_size {
                return Err(Error::InvalidSubframe("fixed predictor order exceeds block size"));
            }
            for sample in out[..order].iter_mut() {
                let v = reader.read_leq_u32(eff_bps)?;
                *sample = sample::extend_sign_u32(v, eff_bps);
            }
            let mut residual = vec![0i32; block_size - order];
            rice::read_residual(reader, block_size, order, eff_bps, &mut residual)?;
            fixed::restore_signal(&residual, order, out);
        }
        SubframeType::Lpc(order) => {
            let order = order as usize;
            if order > block_size {
                return Err(Error::InvalidSubframe("lpc order exceeds block size"));
            }
            for sample in out[..order].iter_mut() {
                let v = reader.read_leq_u32(eff_bps)?;
                *sample = sample::extend_sign_u32(v, eff_bps);
            }
            let precision = reader.read_leq_u32(4)? + 1;
            if precision > lpc::MAX_PRECISION {
                return Err(Error::InvalidSubframe("reserved qlp coefficient precision"));
            }
            let shift = sample::extend_sign_u32(reader.read_leq_u32(5)?, 5);
            if shift < 0 {
                return Err(Error::InvalidSubframe("negative qlp coefficient shift"));
            }
            let mut coefficients = Vec::with_capacity(order);
            for _ in 0..order {
                let c = reader.read_leq_u32(precision)?;
                coefficients.push(sample::extend_sign_u32(c, precision));
            }
            let mut residual = vec![0i32; block_size - order];
            rice::read_residual(reader, block_size, order, eff_bps, &mut residual)?;
            lpc::restore_signal(&residual, &coefficients, shift, out);
        }
    }

    if wasted_bits > 0 {
        for sample in out.iter_mut() {
            *sample <<= wasted_bits;
        }
    }

    Ok(())
}

/// Settings that bound the encode-side model search.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub max_lpc_order: u32,
    pub qlp_coeff_precision: u32,
    pub do_qlp_coeff_prec_search: bool,
    pub do_exhaustive_model_search: bool,
    pub do_escape_coding: bool,
    pub min_residual_partition_order: u32,
    pub max_residual_partition_order: u32,
    pub rice_parameter_search_dist: u32,
}

impl Default for EncodeSettings {
    fn default() -> EncodeSettings {
        EncodeSettings {
            max_lpc_order: 8,
            qlp_coeff_precision: 0,
            do_qlp_coeff_prec_search: false,
            do_exhaustive_model_search: false,
            do_escape_coding: false,
            min_residual_partition_order: 0,
            max_residual_partition_order: 6,
            rice_parameter_search_dist: 0,
        }
    }
}

#[derive(Debug, Clone)]
enum PlanKind {
    Constant,
    Verbatim,
    Fixed {
        order: usize,
        residual: Vec<i32>,
        partition_order: u32,
        codings: Vec<PartitionCoding>,
    },
    Lpc {
        order: usize,
        precision: u32,
        shift: i32,
        coefficients: Vec<i32>,
        residual: Vec<i32>,
        partition_order: u32,
        codings: Vec<PartitionCoding>,
    },
}

/// A fully-chosen subframe, ready to be written with [`write_subframe`], plus
/// the total bit count it costs (including its header).
#[derive(Debug, Clone)]
pub struct SubframePlan {
    wasted_bits: u32,
    bps: u32,
    samples: Vec<i32>,
    kind: PlanKind,
    pub bits: u64,
}

/// Width, in bits, of a subframe header plus its wasted-bits unary field.
fn header_bits(wasted_bits: u32) -> u64 {
    8 + wasted_bits as u64
}

fn evaluate_fixed(
    shifted: &[i32],
    eff_bps: u32,
    wasted_bits: u32,
    order: usize,
    settings: &EncodeSettings,
) -> Option<(u64, PlanKind)> {
    let n = shifted.len();
    if order >= n {
        return None;
    }
    let mut residual = vec![0i32; n - order];
    fixed::compute_residual(shifted, order, &mut residual);
    let (partition_order, codings, rice_bits) = rice::choose_partition_order(
        &residual,
        n,
        order,
        ResidualMethod::PartitionedRice,
        settings.min_residual_partition_order,
        settings.max_residual_partition_order,
        settings.rice_parameter_search_dist,
        settings.do_escape_coding,
    );
    let bits = header_bits(wasted_bits) + order as u64 * eff_bps as u64 + 2 + rice_bits;
    Some((bits, PlanKind::Fixed { order, residual, partition_order, codings }))
}

/// The largest LPC coefficient precision for which `precision + bps < 32`
/// still holds, clamped to the format's `[MIN_PRECISION, MAX_PRECISION]` range.
fn max_lpc_precision_for_bps(eff_bps: u32) -> Option<u32> {
    let headroom = 31u32.checked_sub(eff_bps)?;
    let max_prec = headroom.min(lpc::MAX_PRECISION);
    if max_prec < lpc::MIN_PRECISION {
        None
    } else {
        Some(max_prec)
    }
}

#[allow(clippy::too_many_arguments)]
fn evaluate_lpc(
    shifted: &[i32],
    eff_bps: u32,
    wasted_bits: u32,
    order: usize,
    precision: u32,
    coeffs_f64: &[f64],
    settings: &EncodeSettings,
) -> Option<(u64, PlanKind)> {
    let n = shifted.len();
    if order >= n {
        return None;
    }
    let q = lpc::quantize_coefficients(coeffs_f64, precision)?;
    let mut residual = vec![0i32; n - order];
    lpc::compute_residual(shifted, &q.coefficients, q.shift, &mut residual);
    let (partition_order, codings, rice_bits) = rice::choose_partition_order(
        &residual,
        n,
        order,
        ResidualMethod::PartitionedRice,
        settings.min_residual_partition_order,
        settings.max_residual_partition_order,
        settings.rice_parameter_search_dist,
        settings.do_escape_coding,
    );
    let bits = header_bits(wasted_bits)
        + order as u64 * eff_bps as u64
        + 4
        + 5
        + order as u64 * precision as u64
        + 2
        + rice_bits;
    Some((
        bits,
        PlanKind::Lpc {
            order,
            precision,
            shift: q.shift,
            coefficients: q.coefficients,
            residual,
            partition_order,
            codings,
        },
    ))
}

/// Searches constant/verbatim/fixed/LPC models for `samples` at `bps` bits
/// per sample and returns the cheapest as a [`SubframePlan`].
pub fn plan_subframe(samples: &[i32], bps: u32, settings: &EncodeSettings) -> SubframePlan {
    let wasted_bits = sample::detect_wasted_bits(samples);
    if wasted_bits > 0 {
        log::trace!("subframe has {} wasted bits per sample", wasted_bits);
    }
    let shifted: Vec<i32> = if wasted_bits > 0 {
        samples.iter().map(|&s| s >> wasted_bits).collect()
    } else {
        samples.to_vec()
    };
    let eff_bps = bps - wasted_bits;
    let n = shifted.len();

    if n > 0 && shifted.iter().all(|&s| s == shifted[0]) {
        let bits = header_bits(wasted_bits) + eff_bps as u64;
        log::trace!("subframe type is constant, value {}", shifted[0]);
        return SubframePlan { wasted_bits, bps: eff_bps, samples: shifted, kind: PlanKind::Constant, bits };
    }

    let mut best_bits = header_bits(wasted_bits) + eff_bps as u64 * n as u64;
    let mut best_kind = PlanKind::Verbatim;

    let fixed_orders: Vec<usize> = if settings.do_exhaustive_model_search {
        (0..=fixed::MAX_FIXED_ORDER).collect()
    } else if n > 4 {
        let history = [shifted[0], shifted[1], shifted[2], shifted[3]];
        let (guess, _) = fixed::compute_best_predictor(history, &shifted[4..]);
        vec![guess]
    } else {
        vec![0]
    };
    for order in fixed_orders {
        if let Some((bits, kind)) = evaluate_fixed(&shifted, eff_bps, wasted_bits, order, settings) {
            if bits < best_bits {
                best_bits = bits;
                best_kind = kind;
            }
        }
    }

    if settings.max_lpc_order > 0 && n > settings.max_lpc_order as usize {
        let max_order = (settings.max_lpc_order as usize).min(n - 1);
        if max_order >= 1 {
            let autoc = lpc::compute_autocorrelation(&shifted, max_order);
            let (lpc_per_order, err) = lpc::compute_lpc_coefficients(&autoc, max_order);
            if lpc_per_order.len() == max_order {
                if let Some(max_prec) = max_lpc_precision_for_bps(eff_bps) {
                    let orders: Vec<usize> = if settings.do_exhaustive_model_search {
                        (1..=max_order).collect()
                    } else {
                        vec![lpc::estimate_best_order(&err, max_order, n, eff_bps)]
                    };
                    let precisions: Vec<u32> = if settings.qlp_coeff_precision != 0 && !settings.do_qlp_coeff_prec_search
                    {
                        vec![settings.qlp_coeff_precision.min(max_prec)]
                    } else if settings.do_qlp_coeff_prec_search {
                        (lpc::MIN_PRECISION..=max_prec).collect()
                    } else {
                        vec![max_prec]
                    };

                    for &order in &orders {
                        let coeffs_f64 = &lpc_per_order[order - 1];
                        for &precision in &precisions {
                            if let Some((bits, kind)) =
                                evaluate_lpc(&shifted, eff_bps, wasted_bits, order, precision, coeffs_f64, settings)
                            {
                                if bits < best_bits {
                                    best_bits = bits;
                                    best_kind = kind;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    log::trace!(
        "subframe type chosen: {}, {} bits",
        match &best_kind {
            PlanKind::Constant => "constant".to_string(),
            PlanKind::Verbatim => "verbatim".to_string(),
            PlanKind::Fixed { order, .. } => format!("fixed(order={})", order),
            PlanKind::Lpc { order, .. } => format!("lpc(order={})", order),
        },
        best_bits
    );
    SubframePlan { wasted_bits, bps: eff_bps, samples: shifted, kind: best_kind, bits: best_bits }
}

/// Writes a subframe previously chosen by [`plan_subframe`].
pub fn write_subframe<W: io::Write>(writer: &mut BitWriter<W>, plan: &SubframePlan) -> Result<()> {
    let sftype = match &plan.kind {
        PlanKind::Constant => SubframeType::Constant,
        PlanKind::Verbatim => SubframeType::Verbatim,
        PlanKind::Fixed { order, .. } => SubframeType::Fixed(*order as u32),
        PlanKind::Lpc { order, .. } => SubframeType::Lpc(*order as u32),
    };
    write_subframe_header(writer, sftype, plan.wasted_bits)?;

    match &plan.kind {
        PlanKind::Constant => {
            writer.write_leq_u32(sample::truncate_to_bits(plan.samples[0], plan.bps), plan.bps)?;
        }
        PlanKind::Verbatim => {
            for &s in &plan.samples {
                writer.write_leq_u32(sample::truncate_to_bits(s, plan.bps), plan.bps)?;
            }
        }
        PlanKind::Fixed { order, residual, partition_order, codings } => {
            for &s in &plan.samples[..*order] {
                writer.write_leq_u32(sample::truncate_to_bits(s, plan.bps), plan.bps)?;
            }
            rice::write_residual(
                writer,
                residual,
                plan.samples.len(),
                *order,
                ResidualMethod::PartitionedRice,
                *partition_order,
                codings,
            )?;
        }
        PlanKind::Lpc { order, precision, shift, coefficients, residual, partition_order, codings } => {
            for &s in &plan.samples[..*order] {
                writer.write_leq_u32(sample::truncate_to_bits(s, plan.bps), plan.bps)?;
            }
            writer.write_leq_u32(precision - 1, 4)?;
            writer.write_leq_u32(sample::truncate_to_bits(*shift, 5), 5)?;
            for &c in coefficients {
                writer.write_leq_u32(sample::truncate_to_bits(c, *precision), *precision)?;
            }
            rice::write_residual(
                writer,
                residual,
                plan.samples.len(),
                *order,
                ResidualMethod::PartitionedRice,
                *partition_order,
                codings,
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(samples: &[i32], bps: u32, settings: &EncodeSettings) -> Vec<i32> {
        let plan = plan_subframe(samples, bps, settings);
        let mut buf = Vec::new();
        {
            let mut w = BitWriter::new(&mut buf);
            write_subframe(&mut w, &plan).unwrap();
            w.zero_pad_to_byte_boundary().unwrap();
        }
        let mut cursor = Cursor::new(&buf[..]);
        let mut r = BitReader::new(&mut cursor);
        let mut out = Vec::new();
        decode_subframe(&mut r, bps, samples.len(), &mut out).unwrap();
        out
    }

    #[test]
    fn constant_subframe_roundtrips() {
        let samples = [42i32; 64];
        let decoded = roundtrip(&samples, 16, &EncodeSettings::default());
        assert_eq!(decoded, samples);
    }

    #[test]
    fn verbatim_subframe_is_chosen_for_noise_and_roundtrips() {
        let samples: Vec<i32> = (0..32).map(|i| if i % 2 == 0 { 30000 } else { -30000 }).collect();
        let decoded = roundtrip(&samples, 16, &EncodeSettings::default());
        assert_eq!(decoded, samples);
    }

    #[test]
    fn fixed_subframe_roundtrips_a_ramp() {
        let samples: Vec<i32> = (0..128).map(|i| i * 3 - 64).collect();
        let decoded = roundtrip(&samples, 16, &EncodeSettings::default());
        assert_eq!(decoded, samples);
        let plan = plan_subframe(&samples, 16, &EncodeSettings::default());
        assert!(matches!(plan.kind, PlanKind::Fixed { .. } | PlanKind::Lpc { .. }));
    }

    #[test]
    fn lpc_subframe_roundtrips_a_sine_like_signal() {
        let samples: Vec<i32> = (0..256)
            .map(|i| {
                let x = i as f64 * 0.1;
                (x.sin() * 10000.0) as i32
            })
            .collect();
        let mut settings = EncodeSettings::default();
        settings.max_lpc_order = 8;
        settings.do_exhaustive_model_search = true;
        let decoded = roundtrip(&samples, 16, &settings);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn wasted_bits_roundtrip() {
        let samples: Vec<i32> = (0..64).map(|i| (i * 8) - 256).collect();
        let decoded = roundtrip(&samples, 16, &EncodeSettings::default());
        assert_eq!(decoded, samples);
        let plan = plan_subframe(&samples, 16, &EncodeSettings::default());
        assert_eq!(plan.wasted_bits, 3);
    }

    #[test]
    fn precision_search_still_roundtrips() {
        let samples: Vec<i32> = (0..200).map(|i| ((i * i) % 4001) - 2000).collect();
        let mut settings = EncodeSettings::default();
        settings.do_qlp_coeff_prec_search = true;
        settings.max_lpc_order = 4;
        let decoded = roundtrip(&samples, 16, &settings);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn escape_coding_roundtrips_with_outliers() {
        let mut samples = vec![0i32; 64];
        samples[10] = 120_000;
        samples[20] = -120_000;
        let mut settings = EncodeSettings::default();
        settings.do_escape_coding = true;
        let decoded = roundtrip(&samples, 18, &settings);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn header_rejects_reserved_type_code() {
        let mut buf = Vec::new();
        {
            let mut w = BitWriter::new(&mut buf);
            w.write_bit(0).unwrap();
            w.write_leq_u32(0b000_010, 6).unwrap();
            w.zero_pad_to_byte_boundary().unwrap();
        }
        let mut cursor = Cursor::new(&buf[..]);
        let mut r = BitReader::new(&mut cursor);
        assert!(read_subframe_header(&mut r).is_err());
    }
}
