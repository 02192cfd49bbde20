// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Frame headers, stereo decorrelation, and the frame-level read/write
//! orchestration that ties the per-channel subframe coder together with the
//! frame header and footer.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;

use crate::bitstream::{BitReader, BitWriter};
use crate::crc::{Crc16Writer, Crc8Reader, Crc8Writer};
use crate::error::{Error, Result};
use crate::sample;
use crate::subframe;

/// Whether successive frames are numbered by frame index (fixed block size)
/// or by the sample number of their first sample (variable block size).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockingStrategy {
    Fixed,
    Variable,
}

/// The value encoded in a frame header's "frame/sample number" field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTime {
    FrameNumber(u32),
    SampleNumber(u64),
}

/// How a stereo pair of subframes maps onto left/right output channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelAssignment {
    /// `n` channels are coded as-is, with no decorrelation.
    Independent(u8),
    /// Subframe 0 is left, subframe 1 is left-minus-right (the "side" channel).
    LeftSideStereo,
    /// Subframe 0 is left-minus-right, subframe 1 is right.
    RightSideStereo,
    /// Subframe 0 is `(left + right) >> 1`, subframe 1 is left-minus-right.
    MidSideStereo,
}

impl ChannelAssignment {
    pub fn channels(self) -> u8 {
        match self {
            ChannelAssignment::Independent(n) => n,
            ChannelAssignment::LeftSideStereo
            | ChannelAssignment::RightSideStereo
            | ChannelAssignment::MidSideStereo => 2,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            ChannelAssignment::Independent(n) => n - 1,
            ChannelAssignment::LeftSideStereo => 0b1000,
            ChannelAssignment::RightSideStereo => 0b1001,
            ChannelAssignment::MidSideStereo => 0b1010,
        }
    }
}

/// A fully-parsed frame header.
#[derive(Clone, Copy, Debug)]
pub struct FrameHeader {
    pub block_time: BlockTime,
    pub block_size: u16,
    /// `None` means "use the sample rate from STREAMINFO".
    pub sample_rate: Option<u32>,
    pub channel_assignment: ChannelAssignment,
    /// `None` means "use the bits per sample from STREAMINFO".
    pub bits_per_sample: Option<u8>,
}

impl FrameHeader {
    pub fn channels(&self) -> u8 {
        self.channel_assignment.channels()
    }
}

/// Reads a variable-length integer encoded in the scheme the specification
/// calls "UTF-8" coding (it is not real UTF-8): up to 7 bytes, encoding
/// integers up to 36 bits.
pub fn read_var_length_int<R: io::Read>(input: &mut R) -> Result<u64> {
    let first = input.read_u8()?;
    let mut read_additional = 0u8;
    let mut mask_data = 0b0111_1111u8;
    let mut mask_mark = 0b1000_0000u8;

    while first & mask_mark != 0 {
        read_additional += 1;
        mask_data >>= 1;
        mask_mark >>= 1;
    }

    if read_additional == 1 {
        return Err(Error::InvalidVarLengthInt);
    } else if read_additional > 0 {
        read_additional -= 1;
    }

    let mut result = ((first & mask_data) as u64) << (6 * read_additional);
    for i in (0..read_additional as i16).rev() {
        let byte = input.read_u8()?;
        if byte & 0b1100_0000 != 0b1000_0000 {
            return Err(Error::InvalidVarLengthInt);
        }
        result |= ((byte & 0b0011_1111) as u64) << (6 * i as usize);
    }

    Ok(result)
}

/// Writes a variable-length integer in the same scheme as [`read_var_length_int`].
pub fn write_var_length_int<W: io::Write>(output: &mut W, value: u64) -> Result<()> {
    if value < 0x80 {
        output.write_u8(value as u8)?;
        return Ok(());
    }

    let mut extra = 1u32;
    while extra < 6 && value >= (1u64 << (6 + 5 * extra)) {
        extra += 1;
    }
    let total_bytes = extra + 1;
    let lead_bits = 6 - extra;
    let lead_value = value >> (6 * extra);
    debug_assert!(lead_bits == 0 || lead_value < (1u64 << lead_bits));
    let lead_byte = ((0xffu32 << (8 - total_bytes)) & 0xff) as u8 | lead_value as u8;
    output.write_u8(lead_byte)?;

    for i in (0..extra).rev() {
        let byte = 0b1000_0000u32 | (((value >> (6 * i)) & 0x3f) as u32);
        output.write_u8(byte as u8)?;
    }
    Ok(())
}

/// Reads a frame header, verifying its CRC-8.
pub fn read_frame_header<R: io::Read>(input: &mut R) -> Result<FrameHeader> {
    let mut crc_input = Crc8Reader::new(input);

    let sync_res_block = crc_input.read_u16::<BigEndian>()?;

    let sync_code = sync_res_block & 0b1111_1111_1111_1100;
    if sync_code != 0b1111_1111_1111_1000 {
        return Err(Error::MissingFrameSyncCode);
    }
    if sync_res_block & 0b0000_0000_0000_0010 != 0 {
        return Err(Error::InvalidFrameHeader("reserved bit set"));
    }

    let blocking_strategy = if sync_res_block & 1 == 0 {
        BlockingStrategy::Fixed
    } else {
        BlockingStrategy::Variable
    };

    let bs_sr = crc_input.read_u8()?;
    let mut block_size = 0u16;
    let mut read_8bit_bs = false;
    let mut read_16bit_bs = false;

    match bs_sr >> 4 {
        0b0000 => return Err(Error::InvalidFrameHeader("reserved block size code")),
        0b0001 => block_size = 192,
        n if (0b0010..=0b0101).contains(&n) => block_size = 576 * (1 << (n - 2) as usize),
        0b0110 => read_8bit_bs = true,
        0b0111 => read_16bit_bs = true,
        n => block_size = 256 * (1 << (n - 8) as usize),
    }

    let mut sample_rate = None;
    let mut read_8bit_sr = false;
    let mut read_16bit_sr = false;
    let mut read_16bit_sr_ten = false;

    match bs_sr & 0b0000_1111 {
        0b0000 => sample_rate = None,
        0b0001 => sample_rate = Some(88_200),
        0b0010 => sample_rate = Some(176_400),
        0b0011 => sample_rate = Some(192_000),
        0b0100 => sample_rate = Some(8_000),
        0b0101 => sample_rate = Some(16_000),
        0b0110 => sample_rate = Some(22_050),
        0b0111 => sample_rate = Some(24_000),
        0b1000 => sample_rate = Some(32_000),
        0b1001 => sample_rate = Some(44_100),
        0b1010 => sample_rate = Some(48_000),
        0b1011 => sample_rate = Some(96_000),
        0b1100 => read_8bit_sr = true,
        0b1101 => read_16bit_sr = true,
        0b1110 => read_16bit_sr_ten = true,
        _ => return Err(Error::InvalidFrameHeader("reserved sample rate code")),
    }

    let chan_bps_res = crc_input.read_u8()?;

    let channel_assignment = match chan_bps_res >> 4 {
        n if n < 8 => ChannelAssignment::Independent(n + 1),
        0b1000 => ChannelAssignment::LeftSideStereo,
        0b1001 => ChannelAssignment::RightSideStereo,
        0b1010 => ChannelAssignment::MidSideStereo,
        _ => return Err(Error::InvalidFrameHeader("reserved channel assignment")),
    };

    let bits_per_sample = match (chan_bps_res & 0b0000_1110) >> 1 {
        0b000 => None,
        0b001 => Some(8),
        0b010 => Some(12),
        0b100 => Some(16),
        0b101 => Some(20),
        0b110 => Some(24),
        _ => return Err(Error::InvalidFrameHeader("reserved bits-per-sample code")),
    };

    if chan_bps_res & 1 != 0 {
        return Err(Error::InvalidFrameHeader("reserved bit set"));
    }

    let block_time = match blocking_strategy {
        BlockingStrategy::Variable => BlockTime::SampleNumber(read_var_length_int(&mut crc_input)?),
        BlockingStrategy::Fixed => {
            let frame = read_var_length_int(&mut crc_input)?;
            if frame > 0x7fff_ffff {
                return Err(Error::InvalidFrameHeader("frame number too large"));
            }
            BlockTime::FrameNumber(frame as u32)
        }
    };

    if read_8bit_bs {
        block_size = crc_input.read_u8()? as u16 + 1;
    }
    if read_16bit_bs {
        let bs = crc_input.read_u16::<BigEndian>()?;
        if bs == 0xffff {
            return Err(Error::InvalidBlockSize);
        }
        block_size = bs + 1;
    }
    if block_size < 16 {
        return Err(Error::InvalidBlockSize);
    }

    if read_8bit_sr {
        sample_rate = Some(crc_input.read_u8()? as u32);
    }
    if read_16bit_sr {
        sample_rate = Some(crc_input.read_u16::<BigEndian>()? as u32);
    }
    if read_16bit_sr_ten {
        sample_rate = Some(crc_input.read_u16::<BigEndian>()? as u32 * 10);
    }

    let computed_crc = crc_input.crc();
    let presumed_crc = crc_input.read_u8()?;
    if computed_crc != presumed_crc {
        return Err(Error::FrameHeaderCrcMismatch);
    }

    Ok(FrameHeader { block_time, block_size, sample_rate, channel_assignment, bits_per_sample })
}

/// Writes a frame header and computes its CRC-8.
pub fn write_frame_header<W: io::Write>(output: &mut W, header: &FrameHeader) -> Result<()> {
    let mut crc_output = Crc8Writer::new(output);

    let blocking_bit = match header.block_time {
        BlockTime::FrameNumber(_) => 0u16,
        BlockTime::SampleNumber(_) => 1u16,
    };
    crc_output.write_u16::<BigEndian>(0b1111_1111_1111_1000 | blocking_bit)?;

    let (bs_code, bs_trailer): (u8, Option<(u32, bool)>) = block_size_code(header.block_size);
    let (sr_code, sr_trailer) = sample_rate_code(header.sample_rate);

    crc_output.write_u8((bs_code << 4) | sr_code)?;
    crc_output.write_u8((header.channel_assignment.to_bits() << 4) | (bps_code(header.bits_per_sample) << 1))?;

    match header.block_time {
        BlockTime::FrameNumber(n) => write_var_length_int(&mut crc_output, n as u64)?,
        BlockTime::SampleNumber(n) => write_var_length_int(&mut crc_output, n)?,
    }

    if let Some((value, is_16bit)) = bs_trailer {
        if is_16bit {
            crc_output.write_u16::<BigEndian>(value as u16)?;
        } else {
            crc_output.write_u8(value as u8)?;
        }
    }

    if let Some(value) = sr_trailer {
        crc_output.write_u16::<BigEndian>(value)?;
    }

    let crc = crc_output.crc();
    crc_output.write_u8(crc)?;

    Ok(())
}

fn block_size_code(block_size: u16) -> (u8, Option<(u32, bool)>) {
    match block_size {
        192 => (0b0001, None),
        576 | 1152 | 2304 | 4608 => {
            let n = 2 + (block_size / 576).trailing_zeros() as u8;
            (n, None)
        }
        256 | 512 | 1024 | 2048 | 4096 | 8192 | 16384 | 32768 => {
            let n = 8 + (block_size / 256).trailing_zeros() as u8;
            (n, None)
        }
        n if n <= 256 => (0b0110, Some((n as u32 - 1, false))),
        n => (0b0111, Some((n as u32 - 1, true))),
    }
}

fn sample_rate_code(sample_rate: Option<u32>) -> (u8, Option<u16>) {
    match sample_rate {
        None => (0b0000, None),
        Some(88_200) => (0b0001, None),
        Some(176_400) => (0b0010, None),
        Some(192_000) => (0b0011, None),
        Some(8_000) => (0b0100, None),
        Some(16_000) => (0b0101, None),
        Some(22_050) => (0b0110, None),
        Some(24_000) => (0b0111, None),
        Some(32_000) => (0b1000, None),
        Some(44_100) => (0b1001, None),
        Some(48_000) => (0b1010, None),
        Some(96_000) => (0b1011, None),
        Some(hz) if hz % 10 == 0 && hz / 10 <= 0xffff => (0b1110, Some((hz / 10) as u16)),
        Some(hz) if hz <= 0xff => (0b1100, Some(hz as u16)),
        Some(hz) => (0b1101, Some(hz as u16)),
    }
}

fn bps_code(bps: Option<u8>) -> u8 {
    match bps {
        None => 0b000,
        Some(8) => 0b001,
        Some(12) => 0b010,
        Some(16) => 0b100,
        Some(20) => 0b101,
        Some(24) => 0b110,
        Some(_) => 0b000,
    }
}

/// Decodes one frame's subframes into `channels`, applying the stereo
/// decorrelation named by `header.channel_assignment`. `channels[i].len()`
/// must equal `header.block_size` for every `i`, and `bps` is the effective
/// bits per sample (from the header, or falling back to STREAMINFO).
pub fn read_frame_subframes<R: io::Read>(
    input: &mut R,
    header: &FrameHeader,
    bps: u32,
    channels: &mut [Vec<i32>],
) -> Result<()> {
    let bs = header.block_size as usize;
    let mut reader = BitReader::new(input);

    match header.channel_assignment {
        ChannelAssignment::Independent(n_ch) => {
            for ch in 0..n_ch as usize {
                subframe::decode_subframe(&mut reader, bps, bs, &mut channels[ch])?;
            }
        }
        ChannelAssignment::LeftSideStereo => {
            subframe::decode_subframe(&mut reader, bps, bs, &mut channels[0])?;
            subframe::decode_subframe(&mut reader, bps + 1, bs, &mut channels[1])?;
            let (left, side) = channels.split_at_mut(1);
            let mut right = vec![0i32; bs];
            sample::decode_left_side(&left[0], &side[0], &mut right);
            channels[1] = right;
        }
        ChannelAssignment::RightSideStereo => {
            subframe::decode_subframe(&mut reader, bps + 1, bs, &mut channels[0])?;
            subframe::decode_subframe(&mut reader, bps, bs, &mut channels[1])?;
            let (side, right) = channels.split_at_mut(1);
            let mut left = vec![0i32; bs];
            sample::decode_right_side(&right[0], &side[0], &mut left);
            channels[0] = left;
        }
        ChannelAssignment::MidSideStereo => {
            subframe::decode_subframe(&mut reader, bps, bs, &mut channels[0])?;
            subframe::decode_subframe(&mut reader, bps + 1, bs, &mut channels[1])?;
            let mid = channels[0].clone();
            let side = channels[1].clone();
            sample::decode_mid_side(&mid, &side, &mut channels[0], &mut channels[1]);
        }
    }

    Ok(())
}

/// Writes the already-decorrelated, already-planned subframes of one frame,
/// in coded-channel order, and pads the result to a byte boundary. The
/// caller is responsible for decorrelation (see [`sample::encode_left_side`]
/// and friends) and for planning each coded channel with [`subframe::plan_subframe`].
pub fn write_frame_subframes<W: io::Write>(output: &mut W, plans: &[subframe::SubframePlan]) -> Result<()> {
    let mut writer = BitWriter::new(output);
    for plan in plans {
        subframe::write_subframe(&mut writer, plan)?;
    }
    writer.zero_pad_to_byte_boundary()?;
    Ok(())
}
