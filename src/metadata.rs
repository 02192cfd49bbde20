// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Metadata blocks at the start of a FLAC stream: the mandatory STREAMINFO
//! block plus the ambient PADDING, APPLICATION, SEEKTABLE, VORBIS_COMMENT,
//! CUESHEET and PICTURE blocks.
//!
//! VORBIS_COMMENT, CUESHEET and PICTURE bodies are kept as opaque byte blobs:
//! this crate does not parse tags, cue points, or embedded images, but it
//! preserves their bytes so a reader that only cares about the audio can
//! still round-trip a stream that has them.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;

use crate::error::{Error, Result};

/// The different kinds of metadata block defined by the FLAC format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum BlockType {
    StreamInfo,
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    /// A block type not defined by this crate's FLAC version; `u8` is the raw
    /// 7-bit type code, preserved so the block can be round-tripped.
    Reserved(u8),
}

impl BlockType {
    fn to_u8(self) -> u8 {
        match self {
            BlockType::StreamInfo => 0,
            BlockType::Padding => 1,
            BlockType::Application => 2,
            BlockType::SeekTable => 3,
            BlockType::VorbisComment => 4,
            BlockType::CueSheet => 5,
            BlockType::Picture => 6,
            BlockType::Reserved(n) => n,
        }
    }

    fn from_u8(n: u8) -> Result<BlockType> {
        Ok(match n {
            0 => BlockType::StreamInfo,
            1 => BlockType::Padding,
            2 => BlockType::Application,
            3 => BlockType::SeekTable,
            4 => BlockType::VorbisComment,
            5 => BlockType::CueSheet,
            6 => BlockType::Picture,
            127 => return Err(Error::InvalidMetadataBlockType),
            n => BlockType::Reserved(n),
        })
    }
}

/// A metadata block header: whether it is the last one, its type, and the
/// length in bytes of the body that follows.
#[derive(Clone, Copy)]
pub struct BlockHeader {
    pub is_last: bool,
    pub block_type: BlockType,
    pub length: u32,
}

/// Reads a metadata block header.
pub fn read_block_header<R: io::Read>(input: &mut R) -> Result<BlockHeader> {
    let byte = input.read_u8()?;
    let is_last = (byte >> 7) == 1;
    let block_type = BlockType::from_u8(byte & 0b0111_1111)?;
    let length = input.read_uint::<BigEndian>(3)? as u32;

    if block_type == BlockType::StreamInfo && length != 34 {
        return Err(Error::InvalidMetadataBlockLength);
    }

    Ok(BlockHeader { is_last, block_type, length })
}

/// Writes a metadata block header.
pub fn write_block_header<W: io::Write>(output: &mut W, header: &BlockHeader) -> Result<()> {
    let byte = (if header.is_last { 0x80 } else { 0 }) | header.block_type.to_u8();
    output.write_u8(byte)?;
    output.write_uint::<BigEndian>(header.length as u64, 3)?;
    Ok(())
}

/// The streaminfo metadata block, with technical information about the stream.
///
/// Every FLAC stream starts with exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    /// The minimum block size (in inter-channel samples) used in the stream.
    pub min_block_size: u16,
    /// The maximum block size (in inter-channel samples) used in the stream.
    pub max_block_size: u16,
    /// The minimum frame size in bytes, if known.
    pub min_frame_size: Option<u32>,
    /// The maximum frame size in bytes, if known.
    pub max_frame_size: Option<u32>,
    /// The sample rate in Hz.
    pub sample_rate: u32,
    /// The number of channels.
    pub channels: u32,
    /// The number of bits per sample.
    pub bits_per_sample: u32,
    /// The total number of inter-channel samples in the stream, if known.
    pub samples: Option<u64>,
    /// MD5 signature of the unencoded audio data.
    pub md5sum: [u8; 16],
}

/// Reads a STREAMINFO block body (34 bytes).
pub fn read_streaminfo_block<R: io::Read>(input: &mut R) -> Result<StreamInfo> {
    let min_block_size = input.read_u16::<BigEndian>()?;
    let max_block_size = input.read_u16::<BigEndian>()?;

    let min_frame_size = input.read_uint::<BigEndian>(3)? as u32;
    let max_frame_size = input.read_uint::<BigEndian>(3)? as u32;

    let sample_rate_msb = input.read_u16::<BigEndian>()?;
    let sample_rate_lsb = input.read_u8()?;
    let sample_rate = (sample_rate_msb as u32) << 4 | (sample_rate_lsb as u32) >> 4;

    let n_channels_bps = sample_rate_lsb;
    let n_channels = ((n_channels_bps >> 1) & 0b0000_0111) + 1;

    let bps_msb = n_channels_bps & 1;
    let bps_lsb_n_samples = input.read_u8()?;
    let bits_per_sample = (bps_msb << 4 | (bps_lsb_n_samples >> 4)) + 1;

    let n_samples_msb = bps_lsb_n_samples & 0b0000_1111;
    let n_samples_lsb = input.read_u32::<BigEndian>()?;
    let n_samples = (n_samples_msb as u64) << 32 | n_samples_lsb as u64;

    let mut md5sum = [0u8; 16];
    input.read_exact(&mut md5sum)?;

    if min_block_size > max_block_size {
        return Err(Error::InconsistentBounds);
    }
    if min_block_size < 16 {
        return Err(Error::InvalidBlockSize);
    }
    if min_frame_size > max_frame_size && max_frame_size != 0 {
        return Err(Error::InconsistentBounds);
    }
    if sample_rate == 0 || sample_rate > 655_350 {
        return Err(Error::InvalidSampleRate);
    }

    Ok(StreamInfo {
        min_block_size,
        max_block_size,
        min_frame_size: if min_frame_size == 0 { None } else { Some(min_frame_size) },
        max_frame_size: if max_frame_size == 0 { None } else { Some(max_frame_size) },
        sample_rate,
        channels: n_channels as u32,
        bits_per_sample: bits_per_sample as u32,
        samples: if n_samples == 0 { None } else { Some(n_samples) },
        md5sum,
    })
}

/// Writes a STREAMINFO block body (34 bytes).
pub fn write_streaminfo_block<W: io::Write>(output: &mut W, info: &StreamInfo) -> Result<()> {
    output.write_u16::<BigEndian>(info.min_block_size)?;
    output.write_u16::<BigEndian>(info.max_block_size)?;
    output.write_uint::<BigEndian>(info.min_frame_size.unwrap_or(0) as u64, 3)?;
    output.write_uint::<BigEndian>(info.max_frame_size.unwrap_or(0) as u64, 3)?;

    let sample_rate = info.sample_rate & 0x000f_ffff;
    let channels_m1 = (info.channels - 1) & 0b111;
    let bps_m1 = (info.bits_per_sample - 1) & 0b1_1111;
    let samples = info.samples.unwrap_or(0) & 0xf_ffff_ffff;

    output.write_u16::<BigEndian>((sample_rate >> 4) as u16)?;
    let byte0 = ((sample_rate & 0xf) << 4) as u8 | (channels_m1 << 1) as u8 | ((bps_m1 >> 4) & 1) as u8;
    output.write_u8(byte0)?;
    let byte1 = ((bps_m1 & 0xf) << 4) as u8 | ((samples >> 32) & 0xf) as u8;
    output.write_u8(byte1)?;
    output.write_u32::<BigEndian>((samples & 0xffff_ffff) as u32)?;
    output.write_all(&info.md5sum)?;

    Ok(())
}

/// Length in bytes of an encoded STREAMINFO block body.
pub const STREAMINFO_LENGTH: u32 = 34;

/// The body of an APPLICATION block: a registered 4-byte id plus arbitrary
/// application-defined data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationBlock {
    pub id: u32,
    pub data: Vec<u8>,
}

/// Reads an APPLICATION block body of `length` bytes (including the 4-byte id).
pub fn read_application_block<R: io::Read>(input: &mut R, length: u32) -> Result<ApplicationBlock> {
    let id = input.read_u32::<BigEndian>()?;
    let mut data = vec![0u8; length.saturating_sub(4) as usize];
    input.read_exact(&mut data)?;
    Ok(ApplicationBlock { id, data })
}

/// Writes an APPLICATION block body.
pub fn write_application_block<W: io::Write>(output: &mut W, block: &ApplicationBlock) -> Result<()> {
    output.write_u32::<BigEndian>(block.id)?;
    output.write_all(&block.data)?;
    Ok(())
}

/// A sentinel `sample_number` marking a placeholder seek point, reserved for
/// encoders that want to allocate seek table space before knowing its values.
pub const PLACEHOLDER_SAMPLE_NUMBER: u64 = 0xffff_ffff_ffff_ffff;

/// One entry of a SEEKTABLE block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeekPoint {
    /// Sample number of the first sample in the target frame, or
    /// [`PLACEHOLDER_SAMPLE_NUMBER`] for a placeholder point.
    pub sample_number: u64,
    /// Byte offset of the target frame's header from the first frame's header.
    pub stream_offset: u64,
    /// Number of samples in the target frame.
    pub frame_samples: u16,
}

/// A SEEKTABLE block body: a sequence of fixed-size seek points.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeekTable {
    pub points: Vec<SeekPoint>,
}

const SEEK_POINT_LEN: u32 = 18;

/// Reads a SEEKTABLE block body of `length` bytes.
pub fn read_seektable_block<R: io::Read>(input: &mut R, length: u32) -> Result<SeekTable> {
    if length % SEEK_POINT_LEN != 0 {
        return Err(Error::UnparseableStream("seektable length is not a multiple of 18"));
    }
    let n_points = length / SEEK_POINT_LEN;
    let mut points = Vec::with_capacity(n_points as usize);
    for _ in 0..n_points {
        let sample_number = input.read_u64::<BigEndian>()?;
        let stream_offset = input.read_u64::<BigEndian>()?;
        let frame_samples = input.read_u16::<BigEndian>()?;
        points.push(SeekPoint { sample_number, stream_offset, frame_samples });
    }
    Ok(SeekTable { points })
}

/// Writes a SEEKTABLE block body.
pub fn write_seektable_block<W: io::Write>(output: &mut W, table: &SeekTable) -> Result<()> {
    for point in &table.points {
        output.write_u64::<BigEndian>(point.sample_number)?;
        output.write_u64::<BigEndian>(point.stream_offset)?;
        output.write_u16::<BigEndian>(point.frame_samples)?;
    }
    Ok(())
}

/// Length in bytes of an encoded SEEKTABLE block body with `n` points.
pub fn seektable_length(n: usize) -> u32 {
    n as u32 * SEEK_POINT_LEN
}

/// Reads and discards `length` bytes of a block this crate does not interpret.
fn skip_block<R: io::Read>(input: &mut R, length: u32) -> Result<()> {
    let mut remaining = length as u64;
    let mut buf = [0u8; 1024];
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        input.read_exact(&mut buf[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}

/// Reads `length` raw bytes, for block types whose body is kept opaque.
fn read_opaque<R: io::Read>(input: &mut R, length: u32) -> Result<Vec<u8>> {
    let mut data = vec![0u8; length as usize];
    input.read_exact(&mut data)?;
    Ok(data)
}

/// A fully-parsed metadata block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataBlock {
    StreamInfo(StreamInfo),
    Padding(u32),
    Application(ApplicationBlock),
    SeekTable(SeekTable),
    /// Preserved verbatim; this crate does not parse Vorbis comments.
    VorbisComment(Vec<u8>),
    /// Preserved verbatim; this crate does not parse cue sheets.
    CueSheet(Vec<u8>),
    /// Preserved verbatim; this crate does not parse embedded pictures.
    Picture(Vec<u8>),
    /// A block of a type this crate's FLAC version does not define, preserved
    /// verbatim along with its raw type code.
    Reserved(u8, Vec<u8>),
}

/// Reads a metadata block header and its body, dispatching on the header's
/// declared type.
pub fn read_metadata_block<R: io::Read>(input: &mut R, header: &BlockHeader) -> Result<MetadataBlock> {
    Ok(match header.block_type {
        BlockType::StreamInfo => MetadataBlock::StreamInfo(read_streaminfo_block(input)?),
        BlockType::Padding => {
            skip_block(input, header.length)?;
            MetadataBlock::Padding(header.length)
        }
        BlockType::Application => MetadataBlock::Application(read_application_block(input, header.length)?),
        BlockType::SeekTable => MetadataBlock::SeekTable(read_seektable_block(input, header.length)?),
        BlockType::VorbisComment => MetadataBlock::VorbisComment(read_opaque(input, header.length)?),
        BlockType::CueSheet => MetadataBlock::CueSheet(read_opaque(input, header.length)?),
        BlockType::Picture => MetadataBlock::Picture(read_opaque(input, header.length)?),
        BlockType::Reserved(n) => MetadataBlock::Reserved(n, read_opaque(input, header.length)?),
    })
}

/// Writes a metadata block, header and body, marking it as the last block iff
/// `is_last`.
pub fn write_metadata_block<W: io::Write>(output: &mut W, block: &MetadataBlock, is_last: bool) -> Result<()> {
    let (block_type, length) = match block {
        MetadataBlock::StreamInfo(_) => (BlockType::StreamInfo, STREAMINFO_LENGTH),
        MetadataBlock::Padding(n) => (BlockType::Padding, *n),
        MetadataBlock::Application(a) => (BlockType::Application, 4 + a.data.len() as u32),
        MetadataBlock::SeekTable(t) => (BlockType::SeekTable, seektable_length(t.points.len())),
        MetadataBlock::VorbisComment(d) => (BlockType::VorbisComment, d.len() as u32),
        MetadataBlock::CueSheet(d) => (BlockType::CueSheet, d.len() as u32),
        MetadataBlock::Picture(d) => (BlockType::Picture, d.len() as u32),
        MetadataBlock::Reserved(n, d) => (BlockType::Reserved(*n), d.len() as u32),
    };
    write_block_header(output, &BlockHeader { is_last, block_type, length })?;
    match block {
        MetadataBlock::StreamInfo(info) => write_streaminfo_block(output, info)?,
        MetadataBlock::Padding(n) => {
            for _ in 0..*n {
                output.write_u8(0)?;
            }
        }
        MetadataBlock::Application(a) => write_application_block(output, a)?,
        MetadataBlock::SeekTable(t) => write_seektable_block(output, t)?,
        MetadataBlock::VorbisComment(d) | MetadataBlock::CueSheet(d) | MetadataBlock::Picture(d) => {
            output.write_all(d)?;
        }
        MetadataBlock::Reserved(_, d) => output.write_all(d)?,
    }
    Ok(())
}

/// An iterator over the metadata block chain at the start of a FLAC stream,
/// yielding one [`MetadataBlock`] at a time until the block marked `is_last`
/// has been read.
pub struct MetadataBlockReader<'r, R: io::Read + 'r> {
    reader: &'r mut R,
    done: bool,
}

impl<'r, R: io::Read> MetadataBlockReader<'r, R> {
    pub fn new(reader: &'r mut R) -> MetadataBlockReader<'r, R> {
        MetadataBlockReader { reader, done: false }
    }
}

impl<'r, R: io::Read> Iterator for MetadataBlockReader<'r, R> {
    type Item = Result<MetadataBlock>;

    fn next(&mut self) -> Option<Result<MetadataBlock>> {
        if self.done {
            return None;
        }
        let header = match read_block_header(self.reader) {
            Ok(h) => h,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        self.done = header.is_last;
        Some(read_metadata_block(self.reader, &header))
    }
}
