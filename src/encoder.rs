// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! The stream encoder: buffers incoming samples into fixed-size blocks, picks
//! a stereo decorrelation and a subframe model for each channel, and writes
//! out frames as they fill.

use byteorder::{BigEndian, WriteBytesExt};
use std::io;

use crate::crc;
use crate::error::{Error, Result};
use crate::frame::{self, BlockTime, ChannelAssignment, FrameHeader};
use crate::md5::{self, Md5Accumulator};
use crate::metadata::{self, MetadataBlock, StreamInfo};
use crate::sample;
use crate::subframe;

/// Byte offset of the STREAMINFO block body: past the 4-byte `fLaC` magic and
/// the 4-byte metadata block header.
const STREAMINFO_BODY_OFFSET: u64 = 8;

/// Configuration for an [`Encoder`]: the stream's technical parameters plus
/// the per-subframe model search settings.
#[derive(Clone, Debug)]
pub struct EncoderSettings {
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    pub block_size: u32,
    /// Restricts settings to those the streamable subset allows, so a decoder
    /// with no STREAMINFO (e.g. one tuning in to an internet radio stream
    /// mid-broadcast) can still decode every frame.
    pub streamable_subset: bool,
    /// Tries mid/side decorrelation for 2-channel input. Silently has no
    /// effect at `bits_per_sample == 32`, where the side channel would need
    /// 33 bits and can't be represented in a subframe sample.
    pub do_mid_side_stereo: bool,
    /// Instead of comparing all four stereo layouts every block, reuse the
    /// last choice for a run of blocks before re-evaluating. The cadence
    /// (`sample_rate * 0.4 / block_size` blocks) is carried over verbatim
    /// from the reference encoder's heuristic; it has no independent
    /// justification and is kept only for behavioral compatibility.
    pub loose_mid_side_stereo: bool,
    /// Hint for progress reporting; does not affect the encoded bitstream.
    pub total_samples_estimate: u64,
    /// Extra metadata blocks to emit between STREAMINFO and the first frame.
    /// Must not include another STREAMINFO block.
    pub extra_metadata: Vec<MetadataBlock>,
    pub subframe: subframe::EncodeSettings,
}

impl Default for EncoderSettings {
    fn default() -> EncoderSettings {
        EncoderSettings {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
            block_size: 4096,
            streamable_subset: false,
            do_mid_side_stereo: true,
            loose_mid_side_stereo: false,
            total_samples_estimate: 0,
            extra_metadata: Vec::new(),
            subframe: subframe::EncodeSettings::default(),
        }
    }
}

impl EncoderSettings {
    /// Checks that every field is within the range the format allows.
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 || self.channels > 8 {
            return Err(Error::InvalidSetting("channel count must be between 1 and 8"));
        }
        if self.bits_per_sample < 4 || self.bits_per_sample > 32 {
            return Err(Error::InvalidSetting("bits per sample must be between 4 and 32"));
        }
        if self.block_size < 16 || self.block_size > 65535 {
            return Err(Error::InvalidSetting("block size must be between 16 and 65535"));
        }
        if self.sample_rate == 0 || self.sample_rate > 655_350 {
            return Err(Error::InvalidSetting("sample rate must be between 1 and 655350"));
        }
        if self.subframe.max_lpc_order as usize > crate::lpc::MAX_LPC_ORDER {
            return Err(Error::InvalidSetting("max lpc order exceeds 32"));
        }
        if self.subframe.max_lpc_order >= self.block_size {
            return Err(Error::BlockSizeTooSmallForLpcOrder);
        }
        for block in &self.extra_metadata {
            if matches!(block, MetadataBlock::StreamInfo(_)) {
                return Err(Error::InvalidSetting("extra_metadata may not contain a STREAMINFO block"));
            }
        }
        if self.streamable_subset {
            if !matches!(self.bits_per_sample, 8 | 12 | 16 | 20 | 24) {
                return Err(Error::InvalidSetting(
                    "streamable subset requires bits_per_sample in {8, 12, 16, 20, 24}",
                ));
            }
            let max_block_size = if self.sample_rate <= 48_000 { 4608 } else { 16384 };
            if self.block_size > max_block_size {
                return Err(Error::InvalidSetting("block size too large for the streamable subset"));
            }
            if self.sample_rate <= 48_000 && self.subframe.max_lpc_order > 12 {
                return Err(Error::InvalidSetting("lpc order too large for the streamable subset at this sample rate"));
            }
        }
        Ok(())
    }
}

/// Encodes interleaved or per-channel audio into a FLAC stream.
///
/// Samples are buffered internally until a full block accumulates, at which
/// point the block is encoded and written immediately; [`finish`](Self::finish)
/// flushes whatever is left as a final, possibly shorter, block.
pub struct Encoder<W: io::Write> {
    writer: W,
    settings: EncoderSettings,
    buffer: Vec<Vec<i32>>,
    frame_number: u32,
    total_samples: u64,
    min_frame_size: u32,
    max_frame_size: u32,
    md5: Md5Accumulator,
    /// Loose mid/side stereo bookkeeping: the assignment chosen last time the
    /// four layouts were fully compared, and how many more blocks may reuse
    /// it before the next full comparison.
    loose_ms_choice: Option<ChannelAssignment>,
    loose_ms_countdown: u32,
}

impl<W: io::Write> Encoder<W> {
    /// Creates an encoder, writing the stream magic and a placeholder
    /// STREAMINFO block immediately. The placeholder's sample count, frame
    /// size bounds, and MD5 signature are filled in with final values only by
    /// [`finish_seekable`](Encoder::finish_seekable); a plain [`finish`](Self::finish)
    /// leaves them as written here, since rewriting them requires seeking
    /// back to the start of the stream.
    pub fn new(mut writer: W, settings: EncoderSettings) -> Result<Encoder<W>> {
        settings.validate()?;
        writer.write_all(b"fLaC")?;

        let placeholder = StreamInfo {
            min_block_size: settings.block_size as u16,
            max_block_size: settings.block_size as u16,
            min_frame_size: None,
            max_frame_size: None,
            sample_rate: settings.sample_rate,
            channels: settings.channels,
            bits_per_sample: settings.bits_per_sample,
            samples: if settings.total_samples_estimate == 0 { None } else { Some(settings.total_samples_estimate) },
            md5sum: [0u8; 16],
        };
        let no_extra_metadata = settings.extra_metadata.is_empty();
        metadata::write_metadata_block(&mut writer, &MetadataBlock::StreamInfo(placeholder), no_extra_metadata)?;
        let last_extra = settings.extra_metadata.len().saturating_sub(1);
        for (i, block) in settings.extra_metadata.iter().enumerate() {
            metadata::write_metadata_block(&mut writer, block, i == last_extra)?;
        }

        let n_channels = settings.channels as usize;
        let block_size = settings.block_size as usize;
        Ok(Encoder {
            writer,
            buffer: vec![Vec::with_capacity(block_size); n_channels],
            frame_number: 0,
            total_samples: 0,
            min_frame_size: u32::MAX,
            max_frame_size: 0,
            md5: Md5Accumulator::new(),
            loose_ms_choice: None,
            loose_ms_countdown: 0,
            settings,
        })
    }

    /// Buffers one block of per-channel samples, encoding and writing out
    /// whole blocks as they accumulate. `channels.len()` must equal the
    /// configured channel count, and every channel must have the same length.
    pub fn process(&mut self, channels: &[Vec<i32>]) -> Result<()> {
        if channels.len() != self.buffer.len() {
            return Err(Error::InvalidSetting("channel count does not match the configured channel count"));
        }
        let n = channels[0].len();
        if channels.iter().any(|c| c.len() != n) {
            return Err(Error::InvalidSetting("all channels must have the same length"));
        }
        for i in 0..n {
            for (buf, channel) in self.buffer.iter_mut().zip(channels.iter()) {
                buf.push(channel[i]);
            }
            if self.buffer[0].len() == self.settings.block_size as usize {
                self.encode_and_write_block()?;
            }
        }
        Ok(())
    }

    /// Buffers interleaved samples (`left, right, left, right, ...` for
    /// stereo), encoding and writing out whole blocks as they accumulate.
    pub fn process_interleaved(&mut self, interleaved: &[i32]) -> Result<()> {
        let n_channels = self.buffer.len();
        if interleaved.len() % n_channels != 0 {
            return Err(Error::InvalidSetting("interleaved buffer length is not a multiple of the channel count"));
        }
        for frame in interleaved.chunks(n_channels) {
            for (buf, &sample) in self.buffer.iter_mut().zip(frame.iter()) {
                buf.push(sample);
            }
            if self.buffer[0].len() == self.settings.block_size as usize {
                self.encode_and_write_block()?;
            }
        }
        Ok(())
    }

    /// Plans one coded channel (left, right, mid or side) under `assignment`.
    fn plan_channel(
        &self,
        assignment: ChannelAssignment,
        slot: usize,
        mid: &[i32],
        side: &[i32],
    ) -> subframe::SubframePlan {
        let bps = self.settings.bits_per_sample;
        let settings = &self.settings.subframe;
        match (assignment, slot) {
            (ChannelAssignment::LeftSideStereo, 0) => subframe::plan_subframe(&self.buffer[0], bps, settings),
            (ChannelAssignment::MidSideStereo, 0) => subframe::plan_subframe(mid, bps, settings),
            (ChannelAssignment::LeftSideStereo, 1) | (ChannelAssignment::RightSideStereo, 0) | (ChannelAssignment::MidSideStereo, 1) => {
                subframe::plan_subframe(side, bps + 1, settings)
            }
            (ChannelAssignment::RightSideStereo, 1) => subframe::plan_subframe(&self.buffer[1], bps, settings),
            (ChannelAssignment::Independent(_), 0) => subframe::plan_subframe(&self.buffer[0], bps, settings),
            (ChannelAssignment::Independent(_), _) => subframe::plan_subframe(&self.buffer[1], bps, settings),
        }
    }

    /// Picks the coded channel layout for the buffered stereo pair.
    ///
    /// When mid/side is disabled, or at 32 bits per sample (where the side
    /// channel would need 33 bits to represent), only independent coding is
    /// considered. Otherwise all four layouts are planned and the cheapest
    /// kept, unless loose mid/side stereo is reusing a prior choice.
    fn choose_stereo_assignment(&mut self) -> (ChannelAssignment, Vec<subframe::SubframePlan>) {
        let bps = self.settings.bits_per_sample;
        let left = &self.buffer[0];
        let right = &self.buffer[1];
        let n = left.len();

        if !self.settings.do_mid_side_stereo || bps >= 32 {
            let settings = &self.settings.subframe;
            let left_plan = subframe::plan_subframe(left, bps, settings);
            let right_plan = subframe::plan_subframe(right, bps, settings);
            return (ChannelAssignment::Independent(2), vec![left_plan, right_plan]);
        }

        let mut mid = vec![0i64; n];
        let mut side = vec![0i64; n];
        sample::encode_mid_side(left, right, &mut mid, &mut side);
        let mid_narrow: Vec<i32> = mid.iter().map(|&m| m as i32).collect();
        let side_narrow: Vec<i32> = side.iter().map(|&s| s as i32).collect();

        if self.settings.loose_mid_side_stereo {
            if let Some(choice) = self.loose_ms_choice {
                if self.loose_ms_countdown > 0 {
                    self.loose_ms_countdown -= 1;
                    let plans = vec![
                        self.plan_channel(choice, 0, &mid_narrow, &side_narrow),
                        self.plan_channel(choice, 1, &mid_narrow, &side_narrow),
                    ];
                    return (choice, plans);
                }
            }
        }

        let settings = &self.settings.subframe;
        let left_plan = subframe::plan_subframe(left, bps, settings);
        let right_plan = subframe::plan_subframe(right, bps, settings);
        let side_plan = subframe::plan_subframe(&side_narrow, bps + 1, settings);
        let mid_plan = subframe::plan_subframe(&mid_narrow, bps, settings);

        let independent_bits = left_plan.bits + right_plan.bits;
        let left_side_bits = left_plan.bits + side_plan.bits;
        let right_side_bits = right_plan.bits + side_plan.bits;
        let mid_side_bits = mid_plan.bits + side_plan.bits;

        let mut best_bits = independent_bits;
        let mut best = ChannelAssignment::Independent(2);
        if left_side_bits < best_bits {
            best_bits = left_side_bits;
            best = ChannelAssignment::LeftSideStereo;
        }
        if right_side_bits < best_bits {
            best_bits = right_side_bits;
            best = ChannelAssignment::RightSideStereo;
        }
        if mid_side_bits < best_bits {
            best = ChannelAssignment::MidSideStereo;
        }

        if self.settings.loose_mid_side_stereo {
            self.loose_ms_choice = Some(best);
            // The reference encoder's cadence: re-evaluate every
            // `sample_rate * 0.4 / block_size` blocks, at least one.
            let cadence = ((self.settings.sample_rate as f64 * 0.4) / self.settings.block_size as f64) as u32;
            self.loose_ms_countdown = cadence.max(1) - 1;
        }

        let plans = match best {
            ChannelAssignment::Independent(_) => vec![left_plan, right_plan],
            ChannelAssignment::LeftSideStereo => vec![left_plan, side_plan],
            ChannelAssignment::RightSideStereo => vec![right_plan, side_plan],
            ChannelAssignment::MidSideStereo => vec![mid_plan, side_plan],
        };
        (best, plans)
    }

    fn plan_frame(&mut self) -> (ChannelAssignment, Vec<subframe::SubframePlan>) {
        if self.buffer.len() == 2 {
            self.choose_stereo_assignment()
        } else {
            let bps = self.settings.bits_per_sample;
            let plans =
                self.buffer.iter().map(|c| subframe::plan_subframe(c, bps, &self.settings.subframe)).collect();
            (ChannelAssignment::Independent(self.buffer.len() as u8), plans)
        }
    }

    fn encode_and_write_block(&mut self) -> Result<()> {
        let block_size = self.buffer[0].len();
        if block_size == 0 {
            return Ok(());
        }
        let bps = self.settings.bits_per_sample;
        let (assignment, plans) = self.plan_frame();

        let header = FrameHeader {
            block_time: BlockTime::FrameNumber(self.frame_number),
            block_size: block_size as u16,
            sample_rate: None,
            channel_assignment: assignment,
            bits_per_sample: None,
        };

        let mut frame_buf = Vec::new();
        frame::write_frame_header(&mut frame_buf, &header)?;
        frame::write_frame_subframes(&mut frame_buf, &plans)?;
        let crc = crc::crc16(&frame_buf);
        frame_buf.write_u16::<BigEndian>(crc)?;

        self.writer.write_all(&frame_buf)?;

        let frame_len = frame_buf.len() as u32;
        self.min_frame_size = self.min_frame_size.min(frame_len);
        self.max_frame_size = self.max_frame_size.max(frame_len);

        self.md5.update_interleaved(&self.buffer, md5::bytes_per_sample(bps));
        self.total_samples += block_size as u64;
        self.frame_number += 1;
        for channel in self.buffer.iter_mut() {
            channel.clear();
        }
        Ok(())
    }

    /// Flushes any buffered samples as a final, possibly short, block and
    /// returns the underlying writer. The STREAMINFO block written at
    /// [`new`](Self::new) is left with placeholder sample count, frame size
    /// bounds, and MD5 signature; use [`finish_seekable`](Encoder::finish_seekable)
    /// on a [`io::Seek`]-capable writer to fill those in.
    pub fn finish(mut self) -> Result<W> {
        self.encode_and_write_block()?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Like [`finish`](Self::finish), but hands the final STREAMINFO values
    /// to `callback` instead of seeking back to rewrite them in place. For
    /// writers that cannot seek (a pipe, a network socket), this is the only
    /// way to recover the true sample count, frame size bounds, and MD5
    /// signature once encoding is done.
    pub fn finish_with_metadata<F: FnOnce(&StreamInfo)>(mut self, callback: F) -> Result<W> {
        self.encode_and_write_block()?;
        self.writer.flush()?;

        let digest = self.md5.finalize();
        let info = StreamInfo {
            min_block_size: self.settings.block_size as u16,
            max_block_size: self.settings.block_size as u16,
            min_frame_size: if self.min_frame_size == u32::MAX { None } else { Some(self.min_frame_size) },
            max_frame_size: if self.max_frame_size == 0 { None } else { Some(self.max_frame_size) },
            sample_rate: self.settings.sample_rate,
            channels: self.settings.channels,
            bits_per_sample: self.settings.bits_per_sample,
            samples: if self.total_samples == 0 { None } else { Some(self.total_samples) },
            md5sum: digest,
        };
        callback(&info);
        Ok(self.writer)
    }
}

impl<W: io::Write + io::Seek> Encoder<W> {
    /// Like [`finish`](Self::finish), but additionally seeks back and
    /// rewrites the STREAMINFO block with the final sample count, frame size
    /// bounds, and MD5 signature of the encoded audio.
    pub fn finish_seekable(mut self) -> Result<W> {
        self.encode_and_write_block()?;
        self.writer.flush()?;

        let digest = self.md5.finalize();
        let info = StreamInfo {
            min_block_size: self.settings.block_size as u16,
            max_block_size: self.settings.block_size as u16,
            min_frame_size: if self.min_frame_size == u32::MAX { None } else { Some(self.min_frame_size) },
            max_frame_size: if self.max_frame_size == 0 { None } else { Some(self.max_frame_size) },
            sample_rate: self.settings.sample_rate,
            channels: self.settings.channels,
            bits_per_sample: self.settings.bits_per_sample,
            samples: if self.total_samples == 0 { None } else { Some(self.total_samples) },
            md5sum: digest,
        };

        self.writer.seek(io::SeekFrom::Start(STREAMINFO_BODY_OFFSET))?;
        metadata::write_streaminfo_block(&mut self.writer, &info)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;
    use std::io::Cursor;

    #[test]
    fn mono_stream_roundtrips_through_the_decoder() {
        let samples: Vec<i32> = (0..500).map(|i| ((i * 37) % 200) - 100).collect();
        let settings =
            EncoderSettings { sample_rate: 8_000, channels: 1, bits_per_sample: 16, block_size: 128, ..Default::default() };
        let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
        encoder.process(&[samples.clone()]).unwrap();
        let cursor = encoder.finish_seekable().unwrap();

        let mut decoder = Decoder::new(cursor);
        let mut decoded = Vec::new();
        decoder
            .process_until_end_of_stream(
                |channels, _header| {
                    decoded.extend_from_slice(&channels[0]);
                    Ok(())
                },
                |_e| false,
            )
            .unwrap();
        decoder.finish().unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn stereo_stream_roundtrips_through_the_decoder() {
        let left: Vec<i32> = (0..1000).map(|i| (i % 300) - 150).collect();
        let right: Vec<i32> = (0..1000).map(|i| ((i * 3) % 300) - 150).collect();
        let settings =
            EncoderSettings { sample_rate: 44_100, channels: 2, bits_per_sample: 16, block_size: 256, ..Default::default() };
        let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
        encoder.process(&[left.clone(), right.clone()]).unwrap();
        let cursor = encoder.finish_seekable().unwrap();

        let mut decoder = Decoder::new(cursor);
        let mut decoded_left = Vec::new();
        let mut decoded_right = Vec::new();
        decoder
            .process_until_end_of_stream(
                |channels, _header| {
                    decoded_left.extend_from_slice(&channels[0]);
                    decoded_right.extend_from_slice(&channels[1]);
                    Ok(())
                },
                |_e| false,
            )
            .unwrap();
        decoder.finish().unwrap();
        assert_eq!(decoded_left, left);
        assert_eq!(decoded_right, right);
    }

    #[test]
    fn process_interleaved_matches_process() {
        let left: Vec<i32> = (0..64).map(|i| i - 32).collect();
        let right: Vec<i32> = (0..64).map(|i| 32 - i).collect();
        let mut interleaved = Vec::with_capacity(128);
        for i in 0..64 {
            interleaved.push(left[i]);
            interleaved.push(right[i]);
        }

        let settings =
            EncoderSettings { sample_rate: 8_000, channels: 2, bits_per_sample: 16, block_size: 64, ..Default::default() };
        let mut encoder = Encoder::new(Vec::new(), settings).unwrap();
        encoder.process_interleaved(&interleaved).unwrap();
        let bytes = encoder.finish().unwrap();

        let mut decoder = Decoder::new(Cursor::new(bytes));
        let mut decoded = (Vec::new(), Vec::new());
        decoder
            .process_until_end_of_stream(
                |channels, _header| {
                    decoded.0.extend_from_slice(&channels[0]);
                    decoded.1.extend_from_slice(&channels[1]);
                    Ok(())
                },
                |_e| false,
            )
            .unwrap();
        assert_eq!(decoded.0, left);
        assert_eq!(decoded.1, right);
    }

    #[test]
    fn rejects_mismatched_channel_count() {
        let settings = EncoderSettings { channels: 2, ..Default::default() };
        let mut encoder = Encoder::new(Vec::new(), settings).unwrap();
        let result = encoder.process(&[vec![1, 2, 3]]);
        assert!(matches!(result, Err(Error::InvalidSetting(_))));
    }

    #[test]
    fn rejects_invalid_settings() {
        let settings = EncoderSettings { channels: 0, ..Default::default() };
        assert!(matches!(settings.validate(), Err(Error::InvalidSetting(_))));

        let settings = EncoderSettings { block_size: 4, ..Default::default() };
        assert!(matches!(settings.validate(), Err(Error::InvalidSetting(_))));
    }

    #[test]
    fn finish_seekable_fills_in_final_streaminfo() {
        let samples: Vec<i32> = (0..300).map(|i| i % 50).collect();
        let settings =
            EncoderSettings { sample_rate: 8_000, channels: 1, bits_per_sample: 8, block_size: 64, ..Default::default() };
        let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
        encoder.process(&[samples.clone()]).unwrap();
        let cursor = encoder.finish_seekable().unwrap();

        let mut decoder = Decoder::new(cursor);
        decoder.process_until_end_of_metadata(|_| {}).unwrap();
        let info = decoder.streaminfo().unwrap();
        assert_eq!(info.samples, Some(samples.len() as u64));
        assert_ne!(info.md5sum, [0u8; 16]);
    }

    #[test]
    fn disabling_mid_side_stereo_always_codes_independent() {
        // Strongly correlated channels that mid/side would normally win on.
        let left: Vec<i32> = (0..512).map(|i| ((i * 11) % 400) - 200).collect();
        let right: Vec<i32> = left.iter().map(|&s| s + 1).collect();
        let settings = EncoderSettings {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
            block_size: 512,
            do_mid_side_stereo: false,
            ..Default::default()
        };
        let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
        encoder.buffer[0] = left;
        encoder.buffer[1] = right;
        let (assignment, _) = encoder.choose_stereo_assignment();
        assert_eq!(assignment, ChannelAssignment::Independent(2));
    }

    #[test]
    fn mid_side_stereo_falls_back_to_independent_at_32_bits() {
        let left: Vec<i32> = (0..256).map(|i| (i * 131) - 128).collect();
        let right: Vec<i32> = left.iter().map(|&s| s + 2).collect();
        let settings = EncoderSettings {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 32,
            block_size: 256,
            do_mid_side_stereo: true,
            ..Default::default()
        };
        let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
        encoder.buffer[0] = left;
        encoder.buffer[1] = right;
        let (assignment, _) = encoder.choose_stereo_assignment();
        assert_eq!(assignment, ChannelAssignment::Independent(2));
    }

    #[test]
    fn loose_mid_side_stereo_reuses_the_last_choice() {
        let left: Vec<i32> = (0..64).map(|i| ((i * 17) % 90) - 45).collect();
        let right: Vec<i32> = left.iter().map(|&s| s + 3).collect();
        let settings = EncoderSettings {
            sample_rate: 8_000,
            channels: 2,
            bits_per_sample: 16,
            block_size: 64,
            do_mid_side_stereo: true,
            loose_mid_side_stereo: true,
            ..Default::default()
        };
        let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
        encoder.buffer[0] = left.clone();
        encoder.buffer[1] = right.clone();
        let (first, _) = encoder.choose_stereo_assignment();
        assert!(encoder.loose_ms_choice.is_some());

        encoder.buffer[0] = left;
        encoder.buffer[1] = right;
        let (second, _) = encoder.choose_stereo_assignment();
        assert_eq!(first, second);
    }

    #[test]
    fn extra_metadata_blocks_round_trip_through_the_decoder() {
        let padding = MetadataBlock::Padding(16);
        let settings = EncoderSettings {
            sample_rate: 8_000,
            channels: 1,
            bits_per_sample: 16,
            block_size: 64,
            extra_metadata: vec![padding],
            ..Default::default()
        };
        let mut encoder = Encoder::new(Cursor::new(Vec::new()), settings).unwrap();
        encoder.process(&[vec![0; 64]]).unwrap();
        let cursor = encoder.finish_seekable().unwrap();

        let mut decoder = Decoder::new(cursor);
        let mut saw_padding = false;
        decoder
            .process_until_end_of_metadata(|block| {
                if matches!(block, MetadataBlock::Padding(16)) {
                    saw_padding = true;
                }
            })
            .unwrap();
        assert!(saw_padding);
    }

    #[test]
    fn extra_metadata_rejects_a_streaminfo_block() {
        let settings = EncoderSettings {
            extra_metadata: vec![MetadataBlock::StreamInfo(StreamInfo {
                min_block_size: 16,
                max_block_size: 16,
                min_frame_size: None,
                max_frame_size: None,
                sample_rate: 44_100,
                channels: 2,
                bits_per_sample: 16,
                samples: None,
                md5sum: [0u8; 16],
            })],
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidSetting(_))));
    }

    #[test]
    fn streamable_subset_rejects_oversized_blocks() {
        let settings = EncoderSettings { streamable_subset: true, block_size: 8192, ..Default::default() };
        assert!(matches!(settings.validate(), Err(Error::InvalidSetting(_))));
    }

    #[test]
    fn streamable_subset_rejects_unsupported_bit_depth() {
        let settings = EncoderSettings { streamable_subset: true, bits_per_sample: 14, ..Default::default() };
        assert!(matches!(settings.validate(), Err(Error::InvalidSetting(_))));
    }

    #[test]
    fn finish_with_metadata_reports_final_streaminfo_without_seeking() {
        let samples: Vec<i32> = (0..200).map(|i| i % 40).collect();
        let settings =
            EncoderSettings { sample_rate: 8_000, channels: 1, bits_per_sample: 16, block_size: 64, ..Default::default() };
        let mut encoder = Encoder::new(Vec::new(), settings).unwrap();
        encoder.process(&[samples.clone()]).unwrap();

        let mut reported = None;
        let bytes = encoder.finish_with_metadata(|info| reported = Some(*info)).unwrap();
        let info = reported.unwrap();
        assert_eq!(info.samples, Some(samples.len() as u64));
        assert_ne!(info.md5sum, [0u8; 16]);

        // The STREAMINFO written to the stream itself is left as a
        // placeholder, since a non-seekable writer cannot be rewound.
        let mut decoder = Decoder::new(Cursor::new(bytes));
        decoder.process_until_end_of_metadata(|_| {}).unwrap();
        assert_eq!(decoder.streaminfo().unwrap().samples, None);
    }
}
