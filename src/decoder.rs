// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! The stream decoder: a small state machine that reads the stream header,
//! the metadata chain, and then frames one at a time, matching the states
//! (if not the callback-by-raw-pointer mechanics) of the reference decoder.

use byteorder::{BigEndian, ReadBytesExt};
use std::collections::VecDeque;
use std::io;

use crate::crc::Crc16Reader;
use crate::error::{Error, Result};
use crate::frame::{self, BlockTime, FrameHeader};
use crate::md5::{self, Md5Accumulator};
use crate::metadata::{self, MetadataBlock, StreamInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SearchForMetadata,
    ReadMetadata,
    SearchForFrameSync,
    EndOfStream,
}

/// Wraps a reader with an arbitrary-length pushback buffer, so frame sync
/// search can peek ahead without requiring [`io::Seek`].
struct PushbackReader<R> {
    inner: R,
    pending: VecDeque<u8>,
}

impl<R: io::Read> PushbackReader<R> {
    fn new(inner: R) -> PushbackReader<R> {
        PushbackReader { inner, pending: VecDeque::new() }
    }

    fn push_back(&mut self, bytes: &[u8]) {
        for &b in bytes.iter().rev() {
            self.pending.push_front(b);
        }
    }

    fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read + io::Seek> PushbackReader<R> {
    fn rewind(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.inner.seek(io::SeekFrom::Start(0))?;
        Ok(())
    }
}

impl<R: io::Read> io::Read for PushbackReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            return self.inner.read(buf);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.pending.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        if n == buf.len() {
            return Ok(n);
        }
        match self.inner.read(&mut buf[n..]) {
            Ok(m) => Ok(n + m),
            Err(e) if n > 0 => {
                let _ = e;
                Ok(n)
            }
            Err(e) => Err(e),
        }
    }
}

fn read_one_byte<R: io::Read>(reader: &mut PushbackReader<R>) -> Result<Option<u8>> {
    let mut b = [0u8; 1];
    match reader.read(&mut b)? {
        0 => Ok(None),
        _ => Ok(Some(b[0])),
    }
}

/// Scans forward for the 14-bit frame sync code followed by the two reserved
/// zero bits, leaving the matching two bytes in the pushback buffer so the
/// next read picks up the frame header from its start. Returns `false` at a
/// clean end of stream.
fn find_frame_sync<R: io::Read>(reader: &mut PushbackReader<R>) -> Result<bool> {
    let mut first = match read_one_byte(reader)? {
        Some(b) => b,
        None => return Ok(false),
    };
    loop {
        if first == 0xff {
            let second = match read_one_byte(reader)? {
                Some(b) => b,
                None => return Ok(false),
            };
            if second & 0b1111_1100 == 0b1111_1000 {
                reader.push_back(&[first, second]);
                return Ok(true);
            }
            first = second;
        } else {
            first = match read_one_byte(reader)? {
                Some(b) => b,
                None => return Ok(false),
            };
        }
    }
}

/// Reads the stream header, tolerating a leading ID3v2 tag. Some encoders and
/// taggers prepend one before the `fLaC` magic; a conforming decoder skips it
/// by its syncsafe size rather than treating it as a corrupt stream.
fn read_stream_header<R: io::Read>(reader: &mut R) -> Result<()> {
    let mut prefix = [0u8; 3];
    reader.read_exact(&mut prefix)?;
    if &prefix == b"ID3" {
        skip_id3v2_tag(reader)?;
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != b"fLaC" {
            return Err(Error::InvalidStreamHeader);
        }
        return Ok(());
    }

    let mut last = [0u8; 1];
    reader.read_exact(&mut last)?;
    if &prefix != b"fLa" || last[0] != b'C' {
        return Err(Error::InvalidStreamHeader);
    }
    Ok(())
}

/// Reads and discards the body of an ID3v2 tag whose `ID3` prefix has already
/// been consumed: a 2-byte version, a 1-byte flags field, and a 4-byte
/// syncsafe size (7 significant bits per byte), followed by that many bytes
/// of tag data plus a 10-byte footer if the tag declares one.
fn skip_id3v2_tag<R: io::Read>(reader: &mut R) -> Result<()> {
    let mut header = [0u8; 7];
    reader.read_exact(&mut header)?;
    let flags = header[2];
    let mut size = 0u32;
    for &b in &header[3..7] {
        size = (size << 7) | (b & 0x7f) as u32;
    }
    let footer_present = flags & 0b0001_0000 != 0;
    let mut remaining = size as u64 + if footer_present { 10 } else { 0 };

    let mut buf = [0u8; 1024];
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        reader.read_exact(&mut buf[..chunk])?;
        remaining -= chunk as u64;
    }
    Ok(())
}

/// Decodes a FLAC stream: the `fLaC` magic, the metadata chain, and then
/// frames of interleaved audio, one at a time.
///
/// The decoder never allocates a full copy of the decoded audio; callers
/// receive each block's channels through a callback and decide what to do
/// with them.
pub struct Decoder<R: io::Read> {
    reader: PushbackReader<R>,
    state: State,
    streaminfo: Option<StreamInfo>,
    metadata: Vec<MetadataBlock>,
    check_md5: bool,
    md5: Option<Md5Accumulator>,
    pending_frame: Option<(FrameHeader, Vec<Vec<i32>>)>,
}

impl<R: io::Read> Decoder<R> {
    /// Creates a decoder around `reader`. No bytes are read until
    /// [`process_until_end_of_metadata`](Self::process_until_end_of_metadata)
    /// or [`process_single`](Self::process_single) is called.
    pub fn new(reader: R) -> Decoder<R> {
        Decoder {
            reader: PushbackReader::new(reader),
            state: State::SearchForMetadata,
            streaminfo: None,
            metadata: Vec::new(),
            check_md5: true,
            md5: None,
            pending_frame: None,
        }
    }

    /// Enables or disables verifying the decoded audio against STREAMINFO's
    /// MD5 signature in [`process_until_end_of_stream`](Self::process_until_end_of_stream)
    /// and [`finish`](Self::finish). Enabled by default.
    pub fn set_md5_checking(&mut self, check: bool) {
        self.check_md5 = check;
    }

    /// The STREAMINFO block, once the metadata chain has been read.
    pub fn streaminfo(&self) -> Option<&StreamInfo> {
        self.streaminfo.as_ref()
    }

    /// The non-STREAMINFO metadata blocks seen so far, in stream order.
    pub fn metadata(&self) -> &[MetadataBlock] {
        &self.metadata
    }

    /// Reads the stream header and the full metadata chain, calling
    /// `on_metadata` for every block, STREAMINFO included. A no-op if the
    /// metadata chain has already been read.
    pub fn process_until_end_of_metadata<M>(&mut self, mut on_metadata: M) -> Result<()>
    where
        M: FnMut(&MetadataBlock),
    {
        if self.state == State::SearchForMetadata {
            read_stream_header(&mut self.reader)?;
            self.state = State::ReadMetadata;
        }
        if self.state != State::ReadMetadata {
            return Ok(());
        }

        let mut iter = metadata::MetadataBlockReader::new(&mut self.reader);
        match iter.next() {
            Some(Ok(MetadataBlock::StreamInfo(info))) => {
                self.streaminfo = Some(info);
                on_metadata(&MetadataBlock::StreamInfo(info));
            }
            Some(Ok(_)) => return Err(Error::MissingStreamInfoBlock),
            Some(Err(e)) => return Err(e),
            None => return Err(Error::MissingStreamInfoBlock),
        }
        for block in iter {
            let block = block?;
            on_metadata(&block);
            self.metadata.push(block);
        }

        self.state = State::SearchForFrameSync;
        Ok(())
    }

    fn read_one_frame(&mut self) -> Result<Option<(FrameHeader, Vec<Vec<i32>>)>> {
        if !find_frame_sync(&mut self.reader)? {
            return Ok(None);
        }
        let streaminfo = self.streaminfo.ok_or(Error::MissingStreamInfoBlock)?;

        let header;
        let mut channels_buf;
        let computed_crc;
        {
            let mut crc_reader = Crc16Reader::new(&mut self.reader);
            header = frame::read_frame_header(&mut crc_reader)?;
            let bps = header.bits_per_sample.map(|b| b as u32).unwrap_or(streaminfo.bits_per_sample);
            let n_channels = header.channels() as usize;
            let bs = header.block_size as usize;
            channels_buf = vec![Vec::with_capacity(bs); n_channels];
            frame::read_frame_subframes(&mut crc_reader, &header, bps, &mut channels_buf)?;
            computed_crc = crc_reader.crc();
        }

        let footer = self.reader.read_u16::<BigEndian>()?;
        if footer != computed_crc {
            return Err(Error::FrameFooterCrcMismatch);
        }

        Ok(Some((header, channels_buf)))
    }

    /// Decodes one frame and passes its channels to `write_block`. Reads and
    /// dispatches the metadata chain first if that has not happened yet.
    /// Returns `Ok(false)` at a clean end of stream.
    pub fn process_single<F>(&mut self, write_block: &mut F) -> Result<bool>
    where
        F: FnMut(&[Vec<i32>], &FrameHeader) -> Result<()>,
    {
        if matches!(self.state, State::SearchForMetadata | State::ReadMetadata) {
            self.process_until_end_of_metadata(|_| {})?;
        }
        if self.state == State::EndOfStream {
            return Ok(false);
        }

        let (header, channels_buf) = match self.pending_frame.take() {
            Some(frame) => frame,
            None => match self.read_one_frame()? {
                Some(frame) => frame,
                None => {
                    self.state = State::EndOfStream;
                    return Ok(false);
                }
            },
        };

        if let Some(acc) = &mut self.md5 {
            let streaminfo = self.streaminfo.ok_or(Error::MissingStreamInfoBlock)?;
            let bps = header.bits_per_sample.map(|b| b as u32).unwrap_or(streaminfo.bits_per_sample);
            acc.update_interleaved(&channels_buf, md5::bytes_per_sample(bps));
        }

        write_block(&channels_buf, &header)?;
        self.state = State::SearchForFrameSync;
        Ok(true)
    }

    /// Skips past whatever the decoder is currently looking at (the start of
    /// a frame that failed to parse) and resynchronizes on the next frame
    /// sync code. Used by [`process_until_end_of_stream`](Self::process_until_end_of_stream)
    /// to recover from a corrupt frame instead of aborting the whole stream.
    pub fn skip_single_frame(&mut self) -> Result<bool> {
        self.pending_frame = None;
        let mut discard = [0u8; 1];
        if self.reader.read(&mut discard)? == 0 {
            self.state = State::EndOfStream;
            return Ok(false);
        }
        if find_frame_sync(&mut self.reader)? {
            self.state = State::SearchForFrameSync;
            Ok(true)
        } else {
            self.state = State::EndOfStream;
            Ok(false)
        }
    }

    /// Decodes every remaining frame, calling `write_block` for each and
    /// `on_error` for every recoverable error encountered along the way.
    /// `on_error` returns `true` to keep decoding (after resynchronizing past
    /// the bad frame) or `false` to abort with [`Error::Aborted`].
    pub fn process_until_end_of_stream<F, E>(&mut self, mut write_block: F, mut on_error: E) -> Result<()>
    where
        F: FnMut(&[Vec<i32>], &FrameHeader) -> Result<()>,
        E: FnMut(Error) -> bool,
    {
        if self.check_md5 && self.md5.is_none() {
            self.md5 = Some(Md5Accumulator::new());
        }
        loop {
            match self.process_single(&mut write_block) {
                Ok(false) => break,
                Ok(true) => {}
                Err(e) => {
                    log::warn!("lost sync decoding frame, resynchronizing: {}", e);
                    if !on_error(e) {
                        return Err(Error::Aborted);
                    }
                    if !self.skip_single_frame()? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Resets the state machine to look for a frame sync at the reader's
    /// current position, discarding any buffered lookahead. Used after an
    /// external seek has repositioned the underlying reader.
    pub fn flush(&mut self) {
        self.reader.pending.clear();
        self.pending_frame = None;
        if self.state != State::SearchForMetadata && self.state != State::ReadMetadata {
            self.state = State::SearchForFrameSync;
        }
    }

    /// Finishes decoding, verifying the accumulated MD5 signature against
    /// STREAMINFO if MD5 checking is enabled, and returns the underlying
    /// reader.
    pub fn finish(mut self) -> Result<R> {
        if let Some(acc) = self.md5.take() {
            let digest = acc.finalize();
            if let Some(info) = self.streaminfo {
                if info.md5sum != [0u8; 16] && digest != info.md5sum {
                    return Err(Error::Md5Mismatch);
                }
            }
        }
        Ok(self.reader.into_inner())
    }
}

impl<R: io::Read + io::Seek> Decoder<R> {
    /// Seeks to the frame that contains `sample`, by rewinding to the start
    /// of the stream and scanning forward frame by frame. This is the
    /// reference decoder's fallback path for a stream with no SEEKTABLE; it
    /// does not consult one even if present, since doing so only narrows the
    /// linear scan's starting point rather than changing its correctness.
    pub fn seek_absolute(&mut self, sample: u64) -> Result<()> {
        self.reader.rewind()?;
        self.state = State::SearchForMetadata;
        self.streaminfo = None;
        self.metadata.clear();
        self.pending_frame = None;
        self.process_until_end_of_metadata(|_| {})?;

        loop {
            let (header, channels) = match self.read_one_frame()? {
                Some(frame) => frame,
                None => return Err(Error::UnparseableStream("seek target beyond end of stream")),
            };
            let frame_start = match header.block_time {
                BlockTime::SampleNumber(n) => n,
                BlockTime::FrameNumber(n) => {
                    let bs = self.streaminfo.map(|s| s.max_block_size as u64).unwrap_or(header.block_size as u64);
                    n as u64 * bs
                }
            };
            if sample < frame_start + header.block_size as u64 {
                self.pending_frame = Some((header, channels));
                self.state = State::SearchForFrameSync;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelAssignment;
    use crate::metadata::StreamInfo;
    use crate::subframe::{self, EncodeSettings};
    use byteorder::WriteBytesExt;

    fn encode_test_stream(channels: &[Vec<i32>], sample_rate: u32, bps: u32) -> Vec<u8> {
        let block_size = channels[0].len();
        let settings = EncodeSettings::default();

        let mut stream = Vec::new();
        stream.extend_from_slice(b"fLaC");

        let info = StreamInfo {
            min_block_size: block_size as u16,
            max_block_size: block_size as u16,
            min_frame_size: None,
            max_frame_size: None,
            sample_rate,
            channels: channels.len() as u32,
            bits_per_sample: bps,
            samples: Some(block_size as u64),
            md5sum: [0u8; 16],
        };
        metadata::write_metadata_block(&mut stream, &MetadataBlock::StreamInfo(info), true).unwrap();

        let header = FrameHeader {
            block_time: BlockTime::FrameNumber(0),
            block_size: block_size as u16,
            sample_rate: Some(sample_rate),
            channel_assignment: ChannelAssignment::Independent(channels.len() as u8),
            bits_per_sample: Some(bps as u8),
        };

        let mut frame_buf = Vec::new();
        frame::write_frame_header(&mut frame_buf, &header).unwrap();
        let plans: Vec<_> = channels.iter().map(|c| subframe::plan_subframe(c, bps, &settings)).collect();
        frame::write_frame_subframes(&mut frame_buf, &plans).unwrap();
        let crc = crate::crc::crc16(&frame_buf);
        frame_buf.write_u16::<BigEndian>(crc).unwrap();

        stream.extend_from_slice(&frame_buf);
        stream
    }

    #[test]
    fn decodes_a_single_frame_stream() {
        let left: Vec<i32> = (0..128).map(|i| i - 64).collect();
        let right: Vec<i32> = (0..128).map(|i| 64 - i).collect();
        let bytes = encode_test_stream(&[left.clone(), right.clone()], 44_100, 16);

        let mut decoder = Decoder::new(io::Cursor::new(bytes));
        decoder.process_until_end_of_metadata(|_| {}).unwrap();
        assert_eq!(decoder.streaminfo().unwrap().sample_rate, 44_100);

        let mut seen = Vec::new();
        decoder
            .process_until_end_of_stream(
                |channels, _header| {
                    seen.push(channels.to_vec());
                    Ok(())
                },
                |_e| false,
            )
            .unwrap();

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0][0], left);
        assert_eq!(seen[0][1], right);
        decoder.finish().unwrap();
    }

    #[test]
    fn process_single_returns_false_at_end_of_stream() {
        let samples: Vec<i32> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let bytes = encode_test_stream(&[samples.clone()], 8_000, 8);
        let mut decoder = Decoder::new(io::Cursor::new(bytes));

        let mut count = 0;
        while decoder.process_single(&mut |_c, _h| Ok(())).unwrap() {
            count += 1;
        }
        assert_eq!(count, 1);
        assert!(!decoder.process_single(&mut |_c, _h| Ok(())).unwrap());
    }

    #[test]
    fn rejects_corrupted_frame_footer_crc() {
        let samples: Vec<i32> = (0..64).collect();
        let mut bytes = encode_test_stream(&[samples], 8_000, 16);
        *bytes.last_mut().unwrap() ^= 0xff;

        let mut decoder = Decoder::new(io::Cursor::new(bytes));
        let result = decoder.process_single(&mut |_c, _h| Ok(()));
        assert!(matches!(result, Err(Error::FrameFooterCrcMismatch)));
    }

    #[test]
    fn rejects_stream_without_flac_magic() {
        let mut decoder = Decoder::new(io::Cursor::new(b"oops".to_vec()));
        assert!(decoder.process_until_end_of_metadata(|_| {}).is_err());
    }

    #[test]
    fn skips_a_leading_id3v2_tag_before_the_stream_magic() {
        let left: Vec<i32> = (0..64).map(|i| i - 32).collect();
        let flac_bytes = encode_test_stream(&[left.clone()], 44_100, 16);

        let mut tagged = Vec::new();
        tagged.extend_from_slice(b"ID3");
        tagged.extend_from_slice(&[3, 0]); // version 2.3.0
        tagged.push(0); // flags: no footer
        let tag_body = vec![0u8; 32];
        // Syncsafe size: 7 significant bits per byte.
        let size = tag_body.len() as u32;
        tagged.push(((size >> 21) & 0x7f) as u8);
        tagged.push(((size >> 14) & 0x7f) as u8);
        tagged.push(((size >> 7) & 0x7f) as u8);
        tagged.push((size & 0x7f) as u8);
        tagged.extend_from_slice(&tag_body);
        tagged.extend_from_slice(&flac_bytes);

        let mut decoder = Decoder::new(io::Cursor::new(tagged));
        decoder.process_until_end_of_metadata(|_| {}).unwrap();
        assert_eq!(decoder.streaminfo().unwrap().channels, 1);

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
        assert_eq!(decoded, left);
    }

    #[test]
    fn seek_absolute_finds_the_frame_containing_the_sample() {
        let left: Vec<i32> = (0..64).collect();
        let bytes = encode_test_stream(&[left.clone()], 44_100, 16);
        let mut decoder = Decoder::new(io::Cursor::new(bytes));
        decoder.seek_absolute(10).unwrap();

        let mut seen = Vec::new();
        decoder
            .process_until_end_of_stream(
                |channels, _header| {
                    seen.push(channels[0].clone());
                    Ok(())
                },
                |_e| false,
            )
            .unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], left);
    }
}
