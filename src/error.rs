// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! The `error` module defines the error and result types used throughout the crate.

use thiserror::Error;

/// An error that prevents successful encoding or decoding of a FLAC stream.
#[derive(Error, Debug)]
pub enum Error {
    /// An underlying I/O operation (read, write, seek) failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream header does not equal `fLaC`.
    #[error("invalid stream header, expected 'fLaC' magic")]
    InvalidStreamHeader,

    /// Metadata block type 127 is invalid, to avoid confusion with a frame sync code.
    #[error("invalid metadata block type 127")]
    InvalidMetadataBlockType,
    /// The STREAMINFO block must have length 34.
    #[error("invalid streaminfo metadata block length, expected 34")]
    InvalidMetadataBlockLength,

    /// A lower bound was encountered that was bigger than an upper bound.
    #[error("inconsistent bounds in streaminfo")]
    InconsistentBounds,
    /// The minimum block size must be at least 16, and the block size must not exceed 65535.
    #[error("invalid block size")]
    InvalidBlockSize,
    /// The sample rate must be positive and no larger than 655350 Hz.
    #[error("invalid sample rate")]
    InvalidSampleRate,

    /// The STREAMINFO block must be the very first metadata block.
    #[error("missing streaminfo block, it must be the first metadata block")]
    MissingStreamInfoBlock,

    /// A frame must start with the frame sync code.
    #[error("missing frame sync code")]
    MissingFrameSyncCode,
    /// The frame header contains an invalid value in one of the reserved bits, or one
    /// of the bit patterns that is reserved or invalid to prevent confusion with a
    /// frame sync code.
    #[error("invalid frame header: {0}")]
    InvalidFrameHeader(&'static str),
    /// The expected UTF-8-ish encoded integer contains an invalid bit sequence.
    #[error("invalid variable-length integer")]
    InvalidVarLengthInt,
    /// The observed frame header CRC-8 does not match the stored CRC-8.
    #[error("frame header crc-8 mismatch")]
    FrameHeaderCrcMismatch,
    /// The observed frame footer CRC-16 does not match the stored CRC-16.
    #[error("frame footer crc-16 mismatch")]
    FrameFooterCrcMismatch,

    /// The subframe header contains an invalid or reserved bit pattern.
    #[error("invalid subframe header")]
    InvalidSubframeHeader,
    /// The subframe contains an invalid or reserved bit pattern.
    #[error("invalid subframe: {0}")]
    InvalidSubframe(&'static str),

    /// The residual contains an invalid or reserved bit pattern.
    #[error("invalid residual coding method")]
    InvalidResidual,
    /// The number of bits per sample in an unencoded binary Rice partition is
    /// larger than the bits per sample of the stream.
    #[error("invalid bits per sample in escape-coded rice partition")]
    InvalidBitsPerSample,
    /// A bit pattern is not a valid Rice code in context (unary part too long).
    #[error("invalid rice code, unary part exceeds maximum")]
    InvalidRiceCode,

    /// The audio stream has more bits per sample than the provided sample buffer
    /// can represent.
    #[error("sample is too wide for the destination buffer")]
    SampleTooWide,

    /// A setting was given an out-of-range or otherwise invalid value.
    #[error("invalid setting: {0}")]
    InvalidSetting(&'static str),
    /// A setter was called while the encoder/decoder was not in the UNINITIALIZED state.
    #[error("settings can only be changed before init")]
    NotUninitialized,
    /// An operation that requires the OK state was called in another state.
    #[error("operation requires the OK state")]
    NotReady,

    /// The block size is smaller than `max_lpc_order + 1`, so no subframe can be
    /// modeled at the requested LPC order.
    #[error("block size too small for lpc order")]
    BlockSizeTooSmallForLpcOrder,

    /// Lost synchronization with the frame stream; the decoder will resync.
    #[error("lost synchronization with frame stream")]
    LostSync,
    /// The stream contains a construct this decoder cannot parse at all (as
    /// opposed to one it can skip and resynchronize after).
    #[error("unparseable stream: {0}")]
    UnparseableStream(&'static str),

    /// The MD5 signature computed while decoding does not match the one stored
    /// in STREAMINFO.
    #[error("md5 signature mismatch")]
    Md5Mismatch,

    /// A caller-supplied callback aborted the operation.
    #[error("aborted by callback")]
    Aborted,
}

/// Either `T` on success, or an [`Error`] on failure.
pub type Result<T> = std::result::Result<T, Error>;
