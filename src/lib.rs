// Fluac -- A FLAC encoding and decoding library in Rust
// Copyright 2026 The Fluac Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Fluac is a library for decoding and encoding the Free Lossless Audio
//! Codec (FLAC) format.
//!
//! A minimal decode loop looks like this:
//!
//! ```no_run
//! use std::fs::File;
//! use fluac::Decoder;
//!
//! let file = File::open("example.flac").unwrap();
//! let mut decoder = Decoder::new(file);
//! decoder.process_until_end_of_metadata(|_block| {}).unwrap();
//! decoder.process_until_end_of_stream(
//!     |_channels, _header| Ok(()),
//!     |_err| false,
//! ).unwrap();
//! ```
//!
//! Encoding mirrors it:
//!
//! ```no_run
//! use std::fs::File;
//! use fluac::{Encoder, EncoderSettings};
//!
//! let file = File::create("example.flac").unwrap();
//! let mut encoder = Encoder::new(file, EncoderSettings::default()).unwrap();
//! encoder.process_interleaved(&[0i32; 8]).unwrap();
//! encoder.finish_seekable().unwrap();
//! ```

pub mod bitstream;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fixed;
pub mod frame;
pub mod lpc;
pub mod math;
pub mod md5;
pub mod metadata;
pub mod rice;
pub mod sample;
pub mod subframe;

pub use crate::decoder::Decoder;
pub use crate::encoder::{Encoder, EncoderSettings};
pub use crate::error::{Error, Result};
pub use crate::frame::{BlockTime, BlockingStrategy, ChannelAssignment, FrameHeader};
pub use crate::metadata::{ApplicationBlock, MetadataBlock, SeekPoint, SeekTable, StreamInfo};
pub use crate::subframe::EncodeSettings;
