// lib.rs      gifolio crate.
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! GIF codec core: read a GIF file into memory and write one back out, or
//! stream its records one at a time.
//!
//! * [Decoder] / [Reader] for decoding
//! * [Encoder] / [Writer] for encoding
//! * [Gif](block/struct.Gif.html) container with screen, images and
//!   extension blocks
//!
//! [Decoder]: struct.Decoder.html
//! [Encoder]: struct.Encoder.html
//! [Reader]: struct.Reader.html
//! [Writer]: struct.Writer.html

#[macro_use]
extern crate log;

pub mod block;
pub mod color;
mod decode;
mod encode;
mod error;
pub mod gcb;
mod lzw;
pub mod packet;
mod private;
mod raster;
pub mod record;

pub use crate::decode::Reader;
pub use crate::encode::Writer;
pub use crate::error::{error_string, DecodeError, EncodeError};
pub use crate::lzw::{Compressor, Decompressor};
pub use crate::private::{Decoder, Encoder};
