// encode.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! GIF file encoding
use crate::block::{
    row_order, ExtensionBlock, ExtensionCode, Gif, ImageDesc, Screen, Version,
};
use crate::color::ColorMap;
use crate::error::EncodeError;
use crate::gcb::GraphicsControl;
use crate::lzw::Compressor;
use crate::packet::{write_sub_blocks, SubBlockWriter, MAX_SUB_BLOCK};
use crate::record::RecordType;
use std::io::Write;

/// Encoder state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    /// Nothing written yet
    Start,
    /// Screen descriptor written; between records
    Records,
    /// Image descriptor written; pixels outstanding
    Image,
}

/// Streaming encoder session.
///
/// The screen descriptor must be written first, followed by any number of
/// extensions and images, then [finish](#method.finish) writes the trailer.
///
/// Created with [Encoder::into_writer](../struct.Encoder.html#method.into_writer).
pub struct Writer<W: Write> {
    /// Writer for output data
    writer: W,
    /// Version for header stamp (`None` for GIF89a)
    version: Option<Version>,
    /// Current state
    state: State,
    /// Global color map
    global: Option<ColorMap>,
    /// Current image data
    image: Option<ImageSink>,
    /// Number of images written
    n_images: usize,
}

/// Image data being compressed
struct ImageSink {
    /// LZW compressor
    compressor: Compressor,
    /// Compressed data not yet written
    data: Vec<u8>,
    /// Number of pixels still expected
    remaining: usize,
    /// Number of colors in effective color map
    n_colors: usize,
}

impl<W: Write> Writer<W> {
    /// Create a new writer session
    pub(crate) fn new(writer: W, version: Option<Version>) -> Self {
        Writer {
            writer,
            version,
            state: State::Start,
            global: None,
            image: None,
            n_images: 0,
        }
    }

    /// Check that records may be written
    fn expect_records(&self) -> Result<(), EncodeError> {
        match self.state {
            State::Start => Err(EncodeError::NoScreenDesc),
            State::Records => Ok(()),
            State::Image => Err(EncodeError::HasImageDesc),
        }
    }

    /// Write the header, screen descriptor and global color map
    pub fn put_screen_desc(&mut self, screen: &Screen) -> Result<(), EncodeError> {
        if self.state != State::Start {
            return Err(EncodeError::HasScreenDesc);
        }
        let version = self.version.unwrap_or(Version::Gif89a);
        debug!(
            "screen: {:?} {}x{}",
            version,
            screen.width(),
            screen.height()
        );
        self.writer.write_all(version.stamp())?;
        self.writer.write_all(&screen.to_buf())?;
        if let Some(map) = screen.color_map() {
            self.writer.write_all(&map.to_rgb())?;
        }
        self.global = screen.color_map().cloned();
        self.state = State::Records;
        Ok(())
    }

    /// Write an image descriptor, local color map and LZW code size.
    ///
    /// Exactly width × height pixels must follow, in file row order.
    pub fn put_image_desc(&mut self, desc: &ImageDesc) -> Result<(), EncodeError> {
        self.expect_records()?;
        let map = desc
            .color_map()
            .or(self.global.as_ref())
            .ok_or(EncodeError::NoColorMap)?;
        let code_size = Gif::code_size(map);
        let n_colors = map.len();
        debug!(
            "image {}: {}x{} at {},{}",
            self.n_images,
            desc.width(),
            desc.height(),
            desc.left(),
            desc.top()
        );
        self.writer.write_all(&[RecordType::ImageDesc.signature()])?;
        self.writer.write_all(&desc.to_buf())?;
        if let Some(map) = desc.color_map() {
            self.writer.write_all(&map.to_rgb())?;
        }
        self.writer.write_all(&[code_size])?;
        self.image = Some(ImageSink {
            compressor: Compressor::new(code_size),
            data: Vec::with_capacity(MAX_SUB_BLOCK * 2),
            remaining: desc.image_sz(),
            n_colors,
        });
        self.state = State::Image;
        if desc.image_sz() == 0 {
            self.finish_image()?;
        }
        Ok(())
    }

    /// Write one line of pixels (color indices) in file row order.
    ///
    /// The line length may be any amount up to the remaining pixel count.
    pub fn put_line(&mut self, line: &[u8]) -> Result<(), EncodeError> {
        if self.state != State::Image {
            return Err(EncodeError::NoImageDesc);
        }
        let sink = self.image.as_mut().ok_or(EncodeError::NoImageDesc)?;
        if line.len() > sink.remaining {
            return Err(EncodeError::DataTooBig);
        }
        if line.iter().any(|px| *px as usize >= sink.n_colors) {
            return Err(EncodeError::InvalidColorIndex);
        }
        sink.compressor.compress(line, &mut sink.data);
        sink.remaining -= line.len();
        // only complete sub-blocks, so nothing stays buffered in the writer
        let full = sink.data.len() - sink.data.len() % MAX_SUB_BLOCK;
        if full > 0 {
            let mut bw = SubBlockWriter::new(&mut self.writer);
            bw.write_all(&sink.data[..full])?;
            sink.data.drain(..full);
        }
        if sink.remaining == 0 {
            self.finish_image()?;
        }
        Ok(())
    }

    /// Write one pixel (color index)
    pub fn put_pixel(&mut self, px: u8) -> Result<(), EncodeError> {
        self.put_line(&[px])
    }

    /// Finish the current image: end code, last sub-block and terminator
    fn finish_image(&mut self) -> Result<(), EncodeError> {
        if let Some(mut sink) = self.image.take() {
            sink.compressor.finish(&mut sink.data);
            write_sub_blocks(&mut self.writer, &sink.data)?;
        }
        self.n_images += 1;
        self.state = State::Records;
        Ok(())
    }

    /// Write an extension with one payload.
    ///
    /// Payloads longer than 255 bytes are split into several sub-blocks.
    pub fn put_extension(
        &mut self,
        code: ExtensionCode,
        bytes: &[u8],
    ) -> Result<(), EncodeError> {
        self.put_extension_blocks(code, &[bytes])
    }

    /// Write an extension with a sequence of payloads, each starting a new
    /// sub-block
    pub fn put_extension_blocks(
        &mut self,
        code: ExtensionCode,
        blocks: &[&[u8]],
    ) -> Result<(), EncodeError> {
        self.expect_records()?;
        if code.is_gif89() && self.version == Some(Version::Gif87a) {
            warn!("{:?} extension in GIF87a file", code);
        }
        debug!("extension: {:?}, {} blocks", code, blocks.len());
        self.writer
            .write_all(&[RecordType::Extension.signature(), code.into()])?;
        let mut bw = SubBlockWriter::new(&mut self.writer);
        for block in blocks {
            bw.write_all(block)?;
            bw.write_chunk()?;
        }
        bw.finish()?;
        Ok(())
    }

    /// Write a comment extension
    pub fn put_comment(&mut self, comment: &str) -> Result<(), EncodeError> {
        self.put_extension(ExtensionCode::Comment, comment.as_bytes())
    }

    /// Write a graphic control extension
    pub fn put_graphics_control(
        &mut self,
        gcb: &GraphicsControl,
    ) -> Result<(), EncodeError> {
        self.put_extension(ExtensionCode::GraphicControl, &gcb.to_extension())
    }

    /// Write a chain of stored extension blocks.
    ///
    /// Each block with a function code starts a new extension; continuation
    /// blocks are written as further sub-blocks of it.
    fn put_extension_chain(
        &mut self,
        blocks: &[ExtensionBlock],
    ) -> Result<(), EncodeError> {
        let mut start = 0;
        for end in 1..=blocks.len() {
            if end == blocks.len()
                || blocks[end].code() != ExtensionCode::Continuation
            {
                let group = &blocks[start..end];
                let payloads: Vec<&[u8]> =
                    group.iter().map(|b| b.bytes()).collect();
                self.put_extension_blocks(group[0].code(), &payloads)?;
                start = end;
            }
        }
        Ok(())
    }

    /// Write the trailer and flush, returning the inner writer
    pub fn finish(mut self) -> Result<W, EncodeError> {
        match self.state {
            State::Start => return Err(EncodeError::NoScreenDesc),
            State::Image => return Err(EncodeError::HasImageDesc),
            State::Records if self.n_images == 0 => {
                return Err(EncodeError::NoImageDesc)
            }
            State::Records => (),
        }
        self.writer.write_all(&[RecordType::Terminate.signature()])?;
        self.writer.flush().map_err(EncodeError::CloseFailed)?;
        debug!("finish: {} images", self.n_images);
        Ok(self.writer)
    }

    /// Write an entire file from memory.
    ///
    /// Interlaced images are written in interlaced row order.  Unless a
    /// version was chosen, the header stamp is the minimum version required
    /// by the extensions present.
    pub fn spew(mut self, gif: &Gif) -> Result<W, EncodeError> {
        gif.validate()?;
        if self.version.is_none() {
            self.version = Some(gif.version());
        }
        self.put_screen_desc(gif.screen())?;
        for image in gif.images() {
            self.put_extension_chain(image.extensions())?;
            let desc = image.desc();
            self.put_image_desc(desc)?;
            if desc.image_sz() > 0 {
                let height = desc.height() as usize;
                for row in row_order(height, desc.interlaced()) {
                    let line = image.row(row).ok_or(EncodeError::DataTooBig)?;
                    self.put_line(line)?;
                }
            }
        }
        self.put_extension_chain(gif.extensions())?;
        self.finish()
    }
}
