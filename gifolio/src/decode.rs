// decode.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! GIF file decoding
use crate::block::{
    row_order, ExtensionBlock, ExtensionCode, Gif, ImageDesc, SavedImage,
    Screen, Version,
};
use crate::color::ColorMap;
use crate::error::DecodeError;
use crate::lzw::Decompressor;
use crate::packet::{read_byte, read_bytes, read_sub_block};
use crate::record::{Dispatcher, RecordType, State};
use std::io::Read;

/// Streaming decoder session.
///
/// Reads a GIF file one record at a time: first the screen descriptor, then
/// a sequence of records chosen by [record_type](#method.record_type).
/// Image pixels are read one line (or pixel) at a time in file row order.
///
/// Created with [Decoder::into_reader](../struct.Decoder.html#method.into_reader).
pub struct Reader<R: Read> {
    /// Reader for input data
    reader: R,
    /// Maximum image size, in pixels
    max_image_sz: Option<usize>,
    /// Record dispatcher
    dispatcher: Dispatcher,
    /// Version read from header
    version: Option<Version>,
    /// Screen descriptor
    screen: Option<Screen>,
    /// Current image descriptor
    image_desc: Option<ImageDesc>,
    /// Current image data
    image: Option<ImageStream>,
    /// Extension function code has been read
    ext_open: bool,
}

/// LZW image data being decoded
struct ImageStream {
    /// LZW decompressor
    decompressor: Decompressor,
    /// Decoded pixels not yet delivered
    pending: Vec<u8>,
    /// Position of next pending pixel
    pos: usize,
    /// Number of pixels not yet delivered
    remaining: usize,
    /// Number of pixels decoded
    decoded: usize,
    /// Image size in pixels
    image_sz: usize,
}

impl ImageStream {
    /// Create a new image stream
    fn new(code_size: u8, image_sz: usize) -> Self {
        ImageStream {
            decompressor: Decompressor::new(code_size),
            pending: Vec::with_capacity(image_sz.min(4096)),
            pos: 0,
            remaining: image_sz,
            decoded: 0,
            image_sz,
        }
    }

    /// Fill a buffer with decoded pixels
    fn fill<R: Read>(
        &mut self,
        reader: &mut R,
        buf: &mut [u8],
    ) -> Result<(), DecodeError> {
        let mut n = 0;
        while n < buf.len() {
            if self.pos < self.pending.len() {
                let len = (self.pending.len() - self.pos).min(buf.len() - n);
                buf[n..n + len]
                    .copy_from_slice(&self.pending[self.pos..self.pos + len]);
                self.pos += len;
                n += len;
            } else {
                self.pending.clear();
                self.pos = 0;
                self.decode_sub_block(reader)?;
            }
        }
        self.remaining -= buf.len();
        Ok(())
    }

    /// Decode one sub-block of LZW data into pending pixels
    fn decode_sub_block<R: Read>(
        &mut self,
        reader: &mut R,
    ) -> Result<(), DecodeError> {
        if self.decompressor.is_done() {
            debug!("end code with {} pixels missing", self.remaining);
            return Err(DecodeError::EofTooSoon);
        }
        match read_sub_block(reader)? {
            Some(chunk) => {
                let start = self.pending.len();
                self.decompressor.decompress(&chunk, &mut self.pending)?;
                self.decoded += self.pending.len() - start;
                if self.decoded > self.image_sz {
                    warn!("image data exceeds {} pixels", self.image_sz);
                    self.pending.truncate(start);
                    return Err(DecodeError::ImageDefect);
                }
                Ok(())
            }
            None => {
                debug!("image data ended with {} pixels missing", self.remaining);
                Err(DecodeError::EofTooSoon)
            }
        }
    }

    /// Read remaining sub-blocks after every pixel was delivered
    fn finish<R: Read>(mut self, reader: &mut R) -> Result<(), DecodeError> {
        let mut extra = vec![];
        while let Some(chunk) = read_sub_block(reader)? {
            if !self.decompressor.is_done() {
                self.decompressor.decompress(&chunk, &mut extra)?;
                if !extra.is_empty() {
                    warn!("extra image data: {} pixels", extra.len());
                    return Err(DecodeError::ImageDefect);
                }
            }
        }
        if !self.decompressor.is_done() {
            debug!("image data missing end code");
        }
        Ok(())
    }
}

impl<R: Read> Reader<R> {
    /// Create a new reader session
    pub(crate) fn new(reader: R, max_image_sz: Option<usize>) -> Self {
        Reader {
            reader,
            max_image_sz,
            dispatcher: Dispatcher::default(),
            version: None,
            screen: None,
            image_desc: None,
            image: None,
            ext_open: false,
        }
    }

    /// Get the version from the header stamp (after the screen descriptor)
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Read a color map
    fn read_color_map(
        &mut self,
        size_bytes: usize,
        sorted: bool,
    ) -> Result<Option<ColorMap>, DecodeError> {
        if size_bytes == 0 {
            return Ok(None);
        }
        let mut buf = vec![0; size_bytes];
        read_bytes(&mut self.reader, &mut buf)?;
        Ok(ColorMap::with_rgb(&buf).map(|map| map.with_sorted(sorted)))
    }

    /// Read the header, screen descriptor and global color map.
    ///
    /// Once read, the same screen is returned on later calls.
    pub fn screen_desc(&mut self) -> Result<&Screen, DecodeError> {
        if self.dispatcher.state() == State::Start {
            let mut stamp = [0; Version::STAMP_LEN];
            read_bytes(&mut self.reader, &mut stamp)?;
            let version =
                Version::from_stamp(&stamp).ok_or(DecodeError::NotGifFile)?;
            let mut buf = [0; Screen::SIZE];
            read_bytes(&mut self.reader, &mut buf)?;
            let (screen, map_sz, sorted) = Screen::from_buf(&buf);
            let color_map = self.read_color_map(map_sz, sorted)?;
            let screen = screen.with_color_map(color_map);
            debug!(
                "screen: {:?} {}x{} global colors: {}",
                version,
                screen.width(),
                screen.height(),
                screen.color_map().map_or(0, |m| m.len())
            );
            self.dispatcher.screen_read()?;
            self.version = Some(version);
            self.screen = Some(screen);
        }
        self.screen.as_ref().ok_or(DecodeError::NoScreenDesc)
    }

    /// Read the type of the next record
    pub fn record_type(&mut self) -> Result<RecordType, DecodeError> {
        self.dispatcher.expect(State::Dispatch)?;
        let byte = read_byte(&mut self.reader)?;
        self.dispatcher.dispatch(byte)
    }

    /// Read an image descriptor, local color map and LZW code size.
    ///
    /// Must follow a [RecordType::ImageDesc](../record/enum.RecordType.html).
    pub fn image_desc(&mut self) -> Result<ImageDesc, DecodeError> {
        self.dispatcher.expect(State::Image)?;
        if self.image_desc.is_some() {
            return Err(DecodeError::NotReadable);
        }
        let mut buf = [0; ImageDesc::SIZE - 1];
        read_bytes(&mut self.reader, &mut buf)?;
        let (desc, map_sz, sorted) = ImageDesc::from_buf(&buf);
        let color_map = self.read_color_map(map_sz, sorted)?;
        let desc = desc.with_color_map(color_map);
        debug!(
            "image: {}x{} at {},{}{}",
            desc.width(),
            desc.height(),
            desc.left(),
            desc.top(),
            if desc.interlaced() { " interlaced" } else { "" }
        );
        let image_sz = desc.image_sz();
        if let Some(sz) = self.max_image_sz {
            if image_sz > sz {
                return Err(DecodeError::DataTooBig);
            }
        }
        let mut code_size = [0];
        read_bytes(&mut self.reader, &mut code_size)?;
        if !(1..=8).contains(&code_size[0]) {
            debug!("invalid LZW code size: {}", code_size[0]);
            return Err(DecodeError::ImageDefect);
        }
        self.image = Some(ImageStream::new(code_size[0], image_sz));
        self.image_desc = Some(desc.clone());
        if image_sz == 0 {
            self.finish_image()?;
        }
        Ok(desc)
    }

    /// Finish the current image record
    fn finish_image(&mut self) -> Result<(), DecodeError> {
        if let Some(stream) = self.image.take() {
            stream.finish(&mut self.reader)?;
        }
        self.image_desc = None;
        self.dispatcher.finish_record();
        Ok(())
    }

    /// Read one line of pixels (color indices) in file row order.
    ///
    /// The line length may be any amount up to the remaining pixel count.
    pub fn line(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.dispatcher.expect(State::Image)?;
        let stream = self.image.as_mut().ok_or(DecodeError::NoImageDesc)?;
        if buf.len() > stream.remaining {
            return Err(DecodeError::DataTooBig);
        }
        stream.fill(&mut self.reader, buf)?;
        if stream.remaining == 0 {
            self.finish_image()?;
        }
        Ok(())
    }

    /// Read one pixel (color index)
    pub fn pixel(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0];
        self.line(&mut buf)?;
        Ok(buf[0])
    }

    /// Read an extension function code and its first sub-block.
    ///
    /// Must follow a [RecordType::Extension](../record/enum.RecordType.html).
    /// If the sub-block is `Some`, the rest must be read with
    /// [extension_next](#method.extension_next).
    pub fn extension(
        &mut self,
    ) -> Result<(ExtensionCode, Option<Vec<u8>>), DecodeError> {
        self.dispatcher.expect(State::Extension)?;
        if self.ext_open {
            return Err(DecodeError::NotReadable);
        }
        let code = read_byte(&mut self.reader)?.ok_or(DecodeError::EofTooSoon)?;
        let code = ExtensionCode::from(code);
        debug!("extension: {:?}", code);
        let block = read_sub_block(&mut self.reader)?;
        if block.is_some() {
            self.ext_open = true;
        } else {
            self.dispatcher.finish_record();
        }
        Ok((code, block))
    }

    /// Read the next sub-block of the current extension.
    ///
    /// Returns `None` at the end of the extension.
    pub fn extension_next(&mut self) -> Result<Option<Vec<u8>>, DecodeError> {
        self.dispatcher.expect(State::Extension)?;
        if !self.ext_open {
            return Err(DecodeError::NotReadable);
        }
        let block = read_sub_block(&mut self.reader)?;
        if block.is_none() {
            self.ext_open = false;
            self.dispatcher.finish_record();
        }
        Ok(block)
    }

    /// Read image pixels into a raster in display row order
    fn read_raster(&mut self, desc: &ImageDesc) -> Result<Vec<u8>, DecodeError> {
        let image_sz = desc.image_sz();
        let mut raster = Vec::new();
        raster
            .try_reserve_exact(image_sz)
            .map_err(|_| DecodeError::NotEnoughMemory)?;
        raster.resize(image_sz, 0);
        if image_sz > 0 {
            let width = desc.width() as usize;
            let height = desc.height() as usize;
            for row in row_order(height, desc.interlaced()) {
                self.line(&mut raster[row * width..(row + 1) * width])?;
            }
        }
        Ok(raster)
    }

    /// Read the entire file into memory.
    ///
    /// Extension blocks are attached to the image which follows them, or
    /// to the container if no image follows.  On any error, all partially
    /// decoded data is dropped.
    pub fn slurp(mut self) -> Result<Gif, DecodeError> {
        let screen = self.screen_desc()?.clone();
        let mut gif = Gif::new(screen);
        loop {
            match self.record_type()? {
                RecordType::ImageDesc => {
                    let desc = self.image_desc()?;
                    let raster = self.read_raster(&desc)?;
                    let n = gif.images().len();
                    let image =
                        gif.push_image(SavedImage::from_parts(desc, raster));
                    if image.graphics_control_count() > 1 {
                        warn!("image {}: multiple graphic control blocks", n);
                    }
                }
                RecordType::Extension => {
                    let (code, block) = self.extension()?;
                    let bytes = block.unwrap_or_default();
                    let open = !bytes.is_empty();
                    gif.add_extension(ExtensionBlock::new(code, bytes));
                    if open {
                        while let Some(bytes) = self.extension_next()? {
                            gif.add_extension(ExtensionBlock::new(
                                ExtensionCode::Continuation,
                                bytes,
                            ));
                        }
                    }
                }
                RecordType::Terminate => break,
            }
        }
        debug!(
            "slurp: {} images, {} trailing extensions",
            gif.images().len(),
            gif.extensions().len()
        );
        Ok(gif)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gcb::GraphicsControl;
    use crate::Decoder;
    use std::error::Error;

    #[rustfmt::skip]
    const SAMPLE: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0A, 0x00,
        0x0A, 0x00, 0x91, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
        0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00,
        0x00, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00,
        0x0A, 0x00, 0x00, 0x02, 0x16, 0x8C, 0x2D, 0x99,
        0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75,
        0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C, 0x04,
        0x91, 0x4C, 0x01, 0x00, 0x3B,
    ];

    #[rustfmt::skip]
    const SAMPLE_IMAGE: &[u8] = &[
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
        1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
        2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
        2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
    ];

    #[rustfmt::skip]
    const TINY: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
        0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
        0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
        0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
        0x10, 0x05, 0x00, 0x3b,
    ];

    #[test]
    fn slurp_sample() -> Result<(), Box<dyn Error>> {
        let gif = Decoder::new(SAMPLE).slurp()?;
        let screen = gif.screen();
        assert_eq!((screen.width(), screen.height()), (10, 10));
        assert_eq!(screen.color_resolution(), 2);
        let map = screen.color_map().ok_or("no global map")?;
        assert_eq!(map.len(), 4);
        assert_eq!(map.to_rgb()[..6], [0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00]);
        assert_eq!(gif.images().len(), 1);
        let image = &gif.images()[0];
        assert_eq!(image.raster(), SAMPLE_IMAGE);
        assert_eq!(image.extensions().len(), 1);
        assert_eq!(image.graphics_control()?, GraphicsControl::default());
        assert!(gif.extensions().is_empty());
        assert_eq!(gif.version(), Version::Gif89a);
        Ok(())
    }

    #[test]
    fn slurp_tiny() -> Result<(), Box<dyn Error>> {
        let gif = Decoder::new(TINY).slurp()?;
        assert_eq!(gif.screen().background_color_idx(), 1);
        assert_eq!(gif.images().len(), 1);
        assert_eq!(gif.images()[0].raster(), &[1, 0, 0, 1]);
        Ok(())
    }

    #[test]
    fn streaming_lines() -> Result<(), Box<dyn Error>> {
        let mut reader = Decoder::new(SAMPLE).into_reader();
        assert_eq!(reader.screen_desc()?.width(), 10);
        assert_eq!(reader.version(), Some(Version::Gif89a));
        assert_eq!(reader.record_type()?, RecordType::Extension);
        let (code, block) = reader.extension()?;
        assert_eq!(code, ExtensionCode::GraphicControl);
        assert_eq!(block.as_deref(), Some(&[0, 0, 0, 0][..]));
        assert_eq!(reader.extension_next()?, None);
        assert_eq!(reader.record_type()?, RecordType::ImageDesc);
        let desc = reader.image_desc()?;
        assert_eq!(desc.image_sz(), 100);
        let mut line = [0; 10];
        for row in SAMPLE_IMAGE.chunks(10).take(9) {
            reader.line(&mut line)?;
            assert_eq!(&line[..], row);
        }
        for &px in &SAMPLE_IMAGE[90..] {
            assert_eq!(reader.pixel()?, px);
        }
        assert!(matches!(reader.pixel(), Err(DecodeError::NoImageDesc)));
        assert_eq!(reader.record_type()?, RecordType::Terminate);
        assert!(matches!(
            reader.record_type(),
            Err(DecodeError::NotReadable)
        ));
        Ok(())
    }

    #[test]
    fn out_of_sequence() -> Result<(), Box<dyn Error>> {
        let mut reader = Decoder::new(TINY).into_reader();
        assert!(matches!(
            reader.record_type(),
            Err(DecodeError::NoScreenDesc)
        ));
        reader.screen_desc()?;
        let mut line = [0; 2];
        assert!(matches!(
            reader.line(&mut line),
            Err(DecodeError::NoImageDesc)
        ));
        assert_eq!(reader.record_type()?, RecordType::ImageDesc);
        assert!(matches!(reader.extension(), Err(DecodeError::NotReadable)));
        reader.image_desc()?;
        let mut too_long = [0; 5];
        assert!(matches!(
            reader.line(&mut too_long),
            Err(DecodeError::DataTooBig)
        ));
        Ok(())
    }

    #[test]
    fn missing_trailer() {
        let gif = &TINY[..TINY.len() - 1];
        let res = Decoder::new(gif).slurp();
        assert!(matches!(res, Err(DecodeError::EofTooSoon)));
    }

    #[test]
    fn truncated_image() {
        let gif = &TINY[..TINY.len() - 4];
        let res = Decoder::new(gif).slurp();
        assert!(matches!(res, Err(DecodeError::EofTooSoon)));
    }

    #[test]
    fn wrong_record_type() {
        let mut gif = TINY.to_vec();
        let last = gif.len() - 1;
        gif[last] = 0x42;
        let res = Decoder::new(&gif[..]).slurp();
        assert!(matches!(res, Err(DecodeError::WrongRecordType(0x42))));
    }

    #[test]
    fn not_gif() {
        let mut gif = TINY.to_vec();
        gif[4] = b'8';
        let res = Decoder::new(&gif[..]).slurp();
        assert!(matches!(res, Err(DecodeError::NotGifFile)));
        let res = Decoder::new(&b"GIF"[..]).slurp();
        assert!(matches!(res, Err(DecodeError::EofTooSoon)));
    }

    #[test]
    fn corrupt_lzw() {
        let mut gif = SAMPLE.to_vec();
        // first data byte: clear code followed by code 7 (not yet assigned)
        gif[45] = 0b1111_1100;
        let res = Decoder::new(&gif[..]).slurp();
        assert!(matches!(res, Err(DecodeError::ImageDefect)));
    }

    #[test]
    fn end_code_too_soon() {
        let mut gif = TINY.to_vec();
        // clear, 1, end: only one pixel
        gif[30..33].copy_from_slice(&[0x02, 0x4C, 0x01]);
        gif.truncate(33);
        gif.extend_from_slice(&[0x00, 0x3B]);
        let res = Decoder::new(&gif[..]).slurp();
        assert!(matches!(res, Err(DecodeError::EofTooSoon)));
    }

    #[test]
    fn too_many_pixels() {
        let mut gif = TINY.to_vec();
        // clear, 1, 0, 0, 1, 1, end: five pixels for a 2x2 image
        gif[33] = 0x51;
        let res = Decoder::new(&gif[..]).slurp();
        assert!(matches!(res, Err(DecodeError::ImageDefect)));
    }

    #[test]
    fn image_too_large() {
        let res = Decoder::new(SAMPLE).max_image_sz(Some(99)).slurp();
        assert!(matches!(res, Err(DecodeError::DataTooBig)));
        assert!(Decoder::new(SAMPLE).max_image_sz(Some(100)).slurp().is_ok());
    }
}
