// private.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Private module for top-level items
use crate::block::{Gif, Version};
use crate::decode::Reader;
use crate::encode::Writer;
use crate::error::{DecodeError, EncodeError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// GIF file decoder
///
/// Can be converted to a streaming [Reader], or read entirely into memory
/// with [slurp].
///
/// ## Example: Read a GIF into memory
/// ```
/// use gifolio::Decoder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// // ... open a `File` as "gif"
/// let gif = Decoder::new(gif).slurp()?;
/// for image in gif.images() {
///     let raster = image.to_raster(gif.screen().color_map())?;
///     // ... work with raster
/// }
/// # Ok(())
/// # }
/// ```
///
/// [Reader]: struct.Reader.html
/// [slurp]: struct.Decoder.html#method.slurp
pub struct Decoder<R: Read> {
    /// Reader for input data
    reader: R,
    /// Maximum image size, in pixels
    max_image_sz: Option<usize>,
}

impl<R: Read> Decoder<R> {
    /// Create a new GIF decoder.
    pub fn new(reader: R) -> Self {
        Decoder {
            reader,
            max_image_sz: Some(1 << 25),
        }
    }

    /// Set the maximum image size (in pixels) to allow for decoding.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.max_image_sz = max_image_sz;
        self
    }

    /// Convert into a streaming reader.
    pub fn into_reader(self) -> Reader<R> {
        Reader::new(self.reader, self.max_image_sz)
    }

    /// Read the entire file into memory.
    pub fn slurp(self) -> Result<Gif, DecodeError> {
        self.into_reader().slurp()
    }
}

impl Decoder<BufReader<File>> {
    /// Open a GIF file for decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let file = File::open(path).map_err(DecodeError::OpenFailed)?;
        Ok(Decoder::new(BufReader::new(file)))
    }
}

/// GIF file encoder
///
/// Can be converted to a streaming [Writer], or write an entire file from
/// memory with [spew].
///
/// ## Encoding Example
/// ```
/// use gifolio::{block::{Gif, ImageDesc, Screen}, color::{Color, ColorMap}};
/// use gifolio::Encoder;
/// use std::error::Error;
/// use std::io::Write;
///
/// fn encode<W: Write>(w: W) -> Result<W, Box<dyn Error>> {
///     let colors = [Color::new(0xFF, 0, 0), Color::new(0xFF, 0xFF, 0)];
///     let screen = Screen::new(4, 4).with_color_map(ColorMap::new(&colors));
///     let mut gif = Gif::new(screen);
///     let mut raster = vec![0; 16];
///     for i in 0..4 {
///         raster[i * 5] = 1;
///     }
///     gif.add_image(ImageDesc::new(4, 4), raster)?;
///     Ok(Encoder::new(w).spew(&gif)?)
/// }
/// # encode(vec![]).unwrap();
/// ```
///
/// [spew]: struct.Encoder.html#method.spew
/// [Writer]: struct.Writer.html
pub struct Encoder<W: Write> {
    /// Writer for output data
    writer: W,
    /// Version for header stamp
    version: Option<Version>,
}

impl<W: Write> Encoder<W> {
    /// Create a new GIF encoder.
    pub fn new(writer: W) -> Self {
        Encoder {
            writer,
            version: None,
        }
    }

    /// Set the version for the header stamp.
    ///
    /// When `None`, streaming writers use GIF89a and [spew] uses the minimum
    /// version required by the extensions present.
    ///
    /// [spew]: struct.Encoder.html#method.spew
    pub fn version(mut self, version: Option<Version>) -> Self {
        self.version = version;
        self
    }

    /// Convert into a streaming writer.
    pub fn into_writer(self) -> Writer<W> {
        Writer::new(self.writer, self.version)
    }

    /// Write an entire file from memory, returning the inner writer.
    pub fn spew(self, gif: &Gif) -> Result<W, EncodeError> {
        self.into_writer().spew(gif)
    }
}

impl Encoder<BufWriter<File>> {
    /// Create a GIF file for encoding.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, EncodeError> {
        let file = File::create(path).map_err(EncodeError::OpenFailed)?;
        Ok(Encoder::new(BufWriter::new(file)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::{ImageDesc, Screen};
    use crate::color::{Color, ColorMap};
    use std::error::Error;

    #[test]
    fn open_missing() {
        let res = Decoder::open("/nonexistent/gifolio/missing.gif");
        assert!(matches!(res, Err(DecodeError::OpenFailed(_))));
        if let Err(e) = res {
            assert_eq!(e.code(), 101);
        }
        let res = Encoder::create("/nonexistent/gifolio/missing.gif");
        assert!(matches!(res, Err(EncodeError::OpenFailed(_))));
    }

    #[test]
    fn file_round_trip() -> Result<(), Box<dyn Error>> {
        let path = std::env::temp_dir()
            .join(format!("gifolio-{}.gif", std::process::id()));
        let colors = [Color::new(1, 2, 3), Color::new(4, 5, 6)];
        let screen = Screen::new(2, 2).with_color_map(ColorMap::new(&colors));
        let mut gif = Gif::new(screen);
        gif.add_image(ImageDesc::new(2, 2), vec![0, 1, 1, 0])?;
        Encoder::create(&path)?.spew(&gif)?;
        let copy = Decoder::open(&path)?.slurp();
        std::fs::remove_file(&path)?;
        assert_eq!(copy?, gif);
        Ok(())
    }
}
