// block.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Container model: screen, images and extension blocks
use crate::color::{bit_size, ColorMap};
use crate::error::EncodeError;

/// GIF version stamp
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Version {
    /// `GIF87a`
    Gif87a,
    /// `GIF89a`
    Gif89a,
}

impl Version {
    /// Size of the header stamp
    pub(crate) const STAMP_LEN: usize = 6;

    /// Get the 6-byte header stamp
    pub fn stamp(self) -> &'static [u8; 6] {
        match self {
            Version::Gif87a => b"GIF87a",
            Version::Gif89a => b"GIF89a",
        }
    }

    /// Parse a header stamp
    pub fn from_stamp(stamp: &[u8]) -> Option<Self> {
        match stamp {
            b"GIF87a" => Some(Version::Gif87a),
            b"GIF89a" => Some(Version::Gif89a),
            _ => None,
        }
    }
}

/// Extension function code
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtensionCode {
    /// Further sub-block of the preceding extension
    Continuation,
    PlainText,
    GraphicControl,
    Comment,
    Application,
    Unknown(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x00 => Continuation,
            0x01 => PlainText,
            0xF9 => GraphicControl,
            0xFE => Comment,
            0xFF => Application,
            _ => Unknown(n),
        }
    }
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            Continuation => 0x00,
            PlainText => 0x01,
            GraphicControl => 0xF9,
            Comment => 0xFE,
            Application => 0xFF,
            Unknown(n) => n,
        }
    }
}

impl ExtensionCode {
    /// Check if the extension requires GIF89a
    pub(crate) fn is_gif89(self) -> bool {
        use self::ExtensionCode::*;
        matches!(self, PlainText | GraphicControl | Comment | Application)
    }
}

/// One extension block: a function code and its payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionBlock {
    code: ExtensionCode,
    bytes: Vec<u8>,
}

impl ExtensionBlock {
    /// Create a new extension block
    pub fn new(code: ExtensionCode, bytes: Vec<u8>) -> Self {
        ExtensionBlock { code, bytes }
    }

    /// Get the function code
    pub fn code(&self) -> ExtensionCode {
        self.code
    }

    /// Get the payload
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get a mutable payload
    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

/// Screen (canvas) descriptor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    width: u16,
    height: u16,
    color_resolution: u8, // bits per primary color, 1...8
    background_color_idx: u8, // index into global color map
    pixel_aspect_ratio: u8,
    color_map: Option<ColorMap>,
}

impl Default for Screen {
    fn default() -> Self {
        Screen {
            width: 0,
            height: 0,
            color_resolution: 8,
            background_color_idx: 0,
            pixel_aspect_ratio: 0,
            color_map: None,
        }
    }
}

impl Screen {
    pub(crate) const SIZE: usize = 7;
    const COLOR_MAP_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_MAP_SORTED: u8 = 0b0000_1000;
    const COLOR_MAP_SIZE: u8 = 0b0000_0111;

    /// Create a screen descriptor
    pub fn new(width: u16, height: u16) -> Self {
        Screen::default().with_width(width).with_height(height)
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    /// Set color resolution (bits per primary color, clamped to 1...8)
    pub fn with_color_resolution(mut self, bits: u8) -> Self {
        self.color_resolution = bits.clamp(1, 8);
        self
    }
    pub fn color_resolution(&self) -> u8 {
        self.color_resolution
    }
    pub fn with_background_color_idx(mut self, idx: u8) -> Self {
        self.background_color_idx = idx;
        self
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }
    pub fn with_pixel_aspect_ratio(mut self, aspect: u8) -> Self {
        self.pixel_aspect_ratio = aspect;
        self
    }
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
    pub fn with_color_map(mut self, color_map: Option<ColorMap>) -> Self {
        self.color_map = color_map;
        self
    }
    /// Get the global color map
    pub fn color_map(&self) -> Option<&ColorMap> {
        self.color_map.as_ref()
    }

    /// Pack the 7-byte descriptor
    pub(crate) fn to_buf(&self) -> [u8; Self::SIZE] {
        let mut flags = ((self.color_resolution - 1) << 4) & Self::COLOR_RESOLUTION;
        if let Some(map) = &self.color_map {
            flags |= Self::COLOR_MAP_PRESENT;
            flags |= (map.bit_depth() - 1) & Self::COLOR_MAP_SIZE;
            if map.is_sorted() {
                flags |= Self::COLOR_MAP_SORTED;
            }
        }
        let [w0, w1] = self.width.to_le_bytes();
        let [h0, h1] = self.height.to_le_bytes();
        [
            w0,
            w1,
            h0,
            h1,
            flags,
            self.background_color_idx,
            self.pixel_aspect_ratio,
        ]
    }

    /// Unpack the 7-byte descriptor.
    ///
    /// Returns the screen (without color map), the global color map size in
    /// bytes (0 if absent), and its sort flag.
    pub(crate) fn from_buf(buf: &[u8; Self::SIZE]) -> (Self, usize, bool) {
        let flags = buf[4];
        let screen = Screen::new(
            u16::from_le_bytes([buf[0], buf[1]]),
            u16::from_le_bytes([buf[2], buf[3]]),
        )
        .with_color_resolution(((flags & Self::COLOR_RESOLUTION) >> 4) + 1)
        .with_background_color_idx(buf[5])
        .with_pixel_aspect_ratio(buf[6]);
        let map_sz = if flags & Self::COLOR_MAP_PRESENT != 0 {
            map_size_bytes(flags & Self::COLOR_MAP_SIZE)
        } else {
            0
        };
        let sorted = flags & Self::COLOR_MAP_SORTED != 0;
        (screen, map_sz, sorted)
    }
}

/// Get size of a color map in bytes from its packed size field
fn map_size_bytes(size_bits: u8) -> usize {
    3 * (2 << size_bits as usize)
}

/// Image descriptor
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    interlaced: bool,
    color_map: Option<ColorMap>,
}

impl ImageDesc {
    /// Size including the separator byte
    pub(crate) const SIZE: usize = 10;
    const COLOR_MAP_PRESENT: u8 = 0b1000_0000;
    const INTERLACED: u8 = 0b0100_0000;
    const COLOR_MAP_SORTED: u8 = 0b0010_0000;
    const COLOR_MAP_SIZE: u8 = 0b0000_0111;

    /// Create an image descriptor
    pub fn new(width: u16, height: u16) -> Self {
        ImageDesc::default().with_width(width).with_height(height)
    }
    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }
    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    pub fn with_interlaced(mut self, interlaced: bool) -> Self {
        self.interlaced = interlaced;
        self
    }
    pub fn interlaced(&self) -> bool {
        self.interlaced
    }
    pub fn with_color_map(mut self, color_map: Option<ColorMap>) -> Self {
        self.color_map = color_map;
        self
    }
    /// Get the local color map
    pub fn color_map(&self) -> Option<&ColorMap> {
        self.color_map.as_ref()
    }
    /// Get the image size in pixels
    pub fn image_sz(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Pack the 9 bytes following the separator
    pub(crate) fn to_buf(&self) -> [u8; Self::SIZE - 1] {
        let mut flags = 0;
        if self.interlaced {
            flags |= Self::INTERLACED;
        }
        if let Some(map) = &self.color_map {
            flags |= Self::COLOR_MAP_PRESENT;
            flags |= (map.bit_depth() - 1) & Self::COLOR_MAP_SIZE;
            if map.is_sorted() {
                flags |= Self::COLOR_MAP_SORTED;
            }
        }
        let [l0, l1] = self.left.to_le_bytes();
        let [t0, t1] = self.top.to_le_bytes();
        let [w0, w1] = self.width.to_le_bytes();
        let [h0, h1] = self.height.to_le_bytes();
        [l0, l1, t0, t1, w0, w1, h0, h1, flags]
    }

    /// Unpack the 9 bytes following the separator.
    ///
    /// Returns the descriptor (without color map), the local color map size
    /// in bytes (0 if absent), and its sort flag.
    pub(crate) fn from_buf(buf: &[u8; Self::SIZE - 1]) -> (Self, usize, bool) {
        let flags = buf[8];
        let desc = ImageDesc::new(
            u16::from_le_bytes([buf[4], buf[5]]),
            u16::from_le_bytes([buf[6], buf[7]]),
        )
        .with_left(u16::from_le_bytes([buf[0], buf[1]]))
        .with_top(u16::from_le_bytes([buf[2], buf[3]]))
        .with_interlaced(flags & Self::INTERLACED != 0);
        let map_sz = if flags & Self::COLOR_MAP_PRESENT != 0 {
            map_size_bytes(flags & Self::COLOR_MAP_SIZE)
        } else {
            0
        };
        let sorted = flags & Self::COLOR_MAP_SORTED != 0;
        (desc, map_sz, sorted)
    }
}

/// Get row order of an image as stored in the file.
///
/// Interlaced images store rows in four passes: every 8th row from 0, every
/// 8th row from 4, every 4th row from 2, then every 2nd row from 1.
pub(crate) fn row_order(height: usize, interlaced: bool) -> Vec<usize> {
    if interlaced {
        [(0, 8), (4, 8), (2, 4), (1, 2)]
            .iter()
            .flat_map(|&(start, step)| (start..height).step_by(step))
            .collect()
    } else {
        (0..height).collect()
    }
}

/// An image with its descriptor, raster and preceding extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedImage {
    desc: ImageDesc,
    raster: Vec<u8>, // one color index per pixel, in display order
    extensions: Vec<ExtensionBlock>,
}

impl SavedImage {
    /// Create a saved image.
    ///
    /// The raster must contain exactly width × height indices.
    pub fn new(desc: ImageDesc, raster: Vec<u8>) -> Result<Self, EncodeError> {
        if raster.len() != desc.image_sz() {
            return Err(EncodeError::DataTooBig);
        }
        Ok(SavedImage {
            desc,
            raster,
            extensions: vec![],
        })
    }
    /// Create a saved image from a raster known to be the right size
    pub(crate) fn from_parts(desc: ImageDesc, raster: Vec<u8>) -> Self {
        debug_assert_eq!(raster.len(), desc.image_sz());
        SavedImage {
            desc,
            raster,
            extensions: vec![],
        }
    }
    /// Get the image descriptor
    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }
    /// Get the raster (color indices, display order)
    pub fn raster(&self) -> &[u8] {
        &self.raster
    }
    /// Get a mutable raster
    pub fn raster_mut(&mut self) -> &mut [u8] {
        &mut self.raster
    }
    /// Get one row of the raster, or `None` if `y` is out of range
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let width = self.desc.width as usize;
        self.raster.get(y * width..(y + 1) * width)
    }
    /// Get the preceding extension blocks
    pub fn extensions(&self) -> &[ExtensionBlock] {
        &self.extensions
    }
    /// Add an extension block before this image
    pub fn add_extension(&mut self, block: ExtensionBlock) {
        self.extensions.push(block);
    }
    /// Remove all extension blocks
    pub fn clear_extensions(&mut self) {
        self.extensions.clear();
    }
    pub(crate) fn extensions_mut(&mut self) -> &mut Vec<ExtensionBlock> {
        &mut self.extensions
    }
    /// Replace the local color map
    pub fn set_color_map(&mut self, color_map: Option<ColorMap>) {
        self.desc.color_map = color_map;
    }
    /// Translate every pixel through a color index table
    /// (see [ColorMap::union](../color/struct.ColorMap.html#method.union)).
    pub fn apply_translation(&mut self, table: &[u8]) {
        for px in self.raster.iter_mut() {
            if let Some(t) = table.get(*px as usize) {
                *px = *t;
            }
        }
    }
}

/// GIF container: screen, saved images and extension blocks.
///
/// Extension blocks added with [add_extension](#method.add_extension) are
/// pending until the next image is added, which takes ownership of them.
/// Blocks still pending after the last image are trailing extensions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gif {
    screen: Screen,
    images: Vec<SavedImage>,
    extensions: Vec<ExtensionBlock>,
}

impl Gif {
    /// Create a new container
    pub fn new(screen: Screen) -> Self {
        Gif {
            screen,
            images: vec![],
            extensions: vec![],
        }
    }
    /// Get the screen descriptor
    pub fn screen(&self) -> &Screen {
        &self.screen
    }
    /// Get the saved images
    pub fn images(&self) -> &[SavedImage] {
        &self.images
    }
    /// Get mutable saved images
    pub fn images_mut(&mut self) -> &mut [SavedImage] {
        &mut self.images
    }
    /// Get pending / trailing extension blocks
    pub fn extensions(&self) -> &[ExtensionBlock] {
        &self.extensions
    }

    /// Add an image, taking ownership of its raster.
    ///
    /// Pending extension blocks are attached to the new image.
    pub fn add_image(
        &mut self,
        desc: ImageDesc,
        raster: Vec<u8>,
    ) -> Result<&mut SavedImage, EncodeError> {
        let mut image = SavedImage::new(desc, raster)?;
        image.extensions = std::mem::take(&mut self.extensions);
        Ok(self.push_image(image))
    }

    /// Add a saved image, after any pending extension blocks
    pub fn push_image(&mut self, mut image: SavedImage) -> &mut SavedImage {
        if !self.extensions.is_empty() {
            let mut ext = std::mem::take(&mut self.extensions);
            ext.append(&mut image.extensions);
            image.extensions = ext;
        }
        let desc = &image.desc;
        if desc.left as usize + desc.width as usize > self.screen.width as usize
            || desc.top as usize + desc.height as usize
                > self.screen.height as usize
        {
            warn!("image {} outside of screen", self.images.len());
        }
        self.images.push(image);
        let last = self.images.len() - 1;
        &mut self.images[last]
    }

    /// Add a pending extension block
    pub fn add_extension(&mut self, block: ExtensionBlock) {
        self.extensions.push(block);
    }

    /// Add a comment, split into 255-byte sub-blocks
    pub fn add_comment(&mut self, comment: &str) {
        let mut code = ExtensionCode::Comment;
        for chunk in comment.as_bytes().chunks(crate::packet::MAX_SUB_BLOCK) {
            self.add_extension(ExtensionBlock::new(code, chunk.to_vec()));
            code = ExtensionCode::Continuation;
        }
    }

    /// Add a NETSCAPE2.0 looping extension (0 means loop forever)
    pub fn add_loop_count(&mut self, loop_count: u16) {
        let [lo, hi] = loop_count.to_le_bytes();
        self.add_extension(ExtensionBlock::new(
            ExtensionCode::Application,
            b"NETSCAPE2.0".to_vec(),
        ));
        self.add_extension(ExtensionBlock::new(
            ExtensionCode::Continuation,
            vec![1, lo, hi],
        ));
    }

    /// Get the animation loop count, if a looping extension exists
    pub fn loop_count(&self) -> Option<u16> {
        let blocks = self
            .images
            .first()
            .map(|img| img.extensions())
            .unwrap_or(&self.extensions[..]);
        blocks.windows(2).find_map(|w| {
            let (app, data) = (&w[0], &w[1]);
            let looping = app.code == ExtensionCode::Application
                && (app.bytes == b"NETSCAPE2.0" || app.bytes == b"ANIMEXTS1.0")
                && data.code == ExtensionCode::Continuation
                && data.bytes.len() == 3
                && data.bytes[0] == 1;
            if looping {
                Some(u16::from_le_bytes([data.bytes[1], data.bytes[2]]))
            } else {
                None
            }
        })
    }

    /// Get the effective color map for an image (local, else global)
    pub fn effective_color_map<'a>(
        &'a self,
        image: &'a SavedImage,
    ) -> Option<&'a ColorMap> {
        image.desc.color_map().or_else(|| self.screen.color_map())
    }

    /// Get the minimum version required by the extensions present
    pub fn version(&self) -> Version {
        let gif89 = self
            .images
            .iter()
            .flat_map(|img| img.extensions.iter())
            .chain(self.extensions.iter())
            .any(|b| b.code.is_gif89());
        if gif89 {
            Version::Gif89a
        } else {
            Version::Gif87a
        }
    }

    /// Get the LZW code size for a color map
    pub(crate) fn code_size(map: &ColorMap) -> u8 {
        map.bit_depth().max(2)
    }

    /// Check whether every pixel indexes into its effective color map
    pub fn validate(&self) -> Result<(), EncodeError> {
        for image in &self.images {
            let map = self
                .effective_color_map(image)
                .ok_or(EncodeError::NoColorMap)?;
            let max = map.len();
            if image.raster.iter().any(|px| *px as usize >= max) {
                return Err(EncodeError::InvalidColorIndex);
            }
        }
        Ok(())
    }
}

/// Get the smallest color map size (bits) that can index every pixel
pub fn raster_bits(raster: &[u8]) -> u8 {
    let max = raster.iter().copied().max().unwrap_or(0) as usize;
    bit_size(max + 1)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::Color;

    fn two_colors() -> ColorMap {
        ColorMap::new(&[Color::new(0, 0, 0), Color::new(255, 255, 255)])
            .unwrap()
    }

    #[test]
    fn screen_buf() {
        let screen = Screen::new(10, 300)
            .with_color_resolution(3)
            .with_background_color_idx(1)
            .with_pixel_aspect_ratio(49)
            .with_color_map(Some(two_colors().with_sorted(true)));
        let buf = screen.to_buf();
        assert_eq!(buf, [10, 0, 44, 1, 0b1010_1000, 1, 49]);
        let (s, map_sz, sorted) = Screen::from_buf(&buf);
        assert_eq!(map_sz, 6);
        assert!(sorted);
        assert_eq!(s.width(), 10);
        assert_eq!(s.height(), 300);
        assert_eq!(s.color_resolution(), 3);
        assert_eq!(s.background_color_idx(), 1);
        assert_eq!(s.pixel_aspect_ratio(), 49);
        assert_eq!(s.color_map(), None);
    }

    #[test]
    fn image_desc_buf() {
        let map = ColorMap::new(&[Color::default(); 16]).unwrap();
        let desc = ImageDesc::new(4, 2)
            .with_left(1)
            .with_top(258)
            .with_interlaced(true)
            .with_color_map(Some(map));
        let buf = desc.to_buf();
        assert_eq!(buf, [1, 0, 2, 1, 4, 0, 2, 0, 0b1100_0011]);
        let (d, map_sz, sorted) = ImageDesc::from_buf(&buf);
        assert_eq!(map_sz, 48);
        assert!(!sorted);
        assert!(d.interlaced());
        assert_eq!((d.left(), d.top()), (1, 258));
        assert_eq!(d.image_sz(), 8);
    }

    #[test]
    fn interlace_rows() {
        assert_eq!(row_order(4, false), [0, 1, 2, 3]);
        assert_eq!(row_order(10, true), [0, 8, 4, 2, 6, 1, 3, 5, 7, 9]);
        assert_eq!(row_order(1, true), [0]);
        assert_eq!(row_order(0, true), [] as [usize; 0]);
    }

    #[test]
    fn pending_extensions() -> Result<(), EncodeError> {
        let mut gif = Gif::new(Screen::new(2, 2).with_color_map(Some(two_colors())));
        assert_eq!(gif.version(), Version::Gif87a);
        gif.add_comment("first");
        gif.add_image(ImageDesc::new(2, 2), vec![0, 1, 1, 0])?;
        gif.add_comment("trailing");
        assert_eq!(gif.images()[0].extensions().len(), 1);
        assert_eq!(gif.images()[0].extensions()[0].bytes(), b"first");
        assert_eq!(gif.extensions().len(), 1);
        assert_eq!(gif.version(), Version::Gif89a);
        Ok(())
    }

    #[test]
    fn raster_length_checked() {
        let mut gif = Gif::new(Screen::new(2, 2));
        let res = gif.add_image(ImageDesc::new(2, 2), vec![0; 3]);
        assert!(matches!(res, Err(EncodeError::DataTooBig)));
        assert!(gif.images().is_empty());
    }

    #[test]
    fn effective_map() -> Result<(), EncodeError> {
        let local = ColorMap::new(&[Color::new(1, 2, 3); 4]).unwrap();
        let mut gif = Gif::new(Screen::new(2, 1));
        gif.add_image(ImageDesc::new(2, 1), vec![0, 1])?;
        assert!(gif.effective_color_map(&gif.images()[0]).is_none());
        assert!(matches!(gif.validate(), Err(EncodeError::NoColorMap)));
        gif.images_mut()[0].set_color_map(Some(local.clone()));
        assert_eq!(gif.effective_color_map(&gif.images()[0]), Some(&local));
        assert!(gif.validate().is_ok());
        gif.images_mut()[0].raster_mut()[1] = 4;
        assert!(matches!(gif.validate(), Err(EncodeError::InvalidColorIndex)));
        Ok(())
    }

    #[test]
    fn long_comment() {
        let mut gif = Gif::default();
        let text = "x".repeat(300);
        gif.add_comment(&text);
        let ext = gif.extensions();
        assert_eq!(ext.len(), 2);
        assert_eq!(ext[0].code(), ExtensionCode::Comment);
        assert_eq!(ext[0].bytes().len(), 255);
        assert_eq!(ext[1].code(), ExtensionCode::Continuation);
        assert_eq!(ext[1].bytes().len(), 45);
    }

    #[test]
    fn loop_count() -> Result<(), EncodeError> {
        let mut gif = Gif::new(Screen::new(1, 1));
        assert_eq!(gif.loop_count(), None);
        gif.add_loop_count(4);
        assert_eq!(gif.loop_count(), Some(4));
        gif.add_image(ImageDesc::new(1, 1), vec![0])?;
        assert_eq!(gif.loop_count(), Some(4));
        Ok(())
    }

    #[test]
    fn translation() -> Result<(), EncodeError> {
        let mut image = SavedImage::new(ImageDesc::new(2, 2), vec![0, 1, 2, 1])?;
        image.apply_translation(&[3, 0, 1]);
        assert_eq!(image.raster(), &[3, 0, 1, 0]);
        assert_eq!(image.row(1), Some(&[1, 0][..]));
        assert_eq!(image.row(2), None);
        assert_eq!(raster_bits(image.raster()), 2);
        Ok(())
    }
}
