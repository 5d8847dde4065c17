// raster.rs
//
// Copyright (c) 2020-2026  Douglas Lau
//
//! Conversion to and from `pix` rasters and palettes
use crate::block::{ImageDesc, SavedImage};
use crate::color::{Color, ColorMap};
use crate::error::{DecodeError, EncodeError};
use pix::gray::Gray8;
use pix::rgb::{Rgb, SRgb8, SRgba8};
use pix::{Palette, Raster};

impl ColorMap {
    /// Create a color map from a `pix` palette.
    ///
    /// Returns `None` if the palette is empty.
    pub fn from_palette(palette: &Palette) -> Option<Self> {
        let colors: Vec<Color> = (0..palette.len())
            .filter_map(|i| palette.entry(i))
            .map(|clr| {
                Color::new(
                    u8::from(Rgb::red(clr)),
                    u8::from(Rgb::green(clr)),
                    u8::from(Rgb::blue(clr)),
                )
            })
            .collect();
        ColorMap::new(&colors)
    }

    /// Convert to a `pix` palette.
    ///
    /// Duplicate colors (such as black padding) share one palette entry, so
    /// a table mapping color map indices to palette indices is returned too.
    pub fn to_palette(&self) -> (Palette, Vec<u8>) {
        let mut palette = Palette::new(self.len());
        let mut table = Vec::with_capacity(self.len());
        for c in self.colors() {
            let idx = palette
                .set_entry(SRgb8::new(c.red, c.green, c.blue))
                .unwrap_or_default();
            table.push(idx as u8);
        }
        (palette, table)
    }
}

impl SavedImage {
    /// Create a saved image from an indexed raster
    pub fn with_indexed(
        left: u16,
        top: u16,
        raster: &Raster<Gray8>,
    ) -> Result<Self, EncodeError> {
        let width =
            u16::try_from(raster.width()).map_err(|_| EncodeError::DataTooBig)?;
        let height =
            u16::try_from(raster.height()).map_err(|_| EncodeError::DataTooBig)?;
        let desc = ImageDesc::new(width, height).with_left(left).with_top(top);
        SavedImage::new(desc, raster.as_u8_slice().to_vec())
    }

    /// Get the color indices as an indexed raster
    pub fn to_indexed(&self) -> Raster<Gray8> {
        let desc = self.desc();
        Raster::with_u8_buffer(
            desc.width().into(),
            desc.height().into(),
            self.raster().to_vec(),
        )
    }

    /// Get an indexed raster with a matching palette.
    ///
    /// Colors come from the local color map, or `global` if there is none.
    pub fn to_indexed_palette(
        &self,
        global: Option<&ColorMap>,
    ) -> Result<(Raster<Gray8>, Palette), DecodeError> {
        let map = self
            .desc()
            .color_map()
            .or(global)
            .ok_or(DecodeError::NoColorMap)?;
        let (palette, table) = map.to_palette();
        let buf = self
            .raster()
            .iter()
            .map(|&idx| table.get(idx as usize).copied().unwrap_or(idx))
            .collect::<Vec<u8>>();
        let desc = self.desc();
        let raster =
            Raster::with_u8_buffer(desc.width().into(), desc.height().into(), buf);
        Ok((raster, palette))
    }

    /// Convert to an RGBA raster.
    ///
    /// Colors come from the local color map, or `global` if there is none.
    /// The transparent color index (from the graphic control extension) has
    /// an alpha of zero.
    pub fn to_raster(
        &self,
        global: Option<&ColorMap>,
    ) -> Result<Raster<SRgba8>, DecodeError> {
        let map = self
            .desc()
            .color_map()
            .or(global)
            .ok_or(DecodeError::NoColorMap)?;
        let transparent = self.graphics_control()?.transparent_color();
        let pixels: Vec<SRgba8> = self
            .raster()
            .iter()
            .map(|&idx| {
                let c = map.color(idx).unwrap_or_default();
                let alpha = if Some(idx) == transparent { 0 } else { 0xFF };
                SRgba8::new(c.red, c.green, c.blue, alpha)
            })
            .collect();
        let desc = self.desc();
        Ok(Raster::with_pixels(
            desc.width().into(),
            desc.height().into(),
            pixels,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gcb::GraphicsControl;
    use std::error::Error;

    #[test]
    fn palette() {
        let mut palette = Palette::new(4);
        palette.set_entry(SRgb8::new(0xFF, 0, 0));
        palette.set_entry(SRgb8::new(0, 0xFF, 0));
        palette.set_entry(SRgb8::new(0, 0, 0xFF));
        let map = ColorMap::from_palette(&palette).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.color(2), Some(Color::new(0, 0, 0xFF)));
        assert_eq!(map.color(3), Some(Color::default()));
        let (palette, table) = map.to_palette();
        assert_eq!(palette.len(), 4);
        assert_eq!(table, [0, 1, 2, 3]);
        assert_eq!(palette.entry(1), Some(SRgb8::new(0, 0xFF, 0)));
        assert!(ColorMap::from_palette(&Palette::new(2)).is_none());
    }

    #[test]
    fn palette_duplicates() -> Result<(), Box<dyn Error>> {
        let a = Color::new(1, 2, 3);
        let b = Color::new(4, 5, 6);
        let c = Color::new(7, 8, 9);
        let map = ColorMap::new(&[a, b, a, c]).unwrap();
        let (palette, table) = map.to_palette();
        assert_eq!(palette.len(), 3);
        assert_eq!(table, [0, 1, 0, 2]);
        for (i, t) in table.iter().enumerate() {
            let clr = map.color(i as u8).unwrap();
            let entry = palette.entry(*t as usize).unwrap();
            assert_eq!(entry, SRgb8::new(clr.red, clr.green, clr.blue));
        }
        let desc = ImageDesc::new(4, 1).with_color_map(Some(map));
        let image = SavedImage::new(desc, vec![3, 2, 1, 0])?;
        let (raster, palette) = image.to_indexed_palette(None)?;
        assert_eq!(raster.as_u8_slice(), &[2, 0, 1, 0]);
        assert_eq!(palette.entry(2), Some(SRgb8::new(7, 8, 9)));
        Ok(())
    }

    #[test]
    fn indexed() -> Result<(), Box<dyn Error>> {
        let mut raster = Raster::<Gray8>::with_clear(3, 2);
        *raster.pixel_mut(1, 0) = Gray8::new(2);
        *raster.pixel_mut(2, 1) = Gray8::new(1);
        let image = SavedImage::with_indexed(4, 5, &raster)?;
        assert_eq!((image.desc().left(), image.desc().top()), (4, 5));
        assert_eq!(image.raster(), &[0, 2, 0, 0, 0, 1]);
        let copy = image.to_indexed();
        assert_eq!((copy.width(), copy.height()), (3, 2));
        assert_eq!(copy.as_u8_slice(), raster.as_u8_slice());
        Ok(())
    }

    #[test]
    fn true_color() -> Result<(), Box<dyn Error>> {
        let global = ColorMap::new(&[
            Color::new(10, 20, 30),
            Color::new(40, 50, 60),
        ])
        .unwrap();
        let mut image = SavedImage::new(ImageDesc::new(2, 1), vec![1, 0])?;
        assert!(matches!(
            image.to_raster(None),
            Err(DecodeError::NoColorMap)
        ));
        let raster = image.to_raster(Some(&global))?;
        assert_eq!(
            raster.pixels(),
            &[SRgba8::new(40, 50, 60, 0xFF), SRgba8::new(10, 20, 30, 0xFF)]
        );
        image.set_graphics_control(
            &GraphicsControl::default().with_transparent_color(Some(1)),
        );
        let raster = image.to_raster(Some(&global))?;
        assert_eq!(raster.pixels()[0], SRgba8::new(40, 50, 60, 0));
        assert_eq!(raster.pixels()[1], SRgba8::new(10, 20, 30, 0xFF));
        Ok(())
    }
}
