// Raster encoding example
use gifolio::block::{Gif, SavedImage, Screen};
use gifolio::color::ColorMap;
use gifolio::Encoder;
use pix::{gray::Gray8, rgb::SRgb8, Palette, Raster};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let mut raster = Raster::with_clear(4, 4);
    *raster.pixel_mut(0, 0) = Gray8::new(1);
    *raster.pixel_mut(1, 1) = Gray8::new(1);
    *raster.pixel_mut(2, 2) = Gray8::new(1);
    *raster.pixel_mut(3, 3) = Gray8::new(1);
    let mut palette = Palette::new(2);
    palette.set_entry(SRgb8::new(0xFF, 0, 0));
    palette.set_entry(SRgb8::new(0xFF, 0xFF, 0));
    let screen = Screen::new(4, 4).with_color_map(ColorMap::from_palette(&palette));
    let mut gif = Gif::new(screen);
    gif.push_image(SavedImage::with_indexed(0, 0, &raster)?);
    Encoder::create("enc_raster.gif")?.spew(&gif)?;
    Ok(())
}
