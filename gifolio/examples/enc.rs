// Encoding example
use gifolio::block::{Gif, ImageDesc, Screen};
use gifolio::color::{Color, ColorMap};
use gifolio::gcb::GraphicsControl;
use gifolio::Encoder;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let colors = [Color::new(0, 0, 0), Color::new(255, 255, 255)];
    let screen = Screen::new(4, 4).with_color_map(ColorMap::new(&colors));
    let mut gif = Gif::new(screen);
    gif.add_loop_count(0);
    gif.add_comment("checkers");
    #[rustfmt::skip]
    let raster = vec![
        1, 0, 0, 1,
        0, 1, 1, 0,
        0, 1, 1, 0,
        1, 0, 0, 1,
    ];
    let image = gif.add_image(ImageDesc::new(4, 4), raster)?;
    image.set_graphics_control(&GraphicsControl::default().with_delay_time_cs(50));
    let inverse = gif.images()[0].raster().iter().map(|px| 1 - px).collect();
    let image = gif.add_image(ImageDesc::new(4, 4), inverse)?;
    image.set_graphics_control(&GraphicsControl::default().with_delay_time_cs(50));
    Encoder::create("enc.gif")?.spew(&gif)?;
    Ok(())
}
