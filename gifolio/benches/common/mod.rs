use gifolio::block::{Gif, ImageDesc, Screen};
use gifolio::color::{Color, ColorMap};

/// Build an animation with gradient images
pub fn animation(width: u16, height: u16, images: usize) -> Gif {
    let colors: Vec<Color> = (0..=255)
        .map(|i| Color::new(i, 255 - i, i / 2))
        .collect();
    let screen = Screen::new(width, height).with_color_map(ColorMap::new(&colors));
    let mut gif = Gif::new(screen);
    gif.add_loop_count(0);
    for n in 0..images {
        let raster = (0..height as usize)
            .flat_map(|y| {
                (0..width as usize).map(move |x| ((x + y * 2 + n * 8) / 3) as u8)
            })
            .collect();
        gif.add_image(ImageDesc::new(width, height), raster)
            .expect("raster size");
    }
    gif
}
