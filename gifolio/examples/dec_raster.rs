// Raster decoding example
use gifolio::Decoder;
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let path = env::args().nth(1).ok_or("usage: dec_raster [filename]")?;
    decode(&path)
}

fn decode(path: &str) -> Result<(), Box<dyn Error>> {
    let gif = Decoder::open(path)?.slurp()?;
    for image in gif.images() {
        let raster = image.to_raster(gif.screen().color_map())?;
        println!("raster: {:?}x{:?}", raster.width(), raster.height());
    }
    Ok(())
}
