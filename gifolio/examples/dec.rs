// Decoding example
use gifolio::Decoder;
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    match env::args().nth(1) {
        Some(path) => decode(&path),
        None => {
            eprintln!("usage: dec [filename]");
            Ok(())
        }
    }
}

fn decode(path: &str) -> Result<(), Box<dyn Error>> {
    let gif = Decoder::open(path)?.slurp()?;
    println!("screen: {:?}", gif.screen());
    for image in gif.images() {
        println!("image: {:?}", image.desc());
        for ext in image.extensions() {
            println!("  extension: {:?}", ext.code());
        }
    }
    for ext in gif.extensions() {
        println!("trailing extension: {:?}", ext.code());
    }
    Ok(())
}
