// Streaming decoding example
use gifolio::record::RecordType;
use gifolio::Decoder;
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let path = env::args().nth(1).ok_or("usage: dec_stream [filename]")?;
    let mut reader = Decoder::open(path)?.into_reader();
    let screen = reader.screen_desc()?;
    println!("screen: {}x{}", screen.width(), screen.height());
    loop {
        match reader.record_type()? {
            RecordType::ImageDesc => {
                let desc = reader.image_desc()?;
                if desc.image_sz() > 0 {
                    let mut line = vec![0; desc.width().into()];
                    for _ in 0..desc.height() {
                        reader.line(&mut line)?;
                    }
                }
                println!("image: {}x{}", desc.width(), desc.height());
            }
            RecordType::Extension => {
                let (code, mut block) = reader.extension()?;
                let mut len = 0;
                while let Some(bytes) = block {
                    len += bytes.len();
                    block = reader.extension_next()?;
                }
                println!("extension: {:?} {} bytes", code, len);
            }
            RecordType::Terminate => break,
        }
    }
    Ok(())
}
