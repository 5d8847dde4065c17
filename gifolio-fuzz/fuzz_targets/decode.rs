// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use std::io::Cursor;
use libfuzzer_sys::fuzz_target;

use gifolio::{Decoder, Encoder};

fuzz_target!(|data: &[u8]| {
    if let Ok(gif) = Decoder::new(Cursor::new(data)).slurp() {
        if gif.validate().is_ok() && !gif.images().is_empty() {
            let buf = Encoder::new(vec![]).spew(&gif).unwrap();
            assert_eq!(Decoder::new(&buf[..]).slurp().unwrap(), gif);
        }
    }
});
