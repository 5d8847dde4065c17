use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gifolio::{Decoder, Encoder};
use std::io::Cursor;

mod common;

fn decode_slurp(crit: &mut Criterion) {
    let gif = common::animation(160, 120, 8);
    let data = Encoder::new(vec![]).spew(&gif).unwrap();

    crit.bench_function("decode_slurp", |b| {
        b.iter(|| {
            let decoder = Decoder::new(Cursor::new(black_box(&data[..])));
            black_box(decoder.slurp().unwrap());
        })
    });
}

criterion_group!(benches, decode_slurp);
criterion_main!(benches);
