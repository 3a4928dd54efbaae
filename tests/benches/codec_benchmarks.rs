//! # QR Codec Benchmarks
//!
//! | Operation | Runs | Target |
//! |-----------|------|--------|
//! | Fixed-interval split | once per request | < 1ms for 4 KiB |
//! | Fountain frame | every 200ms tick | < 100µs |
//! | Fountain decode | per scanned frame | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use sc_01_fountain_qr::domain::split_chunks;
use sc_01_fountain_qr::{Decoder, FixedIntervalEncoder, FountainDecoder, FountainEncoder, FrameSource};

const UR_TYPE: &str = "ton-sign-request";

fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}

fn bench_fixed_interval(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-01-fixed-interval");

    for len in [256usize, 1024, 4096] {
        let payload = hex::encode(random_bytes(len));
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::new("split_chunks", len), &payload, |b, payload| {
            b.iter(|| black_box(split_chunks(payload, 256)))
        });
    }

    let payload = hex::encode(random_bytes(2048));
    group.bench_function("next_frame", |b| {
        let mut encoder = FixedIntervalEncoder::new(&payload, 256).unwrap();
        b.iter(|| black_box(encoder.next_frame()))
    });

    group.finish();
}

fn bench_fountain(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-01-fountain");

    for len in [512usize, 2048, 8192] {
        let message = random_bytes(len);
        group.throughput(Throughput::Bytes(len as u64));

        group.bench_with_input(BenchmarkId::new("encode_frame", len), &message, |b, message| {
            let mut encoder = FountainEncoder::new(UR_TYPE, message, 100).unwrap();
            b.iter(|| black_box(encoder.next_frame()))
        });

        // Mixed parts only, so the decoder has to peel XOR combinations.
        let encoder = FountainEncoder::new(UR_TYPE, &message, 100).unwrap();
        let start = encoder.seq_len() as u32 + 1;
        let frames: Vec<String> = (start..start + 4 * encoder.seq_len() as u32)
            .map(|seq| encoder.frame(seq).unwrap())
            .collect();

        group.bench_with_input(BenchmarkId::new("decode", len), &frames, |b, frames| {
            b.iter(|| {
                let mut decoder = FountainDecoder::new(UR_TYPE).unwrap();
                for frame in frames {
                    if decoder.is_complete() {
                        break;
                    }
                    let _ = decoder.receive(frame);
                }
                black_box(decoder.result())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fixed_interval, bench_fountain);
criterion_main!(benches);
