use std::io::Read;

use blockz_decoder::{CompressedInputStream, DecoderConfig};
use blockz_driver::Listeners;
use blockz_driver::decompressor::{open_decoder, pump};
use blockz_tests::{container, sample_payload};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn bench_decode_jobs(c: &mut Criterion) {
    let payload = sample_payload(8 * 1024 * 1024);
    let encoded = container(&payload, 256 * 1024, 1);

    let mut group = c.benchmark_group("decode_jobs");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    for jobs in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(jobs), &jobs, |b, &jobs| {
            b.iter(|| {
                let mut stream =
                    CompressedInputStream::new(encoded.as_slice(), DecoderConfig { jobs }).unwrap();
                let mut out = Vec::with_capacity(payload.len());
                stream.read_to_end(&mut out).unwrap();
                out
            });
        });
    }
    group.finish();
}

fn bench_pump_to_null(c: &mut Criterion) {
    let payload = sample_payload(4 * 1024 * 1024);
    let listeners = Listeners::new();

    let mut group = c.benchmark_group("pump_block_size");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    for block_size in [16 * 1024usize, 256 * 1024, 1024 * 1024] {
        let encoded = container(&payload, block_size, 1);
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &encoded,
            |b, encoded| {
                b.iter(|| {
                    let decoder = open_decoder(encoded.as_slice(), 1, &listeners).unwrap();
                    pump(decoder, &mut std::io::sink(), &listeners).unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_decode_jobs, bench_pump_to_null);
criterion_main!(benches);
