//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Benchmarks for atmodem-codec performance

use atmodem_codec::charset::{gsm, ucs2};
use atmodem_codec::{Command, LineCodec, parse_packet};
use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tokio_util::codec::Decoder;

// ============================================================================
// Line Decoding Benchmarks
// ============================================================================

fn listing(entries: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..entries {
        out.extend_from_slice(
            format!(
                "+CMGL: {},\"REC READ\",\"+15551234\",,\"21/03/15,10:20:30+32\"\r\nBody {}\r\n",
                i, i
            )
            .as_bytes(),
        );
    }
    out.extend_from_slice(b"\r\nOK\r\n");
    out
}

fn bench_decode_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_listing");

    for entries in [1, 10, 100].iter() {
        let input = listing(*entries);
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(entries), &input, |b, input| {
            let mut codec = LineCodec::new();
            b.iter(|| {
                let mut buffer = BytesMut::from(&input[..]);
                let mut count = 0;
                while let Some(line) = codec.decode(&mut buffer).unwrap() {
                    black_box(line);
                    count += 1;
                }
                count
            });
        });
    }

    group.finish();
}

// ============================================================================
// Formatting And Parsing Benchmarks
// ============================================================================

fn bench_format_command(c: &mut Criterion) {
    c.bench_function("format_send_command", |b| {
        b.iter(|| {
            Command::new("+CSMP")
                .args(black_box([49, 167, 0, 8]))
                .to_line()
                .unwrap()
        });
    });
}

fn bench_parse_packet(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_packet");

    group.bench_function("list_entry", |b| {
        b.iter(|| {
            parse_packet(
                black_box(""),
                black_box("+CMGL: 1,\"REC READ\",\"+15551234\",,\"21/03/15,10:20:30+32\""),
                black_box("Hello"),
            )
            .unwrap()
        });
    });

    group.bench_function("storage_areas", |b| {
        b.iter(|| {
            parse_packet(
                black_box("OK"),
                black_box("+CPMS: (\"SM\",\"ME\",\"MT\"),(\"SM\",\"ME\"),(\"SM\")"),
                black_box(""),
            )
            .unwrap()
        });
    });

    group.finish();
}

// ============================================================================
// Character Set Benchmarks
// ============================================================================

fn bench_charsets(c: &mut Criterion) {
    let mut group = c.benchmark_group("charsets");
    let latin = "The quick brown fox jumps over the lazy dog. {€}";
    let persian = "سلام دنیا ۱۲۳۴";

    group.bench_function("gsm_encode", |b| b.iter(|| gsm::encode(black_box(latin))));
    group.bench_function("gsm_pack", |b| {
        let septets = gsm::encode(latin);
        b.iter(|| gsm::pack(black_box(&septets)))
    });
    group.bench_function("ucs2_encode", |b| {
        b.iter(|| ucs2::encode(black_box(persian)))
    });
    group.bench_function("ucs2_decode", |b| {
        let hex = ucs2::encode(persian);
        b.iter(|| ucs2::decode(black_box(&hex)).unwrap())
    });

    group.finish();
}

criterion_group!(decoding_benches, bench_decode_listing);

criterion_group!(parsing_benches, bench_format_command, bench_parse_packet);

criterion_group!(charset_benches, bench_charsets);

criterion_main!(decoding_benches, parsing_benches, charset_benches);
