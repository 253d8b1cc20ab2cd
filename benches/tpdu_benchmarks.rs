// ABOUTME: Benchmark suite for TPDU encoding, decoding and reassembly
// ABOUTME: Measures septet packing, per-type codecs and multi-part reassembly throughput

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sms_tpdu::alphabet;
use sms_tpdu::segmentation::segment_deliver;
use sms_tpdu::{
    Address, DataCodingScheme, Deliver, Encodable, Message, Reassembler, Submit, Timestamp, Tpdu,
    ValidityPeriod,
};
use std::time::Duration;

fn sample_timestamp() -> Timestamp {
    Timestamp::new(2009, 8, 7, 6, 5, 4).unwrap()
}

fn sample_deliver() -> Deliver {
    Deliver::new(
        Address::international("46708251358").unwrap(),
        "The quick brown fox jumped over the lazy dog. [{}]",
        sample_timestamp(),
    )
}

fn sample_submit() -> Submit {
    Submit::new(
        Address::international("61416271170").unwrap(),
        "Hello poopyhead © ® ¡",
    )
    .with_data_coding(DataCodingScheme::UCS2)
    .with_validity_period(ValidityPeriod::Relative(0xA7))
}

fn bench_septet_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("septet_packing");
    group.measurement_time(Duration::from_secs(10));

    let text = "The quick brown fox jumped over the lazy dog. ".repeat(3);
    let (packed, septets) = alphabet::pack_septets(&text);

    group.bench_function("pack", |b| b.iter(|| alphabet::pack_septets(black_box(&text))));
    group.bench_function("unpack", |b| {
        b.iter(|| alphabet::unpack_septets(black_box(&packed), septets))
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.measurement_time(Duration::from_secs(10));

    let deliver_bytes = Tpdu::Deliver(sample_deliver()).to_bytes().unwrap();
    let submit_bytes = Tpdu::Submit(sample_submit()).to_bytes().unwrap();

    group.bench_function("deliver", |b| {
        b.iter(|| Message::decode(black_box(&deliver_bytes)).unwrap())
    });
    group.bench_function("submit_ucs2", |b| {
        b.iter(|| Message::decode(black_box(&submit_bytes)).unwrap())
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.measurement_time(Duration::from_secs(10));

    let deliver = Tpdu::Deliver(sample_deliver());
    let submit = Tpdu::Submit(sample_submit());

    group.bench_function("deliver", |b| b.iter(|| black_box(&deliver).to_bytes()));
    group.bench_function("submit_ucs2", |b| b.iter(|| black_box(&submit).to_bytes()));

    group.finish();
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassembly");
    group.measurement_time(Duration::from_secs(10));

    let origin = Address::international("46708251358").unwrap();
    for parts in [2usize, 5, 10].iter() {
        let text = "x".repeat(153 * parts);
        let messages: Vec<Message> = segment_deliver(&origin, &text, sample_timestamp(), 7)
            .unwrap()
            .into_iter()
            .map(|d| Message::from_tpdu(Tpdu::Deliver(d)).unwrap())
            .collect();

        group.bench_with_input(BenchmarkId::new("parts", parts), &messages, |b, messages| {
            b.iter(|| {
                let reassembler = Reassembler::default();
                let mut complete = None;
                for message in messages.iter().rev() {
                    complete = reassembler.submit(message.clone());
                }
                black_box(complete)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_septet_packing,
    bench_decode,
    bench_encode,
    bench_reassembly
);
criterion_main!(benches);
