use criterion::{black_box, criterion_group, criterion_main, Criterion};
use snmp_reader::core::Reader;
use snmp_reader::displayers::{render_info, render_label};
use snmp_reader_core::{INFO_BUFFER_LEN, LABEL_BUFFER_LEN};
use snmp_reader_snmp::{
    build_get_request, decode_response, resolve, Decoded, Message, PduType, Value,
};
use snmp_reader_types::{ReaderConfig, SnmpVersion};

const ELEMENTS: &[&str] = &["10.2", "16.2", "11.2", "17.2"];

fn reader() -> Reader {
    let (reader, _) = Reader::new(ReaderConfig {
        label: "wan".to_string(),
        host: "gw".to_string(),
        oid_base: "IF-MIB::ifEntry".to_string(),
        elements: ELEMENTS.iter().map(|e| e.to_string()).collect(),
        delta: true,
        template: "$L in $S0 out $S1 ($2/$3 pkts) every $Is".to_string(),
        ..ReaderConfig::default()
    });
    reader
}

fn response(uptime: u32, base: u32) -> Vec<u8> {
    let oids: Vec<_> = ELEMENTS
        .iter()
        .filter_map(|e| resolve(&format!("IF-MIB::ifEntry.{}", e)).ok())
        .collect();
    let mut message = build_get_request(SnmpVersion::V2c, "public", 4242, &oids);
    message.pdu_type = PduType::Response;
    for (i, (_, value)) in message.varbinds.iter_mut().enumerate() {
        *value = if i == 0 {
            Value::TimeTicks(uptime)
        } else {
            Value::Counter32(base + i as u32 * 1_000_000)
        };
    }
    message.encode()
}

fn decode(bytes: &[u8]) -> Decoded {
    match Message::decode(bytes) {
        Ok(message) => decode_response(&message),
        Err(_) => Decoded::Timeout,
    }
}

fn bench_decode(c: &mut Criterion) {
    let bytes = response(8_640_000, 3_000_000);
    c.bench_function("decode_response", |b| b.iter(|| decode(black_box(&bytes))));
}

fn bench_render(c: &mut Criterion) {
    let mut reader = reader();
    reader.ingest(decode(&response(8_640_000, 3_000_000)));
    reader.commit();
    reader.ingest(decode(&response(8_641_000, 93_000_000)));

    c.bench_function("render_label", |b| {
        b.iter(|| render_label(black_box(&reader), LABEL_BUFFER_LEN))
    });
    c.bench_function("render_info", |b| {
        b.iter(|| render_info(black_box(&reader), INFO_BUFFER_LEN))
    });
}

criterion_group!(benches, bench_decode, bench_render);
criterion_main!(benches);
