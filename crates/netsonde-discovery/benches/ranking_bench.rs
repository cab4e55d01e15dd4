use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use netsonde_discovery::{CandidateRecord, Coordinates, parse_servers, rank};

fn records(count: usize) -> Vec<CandidateRecord> {
    (0..count)
        .map(|i| {
            let lat = ((i * 37) % 180) as f64 - 90.0;
            let lon = ((i * 91) % 360) as f64 - 180.0;
            CandidateRecord::new(
                format!("http://speedtest{i}.example.net:8080/speedtest/upload.php"),
                lat.to_string(),
                lon.to_string(),
            )
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let origin = Coordinates::new(40.7128, -74.006);
    let mut group = c.benchmark_group("rank");

    for count in [100, 500, 2000] {
        let input = records(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| rank(black_box(origin), black_box(input)))
        });
    }

    group.finish();
}

fn bench_parse_servers(c: &mut Criterion) {
    let mut xml = String::from("<settings><servers>");
    for record in records(1000) {
        xml.push_str(&format!(
            r#"<server url="{}" lat="{}" lon="{}" name="Bench" country="Nowhere" sponsor="Bench" id="1"/>"#,
            record.url.unwrap_or_default(),
            record.lat.unwrap_or_default(),
            record.lon.unwrap_or_default()
        ));
    }
    xml.push_str("</servers></settings>");

    let mut group = c.benchmark_group("parse_servers");
    group.throughput(Throughput::Bytes(xml.len() as u64));
    group.bench_function("1000_servers", |b| b.iter(|| parse_servers(black_box(&xml))));
    group.finish();
}

criterion_group!(benches, bench_rank, bench_parse_servers);
criterion_main!(benches);
