use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use matollama::core::decoder::decode_all;

fn chunk_line(content: &str) -> String {
    let escaped = serde_json::to_string(content).unwrap_or_default();
    format!(r#"{{"model":"bench","message":{{"role":"assistant","content":{escaped}}},"done":false}}"#)
}

fn make_body(n_chunks: usize, with_think: bool) -> Vec<u8> {
    let mut body = String::new();
    if with_think {
        body.push_str(&chunk_line("<think>"));
        body.push('\n');
    }
    for i in 0..n_chunks {
        if with_think && i == n_chunks / 2 {
            body.push_str(&chunk_line("</think>"));
            body.push('\n');
        }
        body.push_str(&chunk_line("lorem ipsum dolor sit amet "));
        body.push('\n');
    }
    body.push_str(
        r#"{"model":"bench","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop","eval_count":1000,"eval_duration":1000000000}"#,
    );
    body.push('\n');
    body.into_bytes()
}

fn bench_decoder(c: &mut Criterion) {
    for &chunks in &[200usize, 2000usize] {
        let mut group = c.benchmark_group(format!("decoder_chunks{chunks}"));

        for &with_think in &[false, true] {
            let body = make_body(chunks, with_think);
            group.throughput(Throughput::Bytes(body.len() as u64));
            let label = if with_think { "think" } else { "plain" };

            // One fragment per body: framing cost only.
            group.bench_function(BenchmarkId::new("whole", label), |b| {
                b.iter(|| decode_all([body.as_slice()], true))
            });

            // Network-sized fragments that split lines and markers.
            group.bench_function(BenchmarkId::new("split_61", label), |b| {
                b.iter(|| decode_all(body.chunks(61), true))
            });
        }

        group.finish();
    }
}

criterion_group!(benches, bench_decoder);
criterion_main!(benches);
