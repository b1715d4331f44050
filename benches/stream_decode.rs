//! Stream decoding performance benchmarks
//!
//! Measures the non-I/O parts of the relay path: decoding single completion
//! chunks, decoding a whole SSE body into fragments, and rewriting error
//! messages.
//!
//! Run with: `cargo bench`

use chat_relay::{
    config::Config,
    error::user_facing_message,
    upstream::{stream::decode_chunk, text_fragments},
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures::{StreamExt, executor::block_on, stream};
use std::str::FromStr;

fn content_event(text: &str) -> String {
    format!(
        "data: {{\"id\":\"chatcmpl-1\",\"object\":\"chat.completion.chunk\",\"created\":1700000000,\"model\":\"gpt-3.5-turbo\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":{}}},\"finish_reason\":null}}]}}\n\n",
        serde_json::to_string(text).unwrap()
    )
}

/// Benchmark decoding of one `data:` payload
fn bench_decode_chunk(c: &mut Criterion) {
    let payload = r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","created":1700000000,"model":"gpt-3.5-turbo","choices":[{"index":0,"delta":{"content":" token"},"finish_reason":null}]}"#;

    c.bench_function("decode_chunk", |b| {
        b.iter(|| decode_chunk(payload).unwrap());
    });
}

/// Benchmark decoding a complete SSE body of N fragments
fn bench_text_fragments(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_fragments");

    for count in [16usize, 256, 2048] {
        let body: String = (0..count)
            .map(|i| content_event(&format!(" tok{}", i)))
            .chain(std::iter::once("data: [DONE]\n\n".to_string()))
            .collect();

        // Split into transport-sized pieces so events straddle chunk boundaries
        let pieces: Vec<String> = body
            .as_bytes()
            .chunks(1024)
            .map(|piece| String::from_utf8_lossy(piece).into_owned())
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &pieces, |b, pieces| {
            b.iter(|| {
                let input = stream::iter(pieces.iter().cloned().map(Ok::<_, std::io::Error>));
                block_on(text_fragments(input).count())
            });
        });
    }

    group.finish();
}

/// Benchmark the user-facing message rewrite
fn bench_user_facing_message(c: &mut Criterion) {
    let messages = vec![
        ("rewritten", "Incorrect API key provided: sk-abc***xyz."),
        (
            "passthrough",
            "Rate limit reached for gpt-3.5-turbo in organization org-acme on requests per min.",
        ),
    ];

    let mut group = c.benchmark_group("user_facing_message");

    for (name, message) in messages {
        group.bench_with_input(BenchmarkId::from_parameter(name), &message, |b, m| {
            b.iter(|| user_facing_message(m));
        });
    }

    group.finish();
}

/// Benchmark configuration parsing and validation (one-time startup cost)
fn bench_config_parsing(c: &mut Criterion) {
    let toml_str = r#"
[server]
host = "127.0.0.1"
port = 3000

[upstream]
base_url = "https://api.openai.com/v1"

[[profiles]]
token = "token-a"
user_id = "a"
openai_api_key = "sk-a"
"#;

    c.bench_function("config_parsing", |b| {
        b.iter(|| Config::from_str(toml_str).unwrap());
    });
}

criterion_group!(
    benches,
    bench_decode_chunk,
    bench_text_fragments,
    bench_user_facing_message,
    bench_config_parsing,
);
criterion_main!(benches);
