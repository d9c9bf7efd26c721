//! Highlight Performance Benchmarks
//!
//! Stats and highlighting run on every render, so both should stay cheap
//! for book-length documents.
//!
//! Run with: `cargo bench --bench highlight`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use documind::document::DocumentStats;
use documind::html::{highlight, HighlightConfig};

/// Build a document of roughly `words` words with a few markup characters
fn create_document(words: usize) -> String {
    let vocabulary = ["retrieval", "<augmented>", "generation", "answer", "a.b", "source", "&", "context"];
    (0..words)
        .map(|i| vocabulary[i % vocabulary.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_stats(c: &mut Criterion) {
    let document = create_document(100_000);

    c.bench_function("stats_100k_words", |b| {
        b.iter(|| DocumentStats::compute(black_box(Some(&document))))
    });
}

fn bench_highlight(c: &mut Criterion) {
    let document = create_document(100_000);
    let config = HighlightConfig::default();

    c.bench_function("highlight_search_only", |b| {
        b.iter(|| highlight(black_box(&document), Some("answer"), None, &config))
    });

    c.bench_function("highlight_overlapping_terms", |b| {
        b.iter(|| highlight(black_box(&document), Some("retrieval"), Some("trie"), &config))
    });

    c.bench_function("highlight_no_terms", |b| {
        b.iter(|| highlight(black_box(&document), Some(""), None, &config))
    });
}

criterion_group!(benches, bench_stats, bench_highlight);
criterion_main!(benches);
