//! Benchmarks for ctxpack performance-critical operations.
//!
//! Run with: `cargo bench`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ctxpack::llm::tokenizer::{EstimatingTokenizer, TiktokenTokenizer, Tokenizer};
use ctxpack::packer::{
    Candidates, FileRecord, Language, ScoringWeights, pack, relevance_score, serialize,
};
use std::hint::black_box;
use std::path::{Path, PathBuf};

const PATHS: &[&str] = &[
    "src/main.rs",
    "src/server/mod.rs",
    "lib/util/strings.ts",
    "tests/test_app.py",
    "docs/guide.md",
    "config/settings.yaml",
    "README.md",
    "app/models/user.rb",
];

/// `count` synthetic records of roughly `tokens` estimated tokens each,
/// ranked the way the walker ranks them.
fn synthetic_candidates(count: usize, tokens: usize) -> Candidates {
    let weights = ScoringWeights::default();
    let content = "abc\n".repeat(tokens);

    let mut files: Vec<FileRecord> = (0..count)
        .map(|i| {
            let template = PATHS[i % PATHS.len()];
            let relative_path = format!("pkg{i}/{template}");
            let language = Language::detect(Path::new(&relative_path));
            FileRecord {
                absolute_path: PathBuf::from("/bench").join(&relative_path),
                relevance_score: relevance_score(
                    Path::new(&relative_path),
                    language,
                    tokens,
                    &weights,
                ),
                relative_path,
                content: content.clone(),
                token_count: tokens,
                byte_size: content.len(),
                modified_time: None,
                language,
            }
        })
        .collect();
    files.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    Candidates {
        files,
        skipped: Vec::new(),
    }
}

/// Benchmark token counting operations.
fn bench_token_counting(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_counting");

    let small_code = "fn main() { println!(\"Hello\"); }";
    let medium_code = include_str!("../src/packer/walker.rs");

    let estimate = EstimatingTokenizer;
    let Ok(tiktoken) = TiktokenTokenizer::new() else {
        eprintln!("cl100k_base unavailable; skipping token counting benchmarks");
        return;
    };

    for (name, code) in [("small_snippet", small_code), ("medium_snippet", medium_code)] {
        group.bench_with_input(BenchmarkId::new(format!("estimate/{name}"), code.len()), &code, |b, code| {
            b.iter(|| black_box(estimate.count_tokens(code)));
        });
        group.bench_with_input(BenchmarkId::new(format!("tiktoken/{name}"), code.len()), &code, |b, code| {
            b.iter(|| black_box(tiktoken.count_tokens(code)));
        });
    }

    group.finish();
}

/// Benchmark relevance scoring over a mix of paths.
fn bench_scoring(c: &mut Criterion) {
    let weights = ScoringWeights::default();
    let detected: Vec<_> = PATHS
        .iter()
        .map(|p| (Path::new(*p), Language::detect(Path::new(*p))))
        .collect();

    c.bench_function("relevance_score", |b| {
        b.iter(|| {
            for (path, language) in &detected {
                black_box(relevance_score(path, *language, 1_500, &weights));
            }
        });
    });
}

/// Benchmark budgeted packing and document rendering.
fn bench_pack_and_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");

    for count in [100usize, 1_000] {
        let candidates = synthetic_candidates(count, 200);
        let budget = count * 100;

        group.bench_with_input(BenchmarkId::new("greedy_prefix", count), &candidates, |b, candidates| {
            b.iter(|| black_box(pack(candidates.clone(), PathBuf::from("/bench"), budget)));
        });

        let result = pack(candidates, PathBuf::from("/bench"), budget);
        group.bench_with_input(BenchmarkId::new("serialize", count), &result, |b, result| {
            b.iter(|| black_box(serialize(result)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_token_counting, bench_scoring, bench_pack_and_serialize);
criterion_main!(benches);
