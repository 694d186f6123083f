// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

use crate::llm::tokenizer::Tokenizer;
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::language::Language;
use super::rules::{ScanRules, SkipReason, normalize_path};
use super::scoring::{ScoringWeights, relevance_score};
use super::{Candidates, FileRecord, SkippedFile};

/// Walk `root` and turn every admissible file into a scored [`FileRecord`].
///
/// Entries are visited in file-name order within each directory, so repeated
/// scans of an unchanged tree produce the same sequence. The returned files
/// are ranked by descending score with walk order breaking ties.
///
/// Per-file problems never abort the walk; they show up in
/// [`Candidates::skipped`].
pub fn collect_candidates(
    root: &Path,
    rules: &ScanRules,
    weights: &ScoringWeights,
    tokenizer: &dyn Tokenizer,
) -> Candidates {
    let pruned: Arc<Mutex<Vec<SkippedFile>>> = Arc::default();

    let prune_rules = rules.clone();
    let prune_root = root.to_path_buf();
    let prune_log = Arc::clone(&pruned);

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            let relative = entry.path().strip_prefix(&prune_root).unwrap_or(entry.path());
            let Some(pattern) = prune_rules.denied_directory(relative) else {
                return true;
            };
            if let Ok(mut log) = prune_log.lock() {
                log.push(SkippedFile {
                    relative_path: normalize_path(relative),
                    reason: SkipReason::DeniedPattern(pattern.to_owned()),
                });
            }
            false
        })
        .build();

    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error walking directory: {}", e);
                continue;
            }
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);

        let outcome = rules.check_path(relative).and_then(|()| {
            if file_type.is_file() {
                read_record(path, relative, rules, weights, tokenizer)
            } else {
                Err(SkipReason::NotRegularFile)
            }
        });

        match outcome {
            Ok(record) => files.push(record),
            Err(reason) => {
                let relative_path = normalize_path(relative);
                tracing::debug!(path = %relative_path, %reason, "Skipping file");
                skipped.push(SkippedFile {
                    relative_path,
                    reason,
                });
            }
        }
    }

    if let Ok(mut log) = pruned.lock() {
        skipped.append(&mut log);
    }

    rank(&mut files);

    tracing::debug!(
        candidates = files.len(),
        skipped = skipped.len(),
        tokenizer = tokenizer.name(),
        "Collected candidates"
    );

    Candidates { files, skipped }
}

/// Stable sort by descending relevance score.
pub fn rank(files: &mut [FileRecord]) {
    files.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
}

/// Read, decode, measure and score one file that passed the path checks.
fn read_record(
    path: &Path,
    relative: &Path,
    rules: &ScanRules,
    weights: &ScoringWeights,
    tokenizer: &dyn Tokenizer,
) -> Result<FileRecord, SkipReason> {
    let metadata = std::fs::metadata(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let bytes = std::fs::read(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    if content.trim().is_empty() {
        return Err(SkipReason::Empty);
    }

    let token_count = tokenizer.count_tokens(&content);
    rules.check_tokens(token_count)?;

    let language = Language::detect(relative);
    let relevance_score = relevance_score(relative, language, token_count, weights);

    Ok(FileRecord {
        absolute_path: path.to_path_buf(),
        relative_path: normalize_path(relative),
        byte_size: content.len(),
        content,
        token_count,
        modified_time: metadata.modified().ok().map(DateTime::<Utc>::from),
        language,
        relevance_score,
    })
}
