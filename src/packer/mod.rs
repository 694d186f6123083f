// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Codebase ingestion: scan, score, select under a token budget, serialize.
//!
//! ```no_run
//! use ctxpack::llm::tokenizer::EstimatingTokenizer;
//! use ctxpack::packer::{Ingestor, ScanRules, ScoringWeights, serialize};
//! use std::path::Path;
//!
//! let ingestor = Ingestor::new(
//!     ScanRules::default(),
//!     ScoringWeights::default(),
//!     Box::new(EstimatingTokenizer),
//! );
//! let result = ingestor.scan(Path::new("."), 900_000)?;
//! println!("{}", serialize(&result));
//! # Ok::<(), ctxpack::utils::error::CtxpackError>(())
//! ```

pub mod budget;
pub mod language;
pub mod output;
pub mod rules;
pub mod scoring;
pub mod walker;

use crate::llm::tokenizer::Tokenizer;
use crate::utils::error::CtxpackError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use budget::pack;
pub use language::Language;
pub use output::serialize;
pub use rules::{ScanRules, SkipReason};
pub use scoring::{ScoringWeights, relevance_score};

/// Default token budget for one scan.
pub const DEFAULT_MAX_TOKENS: usize = 900_000;

/// One ingested file. Only files that passed every filter become records.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub absolute_path: PathBuf,
    /// Path below the scan root, `/`-separated. Unique within a scan.
    pub relative_path: String,
    /// Lossily decoded text.
    pub content: String,
    pub token_count: usize,
    /// `content.len()`; reporting only.
    pub byte_size: usize,
    pub modified_time: Option<DateTime<Utc>>,
    pub language: Language,
    pub relevance_score: f64,
}

/// A file that was seen on disk but not ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// For pruned directories this is the directory path.
    pub relative_path: String,
    pub reason: SkipReason,
}

/// Scanner output: every admissible file, ranked, plus what was excluded.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    /// Descending relevance score; ties keep walk order.
    pub files: Vec<FileRecord>,
    pub skipped: Vec<SkippedFile>,
}

/// Result of one scan-and-pack run.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Longest prefix of the ranked candidates that fits `max_tokens`.
    pub selected_files: Vec<FileRecord>,
    /// Sum of `token_count` over `selected_files`, never above `max_tokens`.
    pub used_tokens: usize,
    /// Files that passed filtering, before budget truncation.
    pub scanned_count: usize,
    pub root_path: PathBuf,
    pub max_tokens: usize,
    pub skipped: Vec<SkippedFile>,
}

impl ScanResult {
    pub fn selected_count(&self) -> usize {
        self.selected_files.len()
    }

    /// Candidates that passed filtering but did not fit the budget.
    pub fn excluded_by_budget(&self) -> usize {
        self.scanned_count.saturating_sub(self.selected_files.len())
    }

    /// Selected file count per language tag, ordered by tag.
    pub fn language_breakdown(&self) -> BTreeMap<&'static str, usize> {
        let mut breakdown = BTreeMap::new();
        for file in &self.selected_files {
            *breakdown.entry(file.language.as_str()).or_insert(0) += 1;
        }
        breakdown
    }
}

/// The scan pipeline with its configuration tables and tokenizer.
pub struct Ingestor {
    rules: ScanRules,
    weights: ScoringWeights,
    tokenizer: Box<dyn Tokenizer>,
}

impl Ingestor {
    pub fn new(rules: ScanRules, weights: ScoringWeights, tokenizer: Box<dyn Tokenizer>) -> Self {
        Self {
            rules,
            weights,
            tokenizer,
        }
    }

    pub fn rules(&self) -> &ScanRules {
        &self.rules
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Walk, filter and rank without applying a budget.
    pub fn collect(&self, root: &Path) -> Result<(PathBuf, Candidates), CtxpackError> {
        let root = resolve_root(root)?;
        let candidates =
            walker::collect_candidates(&root, &self.rules, &self.weights, self.tokenizer.as_ref());
        Ok((root, candidates))
    }

    /// Scan `root` and keep the highest-ranked files that fit `max_tokens`.
    ///
    /// The only hard failure is a bad root; unreadable or oversized files are
    /// recorded in [`ScanResult::skipped`].
    pub fn scan(&self, root: &Path, max_tokens: usize) -> Result<ScanResult, CtxpackError> {
        let (root, candidates) = self.collect(root)?;
        let result = pack(candidates, root, max_tokens);

        tracing::info!(
            root = %result.root_path.display(),
            selected = result.selected_count(),
            scanned = result.scanned_count,
            used_tokens = result.used_tokens,
            max_tokens,
            "Scan complete"
        );

        Ok(result)
    }
}

/// Resolve the scan root to an absolute directory path.
fn resolve_root(root: &Path) -> Result<PathBuf, CtxpackError> {
    if !root.exists() {
        return Err(CtxpackError::invalid_path(root));
    }
    let resolved = root.canonicalize()?;
    if !resolved.is_dir() {
        return Err(CtxpackError::ValidationError {
            message: format!("Project path '{}' is not a directory", root.display()),
            suggestion: "Pass the project's root directory".to_owned(),
        });
    }
    Ok(resolved)
}
