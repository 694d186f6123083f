// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Relevance scoring used to order files before budgeted selection.
//!
//! The score is a product of four independent multipliers over a base of
//! `1.0`: language, path segment, size tier and file name. Every factor is
//! strictly positive, so every score is too.

use std::collections::HashMap;
use std::path::Path;

use super::language::Language;
use super::rules::normalize_path;

/// Multiplier tables for [`relevance_score`].
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    /// Languages absent from the table score `1.0`.
    pub language: HashMap<Language, f64>,
    /// Checked first; the first matching group wins.
    pub core_segments: Vec<String>,
    pub core_weight: f64,
    pub low_priority_segments: Vec<String>,
    pub low_priority_weight: f64,
    pub config_segments: Vec<String>,
    pub config_weight: f64,
    pub small_file_tokens: usize,
    pub small_file_weight: f64,
    pub large_file_tokens: usize,
    pub large_file_weight: f64,
    pub huge_file_tokens: usize,
    pub huge_file_weight: f64,
    /// Lowercased file names treated as entry points.
    pub entry_points: Vec<String>,
    pub entry_point_weight: f64,
    pub test_file_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let language = [
            (Language::Python, 1.2),
            (Language::JavaScript, 1.2),
            (Language::TypeScript, 1.3),
            (Language::Java, 1.2),
            (Language::Cpp, 1.1),
            (Language::Go, 1.2),
            (Language::Rust, 1.2),
            (Language::Css, 0.8),
            (Language::Html, 0.7),
            (Language::Json, 0.6),
            (Language::Yaml, 0.5),
        ]
        .into_iter()
        .collect();

        Self {
            language,
            core_segments: strings(&["src/", "lib/", "core/", "app/"]),
            core_weight: 1.3,
            low_priority_segments: strings(&["test/", "tests/", "docs/", "doc/"]),
            low_priority_weight: 0.7,
            config_segments: strings(&["config/", "configs/", "settings/"]),
            config_weight: 0.6,
            small_file_tokens: 100,
            small_file_weight: 1.1,
            large_file_tokens: 5_000,
            large_file_weight: 0.8,
            huge_file_tokens: 10_000,
            huge_file_weight: 0.6,
            entry_points: strings(&["main.py", "index.js", "app.py", "server.py", "main.go"]),
            entry_point_weight: 1.5,
            test_file_weight: 0.7,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl ScoringWeights {
    pub fn language_weight(&self, language: Language) -> f64 {
        self.language.get(&language).copied().unwrap_or(1.0)
    }

    pub fn path_weight(&self, relative: &str) -> f64 {
        let contains_any =
            |segments: &[String]| segments.iter().any(|seg| relative.contains(seg.as_str()));

        if contains_any(&self.core_segments) {
            self.core_weight
        } else if contains_any(&self.low_priority_segments) {
            self.low_priority_weight
        } else if contains_any(&self.config_segments) {
            self.config_weight
        } else {
            1.0
        }
    }

    /// The `huge` band sits behind the `large` band and is only reachable
    /// when `huge_file_tokens < large_file_tokens`. With the default
    /// thresholds everything above 5,000 tokens gets the `large` weight.
    pub fn size_weight(&self, tokens: usize) -> f64 {
        if tokens < self.small_file_tokens {
            self.small_file_weight
        } else if tokens > self.large_file_tokens {
            self.large_file_weight
        } else if tokens > self.huge_file_tokens {
            self.huge_file_weight
        } else {
            1.0
        }
    }

    pub fn filename_weight(&self, file_name: &str) -> f64 {
        let name = file_name.to_lowercase();
        if self.entry_points.iter().any(|entry| *entry == name) {
            self.entry_point_weight
        } else if is_test_file_name(&name) {
            self.test_file_weight
        } else {
            1.0
        }
    }
}

fn is_test_file_name(lowercase_name: &str) -> bool {
    lowercase_name.starts_with("test_") || lowercase_name.ends_with("_test.py")
}

/// Score a file by language, location, size and name.
pub fn relevance_score(
    relative_path: &Path,
    language: Language,
    token_count: usize,
    weights: &ScoringWeights,
) -> f64 {
    let relative = normalize_path(relative_path);
    let file_name = relative_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut score = 1.0;
    score *= weights.language_weight(language);
    score *= weights.path_weight(&relative);
    score *= weights.size_weight(token_count);
    score *= weights.filename_weight(&file_name);
    score
}
