// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use super::{Candidates, ScanResult};

/// Select the longest prefix of the ranked candidates that fits `max_tokens`.
///
/// Selection stops at the first candidate that would overflow the budget,
/// even if a smaller file further down the ranking would still fit.
pub fn pack(candidates: Candidates, root_path: PathBuf, max_tokens: usize) -> ScanResult {
    let Candidates { files, skipped } = candidates;
    let scanned_count = files.len();

    let mut used_tokens = 0usize;
    let mut selected_files = Vec::new();

    for file in files {
        match used_tokens.checked_add(file.token_count) {
            Some(total) if total <= max_tokens => {
                used_tokens = total;
                selected_files.push(file);
            }
            _ => {
                tracing::debug!(
                    path = %file.relative_path,
                    tokens = file.token_count,
                    used_tokens,
                    max_tokens,
                    "Budget exhausted"
                );
                break;
            }
        }
    }

    ScanResult {
        selected_files,
        used_tokens,
        scanned_count,
        root_path,
        max_tokens,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::{FileRecord, Language};

    fn record(path: &str, tokens: usize, score: f64) -> FileRecord {
        FileRecord {
            absolute_path: PathBuf::from("/project").join(path),
            relative_path: path.to_owned(),
            content: "x".repeat(tokens * 4),
            token_count: tokens,
            byte_size: tokens * 4,
            modified_time: None,
            language: Language::detect(std::path::Path::new(path)),
            relevance_score: score,
        }
    }

    fn candidates(files: Vec<FileRecord>) -> Candidates {
        Candidates {
            files,
            skipped: Vec::new(),
        }
    }

    fn selected(result: &ScanResult) -> Vec<&str> {
        result
            .selected_files
            .iter()
            .map(|f| f.relative_path.as_str())
            .collect()
    }

    #[test]
    fn test_stops_at_first_overflow() {
        let files = vec![
            record("a.py", 600, 3.0),
            record("b.py", 500, 2.0),
            record("c.py", 10, 1.0),
        ];
        let result = pack(candidates(files), PathBuf::from("/project"), 1000);
        // c.py would fit on its own but selection ended at b.py
        assert_eq!(selected(&result), ["a.py"]);
        assert_eq!(result.used_tokens, 600);
        assert_eq!(result.scanned_count, 3);
        assert_eq!(result.excluded_by_budget(), 2);
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let files = vec![record("a.py", 800, 2.0), record("README.md", 200, 1.0)];
        let result = pack(candidates(files), PathBuf::from("/project"), 1000);
        assert_eq!(selected(&result), ["a.py", "README.md"]);
        assert_eq!(result.used_tokens, 1000);
    }

    #[test]
    fn test_zero_budget_selects_nothing() {
        let files = vec![record("a.py", 1, 1.0)];
        let result = pack(candidates(files), PathBuf::from("/project"), 0);
        assert!(result.selected_files.is_empty());
        assert_eq!(result.used_tokens, 0);
        assert_eq!(result.scanned_count, 1);
    }

    #[test]
    fn test_budget_invariant_holds_for_any_budget() {
        let sizes = [120, 7, 3000, 45, 45, 900, 1, 2500];
        for max_tokens in [0, 1, 50, 127, 1000, 4000, 10_000] {
            let files = sizes
                .iter()
                .enumerate()
                .map(|(i, &t)| record(&format!("f{i}.py"), t, 10.0 - i as f64))
                .collect();
            let result = pack(candidates(files), PathBuf::from("/project"), max_tokens);
            let sum: usize = result.selected_files.iter().map(|f| f.token_count).sum();
            assert_eq!(sum, result.used_tokens);
            assert!(result.used_tokens <= max_tokens);
            // selection is a prefix
            for (i, file) in result.selected_files.iter().enumerate() {
                assert_eq!(file.relative_path, format!("f{i}.py"));
            }
        }
    }

    #[test]
    fn test_overflowing_sum_does_not_panic() {
        let files = vec![record("a.py", 10, 2.0), {
            let mut huge = record("b.py", 0, 1.0);
            huge.token_count = usize::MAX;
            huge
        }];
        let result = pack(candidates(files), PathBuf::from("/project"), usize::MAX);
        assert_eq!(selected(&result), ["a.py"]);
    }
}
