// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Dry-run display of a scan: what was selected, by language, and why the
//! rest was left out.

use crate::packer::{FileRecord, ScanResult};
use crate::utils::formatting::{format_number, format_score};
use console::style;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Maximum number of files to show per language before truncating.
const MAX_FILES_PER_LANGUAGE: usize = 3;

/// Write a styled selection summary for `ctxpack pack --dry-run`.
pub fn write_pack_summary<W: Write>(
    out: &mut W,
    result: &ScanResult,
    tokenizer: &str,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} - {}",
        style("Dry Run").yellow().bold(),
        result.root_path.display()
    )?;

    writeln!(out)?;
    writeln!(out, "{}:", style("Selected files").bold())?;

    let by_language = group_by_language(&result.selected_files);

    // Most files first; ties keep tag order
    let mut languages: Vec<_> = by_language.iter().collect();
    languages.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    for (lang_idx, (language, files)) in languages.iter().enumerate() {
        let is_last_language = lang_idx + 1 == languages.len();
        let lang_prefix = if is_last_language {
            "\u{2514}\u{2500}"
        } else {
            "\u{251c}\u{2500}"
        };
        let child_prefix = if is_last_language {
            "   "
        } else {
            "\u{2502}  "
        };

        let tokens: usize = files.iter().map(|f| f.token_count).sum();
        writeln!(
            out,
            "{} {} ({} files, {} tokens)",
            style(lang_prefix).dim(),
            language,
            files.len(),
            format_number(tokens)
        )?;

        let shown = files.len().min(MAX_FILES_PER_LANGUAGE);
        for (file_idx, file) in files.iter().take(shown).enumerate() {
            let is_last_file = file_idx + 1 == shown && files.len() <= MAX_FILES_PER_LANGUAGE;
            let file_prefix = if is_last_file {
                "\u{2514}\u{2500}"
            } else {
                "\u{251c}\u{2500}"
            };
            writeln!(
                out,
                "{}{} {} ({} tokens, score {})",
                child_prefix,
                style(file_prefix).dim(),
                file.relative_path,
                format_number(file.token_count),
                format_score(file.relevance_score)
            )?;
        }

        if files.len() > MAX_FILES_PER_LANGUAGE {
            writeln!(
                out,
                "{}\u{2514}\u{2500} ... ({} more files)",
                child_prefix,
                files.len() - MAX_FILES_PER_LANGUAGE
            )?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "{}: {} of {} candidate files, {} / {} tokens ({})",
        style("Total").bold(),
        format_number(result.selected_count()),
        format_number(result.scanned_count),
        format_number(result.used_tokens),
        format_number(result.max_tokens),
        tokenizer
    )?;

    let excluded = result.excluded_by_budget();
    if excluded > 0 {
        writeln!(
            out,
            "{}: {} files did not fit the budget",
            style("Over budget").bold(),
            format_number(excluded)
        )?;
    }

    if !result.skipped.is_empty() {
        let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
        for skipped in &result.skipped {
            *by_kind.entry(skipped.reason.kind()).or_insert(0) += 1;
        }
        let breakdown = by_kind
            .iter()
            .map(|(kind, count)| format!("{kind}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            out,
            "{}: {} ({})",
            style("Skipped").bold(),
            format_number(result.skipped.len()),
            breakdown
        )?;
    }

    writeln!(out)?;
    writeln!(out, "No document was written.")?;
    Ok(())
}

/// Selected files grouped by language tag, each group in ranking order.
fn group_by_language(files: &[FileRecord]) -> BTreeMap<&'static str, Vec<&FileRecord>> {
    let mut groups: BTreeMap<&'static str, Vec<&FileRecord>> = BTreeMap::new();
    for file in files {
        groups.entry(file.language.as_str()).or_default().push(file);
    }
    groups
}
