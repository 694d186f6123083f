// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Rendering of a [`ScanResult`] into the Markdown context document.

use std::fmt;

use super::ScanResult;
use crate::utils::formatting::{format_number, format_score};

/// Number of files listed in the file tree section.
pub const TREE_LIMIT: usize = 20;

const INSTRUCTIONS: &str = "\
## ANALYSIS INSTRUCTIONS:
You now have the complete codebase loaded in your context with intelligent file prioritization.
When answering questions:
1. Reference specific files and line numbers when possible
2. Consider the overall architecture and relationships between files
3. Provide concrete, actionable insights
4. Focus on the most relevant files based on the user's query
5. Use your understanding of the complete codebase context
";

/// Borrowing [`fmt::Display`] adapter over a scan result.
pub struct ContextDocument<'a> {
    result: &'a ScanResult,
}

impl<'a> ContextDocument<'a> {
    pub fn new(result: &'a ScanResult) -> Self {
        Self { result }
    }
}

impl fmt::Display for ContextDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let files = &result.selected_files;

        writeln!(f, "# INTELLIGENT CODEBASE ANALYSIS CONTEXT")?;
        writeln!(f)?;
        writeln!(f, "## PROJECT OVERVIEW")?;
        writeln!(f, "- **Path:** {}", result.root_path.display())?;
        writeln!(
            f,
            "- **Files Loaded:** {} (out of {} scanned)",
            files.len(),
            result.scanned_count
        )?;
        writeln!(f, "- **Total Tokens:** {}", format_number(result.used_tokens))?;
        writeln!(
            f,
            "- **Analysis Capabilities:** Architecture, Semantic Search, Improvements, Code Flow"
        )?;
        writeln!(f)?;
        writeln!(f, "## CODEBASE STRUCTURE")?;
        writeln!(f)?;

        writeln!(f, "### File Tree:")?;
        for file in files.iter().take(TREE_LIMIT) {
            writeln!(
                f,
                "- {} ({}, {} tokens, score: {})",
                file.relative_path,
                file.language,
                file.token_count,
                format_score(file.relevance_score)
            )?;
        }
        if files.len() > TREE_LIMIT {
            writeln!(f, "... and {} more files", files.len() - TREE_LIMIT)?;
        }

        writeln!(f)?;
        writeln!(f, "## COMPLETE FILE CONTENTS:")?;
        writeln!(f)?;

        for file in files {
            writeln!(f, "### \u{1f4c1} {} ({})", file.relative_path, file.language)?;
            writeln!(f, "```{}", file.language)?;
            writeln!(f, "{}", file.content)?;
            writeln!(f, "```")?;
            writeln!(f)?;
        }

        writeln!(f)?;
        f.write_str(INSTRUCTIONS)
    }
}

/// Serialize a scan result into the context document.
///
/// The output is a pure function of `result`: identical results always
/// produce identical text.
pub fn serialize(result: &ScanResult) -> String {
    ContextDocument::new(result).to_string()
}
