// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Path and content filters applied during a scan.
//!
//! [`ScanRules`] is immutable once built and is injected into the
//! [`Ingestor`](super::Ingestor), so tests can swap the allow-list, the
//! deny-list or the per-file token ceiling without touching the walker.

use crate::utils::error::CtxpackError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use super::language::extension_of;

/// Extensions (without the dot) admitted by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "cpp", "c", "h", "cs", "php", "rb", "go", "rs",
    "swift", "kt", "scala", "html", "css", "scss", "vue", "svelte", "md", "yml", "yaml", "json",
    "xml", "sql", "sh", "dockerfile", "tf",
];

/// Dependency caches, build output, VCS metadata, lock files and logs.
///
/// Plain entries match anywhere in the relative path as substrings; entries
/// with glob metacharacters match the file name.
pub const DEFAULT_SKIP_PATTERNS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "target",
    "bin",
    "obj",
    ".idea",
    ".vscode",
    "coverage",
    ".pytest_cache",
    ".mypy_cache",
    "*.lock",
    "package-lock.json",
    "yarn.lock",
    "*.log",
];

/// Files larger than this are dropped regardless of the budget.
pub const DEFAULT_MAX_FILE_TOKENS: usize = 50_000;

/// Why a file on disk did not become a [`FileRecord`](super::FileRecord).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// File name starts with `.`.
    Hidden,
    /// Relative path hit a deny-list entry (the entry is carried).
    DeniedPattern(String),
    /// Extension missing or not in the allow-list.
    UnsupportedExtension,
    /// Symlink or other non-regular entry.
    NotRegularFile,
    /// Stat or read failed.
    Unreadable(String),
    /// Nothing but whitespace after decoding.
    Empty,
    TooLarge { tokens: usize, limit: usize },
}

impl SkipReason {
    /// Short category label, independent of the carried detail.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::DeniedPattern(_) => "skip pattern",
            Self::UnsupportedExtension => "unsupported extension",
            Self::NotRegularFile => "not a regular file",
            Self::Unreadable(_) => "unreadable",
            Self::Empty => "empty",
            Self::TooLarge { .. } => "over token limit",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "hidden file"),
            Self::DeniedPattern(pattern) => write!(f, "matches skip pattern '{pattern}'"),
            Self::UnsupportedExtension => write!(f, "unsupported extension"),
            Self::NotRegularFile => write!(f, "not a regular file"),
            Self::Unreadable(reason) => write!(f, "unreadable: {reason}"),
            Self::Empty => write!(f, "empty"),
            Self::TooLarge { tokens, limit } => {
                write!(f, "{tokens} tokens exceeds per-file limit of {limit}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanRules {
    extensions: BTreeSet<String>,
    substring_patterns: Vec<String>,
    glob_patterns: Vec<String>,
    glob_set: GlobSet,
    max_file_tokens: usize,
}

impl ScanRules {
    /// Build rules from an extension allow-list and a skip-pattern deny-list.
    ///
    /// Extensions are accepted with or without a leading dot and are
    /// compared case-insensitively.
    pub fn new<E, P>(
        extensions: E,
        skip_patterns: P,
        max_file_tokens: usize,
    ) -> Result<Self, CtxpackError>
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        if max_file_tokens == 0 {
            return Err(CtxpackError::invalid_budget("max_file_tokens", 0));
        }

        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        let mut substring_patterns = Vec::new();
        let mut glob_patterns = Vec::new();
        let mut builder = GlobSetBuilder::new();
        for pattern in skip_patterns {
            let pattern = pattern.as_ref();
            if pattern.is_empty() {
                continue;
            }
            if is_glob(pattern) {
                let glob = Glob::new(pattern).map_err(|e| {
                    CtxpackError::Config(format!("Invalid skip pattern '{pattern}': {e}"))
                })?;
                builder.add(glob);
                glob_patterns.push(pattern.to_owned());
            } else {
                substring_patterns.push(pattern.to_owned());
            }
        }
        let glob_set = builder
            .build()
            .map_err(|e| CtxpackError::Config(format!("Failed to build skip pattern set: {e}")))?;

        Ok(Self {
            extensions,
            substring_patterns,
            glob_patterns,
            glob_set,
            max_file_tokens,
        })
    }

    /// Copy of these rules with more deny-list entries appended.
    pub fn with_extra_skip_patterns<P>(&self, extra: P) -> Result<Self, CtxpackError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let patterns: Vec<String> = self
            .substring_patterns
            .iter()
            .chain(&self.glob_patterns)
            .cloned()
            .chain(extra.into_iter().map(|p| p.as_ref().to_owned()))
            .collect();
        Self::new(&self.extensions, patterns, self.max_file_tokens)
    }

    pub fn max_file_tokens(&self) -> usize {
        self.max_file_tokens
    }

    pub fn allows_extension(&self, ext: &str) -> bool {
        self.extensions.contains(&ext.to_ascii_lowercase())
    }

    /// Path-only checks, in order: hidden name, deny-list, extension.
    ///
    /// `relative` is the path below the scan root.
    pub fn check_path(&self, relative: &Path) -> Result<(), SkipReason> {
        let name = relative
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        let file_name: &str = &name;

        if file_name.starts_with('.') {
            return Err(SkipReason::Hidden);
        }

        let normalized = normalize_path(relative);
        if let Some(pattern) = self
            .substring_patterns
            .iter()
            .find(|pattern| normalized.contains(pattern.as_str()))
        {
            return Err(SkipReason::DeniedPattern(pattern.clone()));
        }

        if let Some(idx) = self.glob_set.matches(file_name).first() {
            let pattern = self.glob_patterns.get(*idx).cloned().unwrap_or_default();
            return Err(SkipReason::DeniedPattern(pattern));
        }

        match extension_of(relative) {
            Some(ext) if self.extensions.contains(&ext) => Ok(()),
            _ => Err(SkipReason::UnsupportedExtension),
        }
    }

    /// Deny-list substring matched by a directory's relative path, if any.
    ///
    /// Every file below such a directory would match the same entry, so the
    /// walker prunes the whole subtree.
    pub fn denied_directory(&self, relative: &Path) -> Option<&str> {
        let normalized = normalize_path(relative);
        if normalized.is_empty() {
            return None;
        }
        self.substring_patterns
            .iter()
            .find(|pattern| normalized.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Token ceiling check for a file that already passed [`check_path`](Self::check_path).
    pub fn check_tokens(&self, tokens: usize) -> Result<(), SkipReason> {
        if tokens > self.max_file_tokens {
            return Err(SkipReason::TooLarge {
                tokens,
                limit: self.max_file_tokens,
            });
        }
        Ok(())
    }
}

impl Default for ScanRules {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS, DEFAULT_SKIP_PATTERNS, DEFAULT_MAX_FILE_TOKENS)
            .expect("default skip patterns are valid globs")
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Forward-slash separated rendering of a relative path.
pub(crate) fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
