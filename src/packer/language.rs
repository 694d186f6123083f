// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::Path;

/// Language classification derived from a file extension.
///
/// The tag returned by [`Language::as_str`] is what appears in the context
/// document (tree lines, content headings and code fence info strings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    /// `.jsx`
    React,
    /// `.tsx`
    ReactTs,
    Java,
    Cpp,
    C,
    /// `.h`
    CHeader,
    CSharp,
    Php,
    Ruby,
    Go,
    Rust,
    Swift,
    Kotlin,
    Scala,
    Html,
    Css,
    Scss,
    Vue,
    Svelte,
    Markdown,
    Yaml,
    Json,
    Xml,
    Sql,
    Bash,
    Docker,
    Terraform,
    /// Extension not in the table. Extension filtering normally keeps these
    /// out of a scan, but a custom allow-list can let them through.
    Unknown,
}

impl Language {
    /// Classify a lowercased extension without the leading dot.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "py" => Self::Python,
            "js" => Self::JavaScript,
            "ts" => Self::TypeScript,
            "jsx" => Self::React,
            "tsx" => Self::ReactTs,
            "java" => Self::Java,
            "cpp" => Self::Cpp,
            "c" => Self::C,
            "h" => Self::CHeader,
            "cs" => Self::CSharp,
            "php" => Self::Php,
            "rb" => Self::Ruby,
            "go" => Self::Go,
            "rs" => Self::Rust,
            "swift" => Self::Swift,
            "kt" => Self::Kotlin,
            "scala" => Self::Scala,
            "html" => Self::Html,
            "css" => Self::Css,
            "scss" => Self::Scss,
            "vue" => Self::Vue,
            "svelte" => Self::Svelte,
            "md" => Self::Markdown,
            "yml" | "yaml" => Self::Yaml,
            "json" => Self::Json,
            "xml" => Self::Xml,
            "sql" => Self::Sql,
            "sh" => Self::Bash,
            "dockerfile" => Self::Docker,
            "tf" => Self::Terraform,
            _ => Self::Unknown,
        }
    }

    /// Classify a path by its (case-insensitive) extension.
    pub fn detect(path: &Path) -> Self {
        extension_of(path).map_or(Self::Unknown, |ext| Self::from_extension(&ext))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::React => "react",
            Self::ReactTs => "react-ts",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::CHeader => "c-header",
            Self::CSharp => "csharp",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
            Self::Html => "html",
            Self::Css => "css",
            Self::Scss => "scss",
            Self::Vue => "vue",
            Self::Svelte => "svelte",
            Self::Markdown => "markdown",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Sql => "sql",
            Self::Bash => "bash",
            Self::Docker => "docker",
            Self::Terraform => "terraform",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased extension of `path`, without the dot.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
