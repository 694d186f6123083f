// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Compiled regex patterns for redacting sensitive data.
///
/// The patterns are literals validated by the tests below, so the `expect()`
/// calls can only fire on a programming error.
static REDACTION_PATTERNS: LazyLock<[(regex::Regex, &'static str); 5]> = LazyLock::new(|| {
    [
        (
            regex::Regex::new(r"(api[_-]?key[=:\s]+)[^\s&]+")
                .expect("api_key redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(?i)(x-goog-api-key[=:\s]+)[^\s]+")
                .expect("goog header redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(token[=:\s]+)[^\s]+").expect("token redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(?i)(bearer\s+)[^\s]+")
                .expect("bearer redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(AIza[0-9A-Za-z_\-]{20,})")
                .expect("google key redaction pattern is invalid"),
            "[REDACTED]",
        ),
    ]
});

#[derive(Debug, Error)]
pub enum CtxpackError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Project path '{}' does not exist", path.display())]
    InvalidPath { path: PathBuf },

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("LLM provider error: {provider} - {}", redact_sensitive_data(message))]
    Provider { provider: String, message: String },

    #[error("Rate limited by {provider}, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Parse error: {message}")]
    ParseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}\nSuggestion: {suggestion}")]
    ValidationError { message: String, suggestion: String },

    #[error("Network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Protocol error {code}: {message}")]
    Protocol { code: i64, message: String },
}

/// Redact sensitive information from error messages.
pub(crate) fn redact_sensitive_data(message: &str) -> String {
    let mut result = message.to_owned();
    for (pattern, replacement) in REDACTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }
    result
}

impl CtxpackError {
    pub fn invalid_path(path: impl Into<PathBuf>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    pub fn invalid_tokenizer(name: &str) -> Self {
        Self::ValidationError {
            message: format!("Invalid tokenizer: '{name}'"),
            suggestion: "Valid tokenizers are: tiktoken, estimate".to_owned(),
        }
    }

    pub fn invalid_budget(field: &str, value: usize) -> Self {
        Self::ValidationError {
            message: format!("Invalid {field}: {value}"),
            suggestion: format!("{field} must be greater than zero"),
        }
    }

    pub fn missing_api_key(provider: &str) -> Self {
        let env_var = format!("{}_API_KEY", provider.to_uppercase());
        Self::ValidationError {
            message: format!("API key not configured for provider '{provider}'"),
            suggestion: format!("Set the {env_var} environment variable"),
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::NetworkError { .. })
    }
}

impl From<serde_json::Error> for CtxpackError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: "Failed to parse JSON".to_owned(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::ser::Error> for CtxpackError {
    fn from(err: toml::ser::Error) -> Self {
        Self::ParseError {
            message: "Failed to render TOML configuration".to_owned(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for CtxpackError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request timed out. Check your network connection.".to_owned()
        } else if err.is_connect() {
            "Failed to connect to server. Check your network connection.".to_owned()
        } else if err.is_status() {
            format!(
                "HTTP error: {}",
                err.status()
                    .map_or_else(|| "unknown".to_owned(), |s| s.to_string())
            )
        } else if err.is_decode() {
            "Failed to decode response body".to_owned()
        } else {
            "Network request failed".to_owned()
        };

        Self::NetworkError {
            message,
            source: Some(Box::new(err)),
        }
    }
}

/// Render an error for terminal display.
///
/// In verbose mode the `source()` chain is appended below the message.
pub fn format_error(error: &CtxpackError, verbose: bool) -> String {
    let mut out = format!("\n\u{26a0} Error: {error}");

    if verbose {
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            let _ = write!(out, "\n\u{2514}\u{2500} {}", redact_sensitive_data(&cause.to_string()));
            source = std::error::Error::source(cause);
        }
    }

    out
}
