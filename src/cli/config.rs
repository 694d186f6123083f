// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management using the `config` crate for hierarchical discovery and merging.
//!
//! ## Configuration Sources (in precedence order, highest to lowest):
//! 1. **CLI flags**
//! 2. **Environment variables** (`CTXPACK_<SECTION>__<KEY>`, e.g.
//!    `CTXPACK_GENERAL__MAX_TOKENS=500000`)
//! 3. **Config files**
//!
//! ## Config File Discovery (in merge order, later overrides earlier):
//! 1. `~/.config/ctxpack/config.toml`
//! 2. `ctxpack.toml` in the git repository root
//! 3. `./ctxpack.toml`
//! 4. Explicit `--config` path
//!
//! ## Example file
//! ```toml
//! [general]
//! max_tokens = 500000
//! tokenizer = "estimate"
//!
//! [scan]
//! extra_skip_patterns = ["fixtures", "*.snap"]
//! max_file_tokens = 20000
//!
//! [provider]
//! model = "gemini-2.0-flash"
//! ```

use crate::MergedConfig;
use crate::cli::args::{Args, Command};
use crate::llm::tokenizer::TokenizerKind;
use crate::packer::DEFAULT_MAX_TOKENS;
use crate::packer::rules::{DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_TOKENS, DEFAULT_SKIP_PATTERNS};
use crate::utils::error::CtxpackError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "ctxpack.toml";

#[cfg(feature = "gemini")]
use crate::llm::providers::gemini::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, GEMINI_API_URL,
};
#[cfg(not(feature = "gemini"))]
const DEFAULT_MODEL: &str = "none";
#[cfg(not(feature = "gemini"))]
const GEMINI_API_URL: &str = "";
#[cfg(not(feature = "gemini"))]
const DEFAULT_MAX_OUTPUT_TOKENS: usize = 8192;
#[cfg(not(feature = "gemini"))]
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Root configuration structure loaded from config files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub max_tokens: Option<usize>,
    pub tokenizer: Option<String>,
}

/// Scan filters. `extensions` and `skip_patterns` replace the built-in lists;
/// `extra_skip_patterns` extends whichever deny-list is in effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub extensions: Option<Vec<String>>,
    pub skip_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub extra_skip_patterns: Vec<String>,
    pub max_file_tokens: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_output_tokens: Option<usize>,
    pub timeout_secs: Option<u64>,
}

fn discover_config_paths(explicit_path: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(user_config) = get_user_config_path() {
        paths.push(user_config);
    }

    if let Some(git_root) = find_git_root() {
        let git_config = git_root.join(CONFIG_FILE_NAME);
        if git_config.exists() {
            paths.push(git_config);
        }
    }

    let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
    if current_dir_config.exists() && !paths.iter().any(|p| same_file(p, &current_dir_config)) {
        paths.push(current_dir_config);
    }

    if let Some(explicit) = explicit_path {
        paths.push(explicit.to_path_buf());
    }

    paths
}

fn same_file(a: &Path, b: &Path) -> bool {
    matches!((a.canonicalize(), b.canonicalize()), (Ok(a), Ok(b)) if a == b)
}

fn find_git_root() -> Option<PathBuf> {
    git2::Repository::discover(".")
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
}

fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|config_dir| config_dir.join("ctxpack").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load configuration from discovered config files and environment variables.
///
/// An explicit `--config` path must exist; discovered files are optional.
pub fn load(args: &Args) -> Result<Config> {
    if let Some(explicit) = &args.config {
        if !explicit.exists() {
            return Err(CtxpackError::Config(format!(
                "Config file '{}' does not exist",
                explicit.display()
            )))
            .context("Failed to load configuration");
        }
    }

    let mut builder = config::Config::builder();

    for config_path in discover_config_paths(args.config.as_deref()) {
        tracing::debug!(path = %config_path.display(), "Loading config file");
        builder = builder.add_source(config::File::from(config_path));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CTXPACK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("scan.extensions")
            .with_list_parse_key("scan.skip_patterns")
            .with_list_parse_key("scan.extra_skip_patterns"),
    );

    let settings = builder.build().context("Failed to build configuration")?;

    settings
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Resolve CLI flags over file and environment settings and validate the result.
pub fn merge_config(args: &Args, config: Config) -> Result<MergedConfig, CtxpackError> {
    let command = args.command.clone().unwrap_or(Command::Serve { max_tokens: None });

    let max_tokens = command
        .max_tokens()
        .or(config.general.max_tokens)
        .unwrap_or(DEFAULT_MAX_TOKENS);
    if max_tokens == 0 {
        return Err(CtxpackError::invalid_budget("max_tokens", max_tokens));
    }

    let tokenizer = match args.tokenizer.as_deref().or(config.general.tokenizer.as_deref()) {
        Some(name) => name.parse::<TokenizerKind>()?,
        None => TokenizerKind::default(),
    };

    let scan = config.scan;
    let max_file_tokens = scan.max_file_tokens.unwrap_or(DEFAULT_MAX_FILE_TOKENS);
    if max_file_tokens == 0 {
        return Err(CtxpackError::invalid_budget("max_file_tokens", max_file_tokens));
    }

    let provider = config.provider;

    Ok(MergedConfig {
        command,
        max_tokens,
        tokenizer,
        extensions: scan.extensions.unwrap_or_else(|| strings(DEFAULT_EXTENSIONS)),
        skip_patterns: scan
            .skip_patterns
            .unwrap_or_else(|| strings(DEFAULT_SKIP_PATTERNS)),
        extra_skip_patterns: scan.extra_skip_patterns,
        max_file_tokens,
        model: args
            .model
            .clone()
            .or(provider.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
        base_url: provider
            .base_url
            .unwrap_or_else(|| GEMINI_API_URL.to_owned()),
        max_output_tokens: provider
            .max_output_tokens
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        timeout_secs: provider.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        verbose: args.verbose,
        quiet: args.quiet,
    })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl MergedConfig {
    /// The effective settings in config-file form, for `ctxpack config`.
    pub fn to_config(&self) -> Config {
        Config {
            general: GeneralConfig {
                max_tokens: Some(self.max_tokens),
                tokenizer: Some(self.tokenizer.to_string()),
            },
            scan: ScanConfig {
                extensions: Some(self.extensions.clone()),
                skip_patterns: Some(self.skip_patterns.clone()),
                extra_skip_patterns: self.extra_skip_patterns.clone(),
                max_file_tokens: Some(self.max_file_tokens),
            },
            provider: ProviderConfig {
                model: Some(self.model.clone()),
                base_url: Some(self.base_url.clone()),
                max_output_tokens: Some(self.max_output_tokens),
                timeout_secs: Some(self.timeout_secs),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("ctxpack").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let merged = merge_config(&args(&[]), Config::default()).unwrap();
        assert_eq!(merged.command, Command::Serve { max_tokens: None });
        assert_eq!(merged.max_tokens, 900_000);
        assert_eq!(merged.tokenizer, TokenizerKind::Tiktoken);
        assert_eq!(merged.max_file_tokens, 50_000);
        assert!(merged.skip_patterns.iter().any(|p| p == "node_modules"));
        assert!(merged.extensions.iter().any(|e| e == "py"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let config = Config {
            general: GeneralConfig {
                max_tokens: Some(5_000),
                tokenizer: Some("tiktoken".into()),
            },
            ..Config::default()
        };
        let merged = merge_config(
            &args(&["pack", ".", "--max-tokens", "1000", "--tokenizer", "estimate"]),
            config,
        )
        .unwrap();
        assert_eq!(merged.max_tokens, 1000);
        assert_eq!(merged.tokenizer, TokenizerKind::Estimate);
    }

    #[test]
    fn test_file_value_used_when_flag_absent() {
        let config = Config {
            general: GeneralConfig {
                max_tokens: Some(5_000),
                tokenizer: None,
            },
            ..Config::default()
        };
        let merged = merge_config(&args(&["pack", "."]), config).unwrap();
        assert_eq!(merged.max_tokens, 5_000);
    }

    #[test]
    fn test_zero_budgets_are_rejected() {
        let err = merge_config(&args(&["pack", ".", "--max-tokens", "0"]), Config::default())
            .unwrap_err();
        assert!(matches!(err, CtxpackError::ValidationError { .. }));

        let config = Config {
            scan: ScanConfig {
                max_file_tokens: Some(0),
                ..ScanConfig::default()
            },
            ..Config::default()
        };
        assert!(merge_config(&args(&[]), config).is_err());
    }

    #[test]
    fn test_unknown_tokenizer_is_rejected() {
        let err = merge_config(&args(&["--tokenizer", "bpe"]), Config::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid tokenizer"));
    }

    #[test]
    fn test_effective_config_renders_as_toml() {
        let merged = merge_config(&args(&[]), Config::default()).unwrap();
        let rendered = toml::to_string_pretty(&merged.to_config()).unwrap();
        assert!(rendered.contains("[general]"));
        assert!(rendered.contains("max_tokens = 900000"));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, merged.to_config());
    }

    #[test]
    fn test_config_file_parses_sections() {
        let parsed: Config = toml::from_str(
            r#"
            [scan]
            extra_skip_patterns = ["fixtures"]
            [provider]
            model = "gemini-test"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.scan.extra_skip_patterns, ["fixtures"]);
        assert_eq!(parsed.provider.model.as_deref(), Some("gemini-test"));
        assert_eq!(parsed.general, GeneralConfig::default());
    }
}
