// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! # ctxpack
//!
//! ctxpack turns a source tree into a single token-budgeted context document
//! and serves it to a tool-calling agent over line-delimited JSON-RPC.
//!
//! The pipeline runs in one direction:
//!
//! 1. **Scan** ([`packer::walker`]) - walk the tree, filter by extension and
//!    deny-list, decode, count tokens and score every admissible file
//! 2. **Pack** ([`packer::budget`]) - keep the longest prefix of the ranked
//!    files that fits the token budget
//! 3. **Serialize** ([`packer::output`]) - render the selection as Markdown
//! 4. **Serve** ([`server`]) - hold the result in a [`session::Session`] and
//!    answer analysis tool calls through a generation provider ([`llm`])
//!
//! Configuration follows hierarchical precedence:
//! 1. User config (~/.config/ctxpack/config.toml)
//! 2. Git root (ctxpack.toml)
//! 3. Current directory (ctxpack.toml)
//! 4. Explicit --config path
//! 5. Environment variables (CTXPACK_*)
//! 6. CLI flags (highest precedence)

pub mod cli;
pub mod llm;
pub mod packer;
pub mod server;
pub mod session;
pub mod utils;

use anyhow::{Context, Result};
use cli::args::Command;
use llm::LLMClient;
use llm::tokenizer::{TokenizerKind, build_tokenizer};
use packer::{Ingestor, ScanRules, ScoringWeights, serialize};
use server::Server;
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Final resolved configuration after merging all sources (CLI, env, config files).
#[derive(Debug, Clone)]
pub struct MergedConfig {
    /// Subcommand to run; `Serve` when none was given
    pub command: Command,
    /// Token budget for a scan
    pub max_tokens: usize,
    pub tokenizer: TokenizerKind,
    /// Admitted file extensions
    pub extensions: Vec<String>,
    /// Deny-list (substrings and file-name globs)
    pub skip_patterns: Vec<String>,
    /// Appended to `skip_patterns`
    pub extra_skip_patterns: Vec<String>,
    /// Per-file token ceiling
    pub max_file_tokens: usize,
    /// Generation model name
    pub model: String,
    /// Generation API base URL
    pub base_url: String,
    pub max_output_tokens: usize,
    pub timeout_secs: u64,
    /// Verbosity level (0-2)
    pub verbose: u8,
    /// Only log warnings and errors
    pub quiet: bool,
}

/// Install the stderr `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the `-v`/`-q` flags. Stdout is left
/// untouched because it carries the JSON-RPC stream.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,ctxpack={level}")));

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Build the scan pipeline described by `config`.
pub fn build_ingestor(config: &MergedConfig) -> Result<Ingestor> {
    let rules = ScanRules::new(
        &config.extensions,
        &config.skip_patterns,
        config.max_file_tokens,
    )
    .and_then(|rules| rules.with_extra_skip_patterns(&config.extra_skip_patterns))
    .context("Failed to build scan rules")?;

    Ok(Ingestor::new(
        rules,
        ScoringWeights::default(),
        build_tokenizer(config.tokenizer),
    ))
}

/// Generation client, or `None` when no provider can be configured.
#[cfg(feature = "gemini")]
pub fn build_client(config: &MergedConfig) -> Option<LLMClient> {
    use llm::providers::gemini::GeminiProvider;
    use std::time::Duration;

    let api_key = match GeminiProvider::api_key_from_env() {
        Ok(key) => key,
        Err(e) => {
            tracing::info!("{e}; analysis tools are disabled");
            return None;
        }
    };

    match GeminiProvider::with_options(
        api_key,
        config.model.clone(),
        config.base_url.clone(),
        config.max_output_tokens,
        Duration::from_secs(config.timeout_secs),
    ) {
        Ok(provider) => Some(LLMClient::new(Box::new(provider))),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create generation client; analysis tools are disabled");
            None
        }
    }
}

#[cfg(not(feature = "gemini"))]
pub fn build_client(_config: &MergedConfig) -> Option<LLMClient> {
    tracing::info!("Built without a generation provider; analysis tools are disabled");
    None
}

pub async fn run(config: MergedConfig) -> Result<()> {
    tracing::debug!(
        "ctxpack v{}: max_tokens={}, tokenizer={}, model={}",
        env!("CARGO_PKG_VERSION"),
        config.max_tokens,
        config.tokenizer,
        config.model
    );

    match &config.command {
        Command::Config => {
            let rendered = toml::to_string_pretty(&config.to_config())
                .map_err(utils::error::CtxpackError::from)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
        Command::Pack { path, dry_run, .. } => {
            let ingestor = build_ingestor(&config)?;
            let result = ingestor.scan(path, config.max_tokens)?;
            let mut stdout = std::io::stdout().lock();
            if *dry_run {
                utils::summary::write_pack_summary(
                    &mut stdout,
                    &result,
                    ingestor.tokenizer().name(),
                )?;
            } else {
                stdout.write_all(serialize(&result).as_bytes())?;
            }
            stdout.flush()?;
        }
        Command::Serve { .. } => {
            let ingestor = build_ingestor(&config)?;
            let client = build_client(&config);
            let mut server = Server::new(ingestor, client, config.max_tokens);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            server
                .serve(stdin, tokio::io::stdout())
                .await
                .context("JSON-RPC server failed")?;
        }
    }

    Ok(())
}
