// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI argument parsing with environment variable support.
///
/// Environment variables follow the pattern `CTXPACK_*` and are overridden by CLI flags.
/// Example: `CTXPACK_TOKENIZER=estimate` is overridden by `--tokenizer tiktoken`.
#[derive(Parser, Debug)]
#[command(name = "ctxpack")]
#[command(about = "Pack a codebase into a token-budgeted context document for LLM analysis")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(short, long, global = true, env = "CTXPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Token counter: tiktoken (exact cl100k_base) or estimate (bytes / 4)
    #[arg(long, global = true, env = "CTXPACK_TOKENIZER")]
    pub tokenizer: Option<String>,

    /// Generation model used by the analysis tools
    #[arg(short, long, global = true, env = "CTXPACK_MODEL")]
    pub model: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve JSON-RPC requests on stdin/stdout (default)
    Serve {
        /// Default token budget for load_codebase
        #[arg(long, env = "CTXPACK_MAX_TOKENS")]
        max_tokens: Option<usize>,
    },

    /// Scan a directory once and print the context document
    Pack {
        /// Project directory
        path: PathBuf,

        /// Token budget
        #[arg(long, env = "CTXPACK_MAX_TOKENS")]
        max_tokens: Option<usize>,

        /// Print a selection summary instead of the document
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

impl Command {
    /// Budget given on the command line, if any.
    pub fn max_tokens(&self) -> Option<usize> {
        match self {
            Self::Serve { max_tokens } | Self::Pack { max_tokens, .. } => *max_tokens,
            Self::Config => None,
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
