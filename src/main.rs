// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use ctxpack::utils::error::{CtxpackError, format_error};
use ctxpack::{cli, run};

#[tokio::main]
async fn main() {
    // Decided before argument parsing so early errors can use it too
    let verbose = std::env::args().any(|arg| arg.starts_with("-v") && arg.chars().skip(1).all(|c| c == 'v'));

    if let Err(e) = run_main().await {
        display_error(&e, verbose);
        std::process::exit(1);
    }
}

/// Display an error with contextual formatting.
///
/// Tries to downcast to `CtxpackError` for rich formatting, falls back to
/// anyhow's error chain display for other errors.
fn display_error(error: &anyhow::Error, verbose: bool) {
    if let Some(ctxpack_error) = error.downcast_ref::<CtxpackError>() {
        eprintln!("{}", format_error(ctxpack_error, verbose));
    } else {
        eprintln!("\n\u{26a0} Error: {error}");

        let causes: Vec<_> = error.chain().skip(1).collect();
        if !causes.is_empty() {
            eprintln!("\nCaused by:");
            for (i, cause) in causes.iter().enumerate() {
                let prefix = if i == causes.len() - 1 {
                    "\u{2514}\u{2500}"
                } else {
                    "\u{251c}\u{2500}"
                };
                eprintln!("{prefix} {cause}");
            }
        }

        if verbose {
            let backtrace = error.backtrace();
            if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
                eprintln!("\nBacktrace:\n{backtrace}");
            }
        }
    }
}

async fn run_main() -> Result<()> {
    let args = cli::args::parse();

    ctxpack::init_logging(args.verbose, args.quiet);

    let config = cli::config::load(&args)?;
    let merged_config = cli::config::merge_config(&args, config)?;

    run(merged_config).await
}
