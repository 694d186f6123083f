// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

pub mod client;
pub mod provider;
pub mod providers;
pub mod tokenizer;

pub use client::{LLMClient, RetryConfig};
pub use provider::{CompletionOptions, CompletionResponse, LLMProvider, Message};
pub use tokenizer::{
    EstimatingTokenizer, TiktokenTokenizer, Tokenizer, TokenizerKind, build_tokenizer,
};
