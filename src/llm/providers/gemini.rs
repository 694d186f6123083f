// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

use crate::llm::provider::{CompletionOptions, CompletionResponse, LLMProvider, Message};
use crate::utils::error::CtxpackError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 8192;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const PROVIDER_NAME: &str = "gemini";

/// Google Gemini provider using the `generateContent` REST endpoint.
///
/// # Configuration
///
/// - `GEMINI_API_KEY` env var is required for authentication
/// - Config file: `[provider] model`, `base_url`, `max_output_tokens`,
///   `timeout_secs`
///
/// # Examples
///
/// ```no_run
/// use ctxpack::llm::providers::gemini::GeminiProvider;
///
/// let provider = GeminiProvider::new("your-api-key".to_owned(), "gemini-2.0-flash".to_owned())?;
/// # Ok::<(), ctxpack::utils::error::CtxpackError>(())
/// ```
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    max_output_tokens: usize,
    client: Client,
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: usize,
}

/// Error envelope returned by the Gemini API.
#[derive(Debug, Deserialize)]
struct GeminiError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    status: String,
    message: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String) -> Result<Self, CtxpackError> {
        Self::with_options(
            api_key,
            model,
            GEMINI_API_URL.to_owned(),
            DEFAULT_MAX_OUTPUT_TOKENS,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        api_key: String,
        model: String,
        base_url: String,
        max_output_tokens: usize,
        timeout: Duration,
    ) -> Result<Self, CtxpackError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_output_tokens,
            client,
        })
    }

    /// Read the API key from `GEMINI_API_KEY`.
    pub fn api_key_from_env() -> Result<String, CtxpackError> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CtxpackError::missing_api_key(PROVIDER_NAME))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// System messages become `systemInstruction`; assistant turns map to the
    /// `model` role.
    fn build_request<'a>(
        &self,
        messages: &'a [Message],
        options: &CompletionOptions,
    ) -> GenerateRequest<'a> {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            let part = Part {
                text: &message.content,
            };
            match message.role.as_str() {
                "system" => system_parts.push(part),
                "assistant" | "model" => contents.push(Content {
                    role: Some("model"),
                    parts: vec![part],
                }),
                _ => contents.push(Content {
                    role: Some("user"),
                    parts: vec![part],
                }),
            }
        }

        let system_instruction = (!system_parts.is_empty()).then_some(Content {
            role: None,
            parts: system_parts,
        });

        GenerateRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens.unwrap_or(self.max_output_tokens),
            },
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, CtxpackError> {
        let body = self.build_request(messages, options);

        tracing::debug!(model = %self.model, messages = messages.len(), "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);

            return Err(CtxpackError::RateLimited {
                provider: PROVIDER_NAME.to_owned(),
                retry_after,
            });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error) = serde_json::from_str::<GeminiError>(&error_text) {
                let message = if error.error.status.is_empty() {
                    error.error.message
                } else {
                    format!("{}: {}", error.error.status, error.error.message)
                };
                return Err(CtxpackError::Provider {
                    provider: PROVIDER_NAME.to_owned(),
                    message,
                });
            }

            return Err(CtxpackError::Provider {
                provider: PROVIDER_NAME.to_owned(),
                message: format!("HTTP {status}: {error_text}"),
            });
        }

        let response_body: GenerateResponse = response.json().await?;

        let content: String = response_body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CtxpackError::Provider {
                provider: PROVIDER_NAME.to_owned(),
                message: "Response contained no text candidates".to_owned(),
            });
        }

        Ok(CompletionResponse {
            content,
            tokens_used: response_body
                .usage_metadata
                .map_or(0, |usage| usage.total_token_count),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
