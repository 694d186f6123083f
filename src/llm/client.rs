// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

use crate::llm::provider::{CompletionOptions, CompletionResponse, LLMProvider, Message};
use crate::utils::error::CtxpackError;
use std::time::Duration;

/// Configuration for retry behavior on transient failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (0-based), doubling each time
    /// and capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

pub struct LLMClient {
    provider: Box<dyn LLMProvider>,
    retry_config: RetryConfig,
}

impl LLMClient {
    pub fn new(provider: Box<dyn LLMProvider>) -> Self {
        Self {
            provider,
            retry_config: RetryConfig::default(),
        }
    }

    /// Create a new LLMClient with custom retry configuration.
    pub fn with_retry_config(provider: Box<dyn LLMProvider>, retry_config: RetryConfig) -> Self {
        Self {
            provider,
            retry_config,
        }
    }

    /// Complete a prompt, retrying rate limits and network failures.
    ///
    /// A `retry-after` hint from the provider takes precedence over the
    /// computed backoff, still capped at `max_delay_ms`.
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, CtxpackError> {
        let mut attempt = 0;
        loop {
            match self.provider.complete(messages, options).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && attempt < self.retry_config.max_retries => {
                    let delay = match &err {
                        CtxpackError::RateLimited {
                            retry_after: Some(hint),
                            ..
                        } => (*hint).min(Duration::from_millis(self.retry_config.max_delay_ms)),
                        _ => self.retry_config.delay_for(attempt),
                    };
                    tracing::warn!(
                        model = self.provider.model(),
                        attempt = attempt + 1,
                        max_retries = self.retry_config.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Single-prompt convenience wrapper used by the analysis tools.
    pub async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, CtxpackError> {
        let messages = [Message::user(prompt)];
        let options = CompletionOptions::with_temperature(temperature);
        let response = self.complete(&messages, &options).await?;
        Ok(response.content)
    }

    /// Get the model name from the provider.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Get the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider that replays a fixed sequence of outcomes.
    struct Scripted {
        outcomes: Mutex<Vec<Result<CompletionResponse, CtxpackError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<CompletionResponse, CtxpackError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for Scripted {
        async fn complete(
            &self,
            _messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, CtxpackError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(CtxpackError::Config("script exhausted".into())))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn ok(text: &str) -> Result<CompletionResponse, CtxpackError> {
        Ok(CompletionResponse {
            content: text.to_owned(),
            tokens_used: 1,
        })
    }

    fn rate_limited() -> Result<CompletionResponse, CtxpackError> {
        Err(CtxpackError::RateLimited {
            provider: "scripted".into(),
            retry_after: Some(Duration::from_millis(1)),
        })
    }

    fn fast_retries() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 30000);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for(4), Duration::from_millis(16000));
        assert_eq!(config.delay_for(5), Duration::from_millis(30000));
        assert_eq!(config.delay_for(80), Duration::from_millis(30000));
    }

    #[tokio::test]
    async fn test_retries_rate_limits_then_succeeds() {
        let provider = Scripted::new(vec![rate_limited(), ok("done")]);
        let client = LLMClient::with_retry_config(Box::new(provider), fast_retries());
        let text = client.generate("hello", 0.2).await.unwrap();
        assert_eq!(text, "done");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let provider = Scripted::new(vec![rate_limited(), rate_limited(), rate_limited(), ok("late")]);
        let client = LLMClient::with_retry_config(Box::new(provider), fast_retries());
        let err = client.generate("hello", 0.2).await.unwrap_err();
        assert!(matches!(err, CtxpackError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_provider_errors_are_not_retried() {
        let provider = Scripted::new(vec![
            Err(CtxpackError::Provider {
                provider: "scripted".into(),
                message: "bad request".into(),
            }),
            ok("unreachable"),
        ]);
        let client = LLMClient::with_retry_config(Box::new(provider), fast_retries());
        let err = client.generate("hello", 0.2).await.unwrap_err();
        assert!(matches!(err, CtxpackError::Provider { .. }));
    }
}
