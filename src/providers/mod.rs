//! AI provider abstraction and the OpenAI-compatible structured client
//!
//! Every provider in the cascade is a plain [`Provider`] record; the actual
//! network call goes through the [`StructuredModel`] trait so the cascade
//! logic stays provider-agnostic and testable with scripted fakes.

pub mod cascade;

use crate::config::ApiKeys;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::error;

pub use cascade::{CascadeOutcome, ProviderCascade};

const OPENAI_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const AI_REQUEST_TIMEOUT_SECS: u64 = 90;

/// One configured AI provider
///
/// The list of providers is ordered best-quality-first at startup and never
/// mutated; the ordering doubles as the failover sequence.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Display name used in logs and error messages
    pub name: String,
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Bearer key for the endpoint
    pub api_key: String,
    /// Model identifier to request
    pub model: String,
}

impl Provider {
    /// Builds the provider cascade from whichever keys are configured
    ///
    /// A configured gateway goes first (preferred model), then direct
    /// OpenAI, then the mini fallback. An empty result means no AI provider
    /// is usable.
    pub fn cascade_from_keys(keys: &ApiKeys) -> Vec<Provider> {
        let mut providers = Vec::new();

        if let (Some(key), Some(url)) = (&keys.gateway, &keys.gateway_url) {
            let model = keys
                .gateway_model
                .clone()
                .unwrap_or_else(|| "openai/gpt-5.2".to_string());
            providers.push(Provider {
                name: format!("Gateway ({})", model),
                endpoint: url.clone(),
                api_key: key.clone(),
                model,
            });
        }

        if let Some(key) = &keys.openai {
            providers.push(Provider {
                name: "OpenAI Direct (gpt-4.1)".to_string(),
                endpoint: OPENAI_CHAT_ENDPOINT.to_string(),
                api_key: key.clone(),
                model: "gpt-4.1".to_string(),
            });
            providers.push(Provider {
                name: "OpenAI Mini (gpt-4.1-mini)".to_string(),
                endpoint: OPENAI_CHAT_ENDPOINT.to_string(),
                api_key: key.clone(),
                model: "gpt-4.1-mini".to_string(),
            });
        }

        providers
    }
}

/// Typed failure from one structured-output attempt
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Authentication failed; never retried on this provider
    #[error("auth failed: {0}")]
    Auth(String),
    /// Billing/credits exhausted; never retried on this provider
    #[error("credits exhausted: {0}")]
    Quota(String),
    /// Provider-side rate limit; retried with backoff
    #[error("rate limited: {0}")]
    Throttled(String),
    /// The provider replied without the expected structured payload
    #[error("no structured data returned: {0}")]
    Malformed(String),
    /// Anything else; retried with backoff
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Terminal failures abandon the provider immediately
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Quota(_))
    }
}

/// JSON-schema description of the structured payload a call must return
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    /// Tool/function name the model is forced to call
    pub name: String,
    /// Short description shown to the model
    pub description: String,
    /// JSON schema for the function parameters
    pub parameters: Value,
}

/// A structured-output AI call against one provider
#[async_trait]
pub trait StructuredModel: Send + Sync {
    /// Performs one attempt and returns the schema-shaped payload
    async fn invoke(
        &self,
        provider: &Provider,
        system_prompt: &str,
        user_prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<Value, ProviderError>;
}

/// Chat-completions client for OpenAI-compatible endpoints
///
/// Structured output is obtained by forcing a single tool call whose
/// arguments must match the response schema.
pub struct OpenAiCompatClient {
    client: Client,
}

impl OpenAiCompatClient {
    /// Creates a client with the default AI request timeout
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(AI_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for OpenAiCompatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StructuredModel for OpenAiCompatClient {
    async fn invoke(
        &self,
        provider: &Provider,
        system_prompt: &str,
        user_prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<Value, ProviderError> {
        let body = json!({
            "model": provider.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": schema.name,
                    "description": schema.description,
                    "parameters": schema.parameters,
                },
            }],
            "tool_choice": { "type": "function", "function": { "name": schema.name } },
        });

        let response = self
            .client
            .post(&provider.endpoint)
            .bearer_auth(&provider.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Other(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let err_text = response.text().await.unwrap_or_default();
            error!("{} error: {} {}", provider.name, status, err_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED => ProviderError::Auth(err_text),
                StatusCode::PAYMENT_REQUIRED => ProviderError::Quota(err_text),
                StatusCode::TOO_MANY_REQUESTS => {
                    // Some providers report exhausted billing quotas as 429.
                    if err_text.contains("insufficient_quota")
                        || err_text.contains("exceeded your current quota")
                    {
                        ProviderError::Quota(err_text)
                    } else {
                        ProviderError::Throttled(err_text)
                    }
                }
                _ => ProviderError::Other(format!("HTTP {}: {}", status, err_text)),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let arguments = data["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::Malformed("response carried no tool call".to_string())
            })?;

        serde_json::from_str(arguments)
            .map_err(|e| ProviderError::Malformed(format!("unparsable tool arguments: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_from_keys_ordering() {
        let keys = ApiKeys {
            openai: Some("sk-test".into()),
            gateway: Some("gw-test".into()),
            gateway_url: Some("https://gateway.example/v1/chat/completions".into()),
            gateway_model: Some("vendor/large".into()),
            ..ApiKeys::default()
        };

        let providers = Provider::cascade_from_keys(&keys);
        assert_eq!(providers.len(), 3);
        assert!(providers[0].name.starts_with("Gateway"));
        assert_eq!(providers[1].model, "gpt-4.1");
        assert_eq!(providers[2].model, "gpt-4.1-mini");
    }

    #[test]
    fn test_cascade_from_keys_empty() {
        assert!(Provider::cascade_from_keys(&ApiKeys::default()).is_empty());
    }

    #[test]
    fn test_terminal_errors() {
        assert!(ProviderError::Auth("401".into()).is_terminal());
        assert!(ProviderError::Quota("402".into()).is_terminal());
        assert!(!ProviderError::Throttled("429".into()).is_terminal());
        assert!(!ProviderError::Malformed("empty".into()).is_terminal());
        assert!(!ProviderError::Other("boom".into()).is_terminal());
    }
}
