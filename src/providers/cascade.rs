//! Ordered provider failover for structured AI calls
//!
//! Providers are tried best-first. Throttling and malformed replies are
//! retried on the same provider with increasing backoff; auth and quota
//! failures abandon the provider immediately. The first success wins, and
//! only when every provider/attempt combination has failed does the caller
//! see an error.

use super::{Provider, ProviderError, ResponseSchema, StructuredModel};
use crate::config::CascadeConfig;
use crate::error::{AnalyzerError, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// A successful cascade invocation
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    /// The schema-shaped payload the provider returned
    pub payload: Value,
    /// Model identifier that produced the payload
    pub model_used: String,
    /// Display name of the provider that succeeded
    pub provider_name: String,
}

/// Drives one structured-output call across an ordered provider list
pub struct ProviderCascade {
    providers: Vec<Provider>,
    model: Arc<dyn StructuredModel>,
    max_retries_per_provider: u32,
    backoff_base: Duration,
}

impl ProviderCascade {
    /// Creates a cascade over `providers`, calling through `model`
    pub fn new(
        providers: Vec<Provider>,
        model: Arc<dyn StructuredModel>,
        config: &CascadeConfig,
    ) -> Self {
        Self {
            providers,
            model,
            max_retries_per_provider: config.max_retries_per_provider,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Names of the configured providers, in failover order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }

    /// Invokes the cascade and returns the first successful payload
    pub async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<CascadeOutcome> {
        if self.providers.is_empty() {
            return Err(AnalyzerError::Config("No AI API key configured".into()));
        }

        info!("AI cascade: {}", self.provider_names().join(" -> "));

        let mut last_error: Option<(String, ProviderError)> = None;

        for provider in &self.providers {
            info!("trying {}", provider.name);

            for attempt in 0..=self.max_retries_per_provider {
                if attempt > 0 {
                    let backoff = self.backoff_base * attempt;
                    info!("retry {} for {} after {:?}", attempt, provider.name, backoff);
                    sleep(backoff).await;
                }

                match self
                    .model
                    .invoke(provider, system_prompt, user_prompt, schema)
                    .await
                {
                    Ok(payload) => {
                        info!("structured response from {}", provider.name);
                        return Ok(CascadeOutcome {
                            payload,
                            model_used: provider.model.clone(),
                            provider_name: provider.name.clone(),
                        });
                    }
                    Err(err) => {
                        warn!("{} attempt {} failed: {}", provider.name, attempt + 1, err);
                        let terminal = err.is_terminal();
                        last_error = Some((provider.name.clone(), err));
                        if terminal {
                            break;
                        }
                    }
                }
            }
        }

        let (provider_name, err) =
            last_error.expect("at least one provider was attempted");
        Err(match err {
            ProviderError::Quota(_) => {
                AnalyzerError::QuotaExhausted(format!("{}: {}", provider_name, err))
            }
            ProviderError::Throttled(_) => AnalyzerError::Throttled {
                message: format!("{}: {}", provider_name, err),
                retry_after_seconds: None,
            },
            other => {
                AnalyzerError::AllProvidersExhausted(format!("{}: {}", provider_name, other))
            }
        })
    }
}
