use serde::{Deserialize, Serialize};

/// API keys for the external services the pipeline talks to
///
/// All keys are optional: the GitHub token merely raises rate limits, and
/// the AI cascade is assembled from whichever provider keys are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// GitHub API token for authenticated listing/content requests
    pub github: Option<String>,
    /// OpenAI API key (direct chat-completions access)
    pub openai: Option<String>,
    /// API key for a preferred OpenAI-compatible gateway
    pub gateway: Option<String>,
    /// Chat-completions endpoint of the preferred gateway
    pub gateway_url: Option<String>,
    /// Model identifier to request from the preferred gateway
    pub gateway_model: Option<String>,
    /// fal.ai key for slide image generation
    pub fal: Option<String>,
    /// Gradium key for narration speech synthesis
    pub gradium: Option<String>,
}

impl ApiKeys {
    /// Reads all keys from the process environment
    pub fn from_env() -> Self {
        Self {
            github: std::env::var("GITHUB_API_KEY").ok(),
            openai: std::env::var("OPENAI_API_KEY").ok(),
            gateway: std::env::var("AI_GATEWAY_API_KEY").ok(),
            gateway_url: std::env::var("AI_GATEWAY_URL").ok(),
            gateway_model: std::env::var("AI_GATEWAY_MODEL").ok(),
            fal: std::env::var("FAL_API_KEY").ok(),
            gradium: std::env::var("GRADIUM_API_KEY").ok(),
        }
    }

    /// True when at least one chat provider key is configured
    pub fn has_ai_provider(&self) -> bool {
        self.openai.is_some() || (self.gateway.is_some() && self.gateway_url.is_some())
    }
}
