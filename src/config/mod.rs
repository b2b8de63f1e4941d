mod env_manager;

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;

pub use env_manager::ApiKeys;

/// Main configuration struct for the application
///
/// Holds API keys plus the sampling, cascade, asset, and rate-limit policy
/// knobs. Every knob ships with the default the service was tuned with, but
/// none of them is hard-coded at a call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeys,
    /// File sampling and content truncation settings
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// AI provider cascade retry settings
    #[serde(default)]
    pub cascade: CascadeConfig,
    /// Narration/image generation retry settings
    #[serde(default)]
    pub assets: AssetConfig,
    /// Per-client request admission settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Wall-clock budget for one whole analysis, in seconds
    #[serde(default = "default_pipeline_timeout")]
    pub pipeline_timeout_secs: u64,
}

/// File sampling and truncation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Default requested file budget when the caller does not pass one
    pub default_max_files: usize,
    /// Hard upper bound on the requested file budget
    pub max_files_cap: usize,
    /// Number of concurrent content fetches per batch
    pub fetch_batch_size: usize,
    /// Files longer than this many lines get head/tail truncated
    pub truncate_threshold_lines: usize,
    /// Lines kept from the top of a truncated file
    pub truncate_head_lines: usize,
    /// Lines kept from the bottom of a truncated file
    pub truncate_tail_lines: usize,
}

/// AI provider cascade retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Retries after the initial attempt, per provider
    pub max_retries_per_provider: u32,
    /// Exponential backoff base in milliseconds (`base * attempt`)
    pub backoff_base_ms: u64,
}

/// Asset generation retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Retries after the initial attempt, per narration clip
    pub audio_max_retries: u32,
    /// Linear backoff base in milliseconds (`base * attempt`)
    pub audio_backoff_base_ms: u64,
}

/// Per-client request admission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per client per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Config {
    /// Loads configuration from the default config file location
    ///
    /// If the config file doesn't exist, returns the default configuration
    /// with API keys taken from the environment. The config file is expected
    /// to be in TOML format.
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AnalyzerError::Config("Could not find config directory".into()))?;
        let config_path = config_dir.join("codetale").join("config.toml");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| AnalyzerError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| AnalyzerError::Config(format!("Failed to parse config file: {}", e)))?;

        // Environment keys win over file keys so deployments can rotate
        // credentials without touching the file.
        let env_keys = ApiKeys::from_env();
        if env_keys.github.is_some() {
            config.api_keys.github = env_keys.github;
        }
        if env_keys.openai.is_some() {
            config.api_keys.openai = env_keys.openai;
        }
        if env_keys.gateway.is_some() {
            config.api_keys.gateway = env_keys.gateway;
            config.api_keys.gateway_url = env_keys.gateway_url;
            config.api_keys.gateway_model = env_keys.gateway_model;
        }
        if env_keys.fal.is_some() {
            config.api_keys.fal = env_keys.fal;
        }
        if env_keys.gradium.is_some() {
            config.api_keys.gradium = env_keys.gradium;
        }

        Ok(config)
    }

    /// Clamps a caller-requested file budget into the allowed range
    pub fn clamp_max_files(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.sampling.default_max_files)
            .clamp(1, self.sampling.max_files_cap)
    }
}

fn default_pipeline_timeout() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::from_env(),
            sampling: SamplingConfig::default(),
            cascade: CascadeConfig::default(),
            assets: AssetConfig::default(),
            rate_limit: RateLimitConfig::default(),
            pipeline_timeout_secs: default_pipeline_timeout(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            default_max_files: 30,
            max_files_cap: 50,
            fetch_batch_size: 5,
            truncate_threshold_lines: 300,
            truncate_head_lines: 100,
            truncate_tail_lines: 50,
        }
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_retries_per_provider: 2,
            backoff_base_ms: 2000,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            audio_max_retries: 3,
            audio_backoff_base_ms: 1500,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}
