#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! CodeTale - AI-generated repository analysis and presentations
//!
//! The crate implements the sampling and AI-orchestration pipeline behind
//! the CodeTale service: deciding which files of a potentially huge
//! repository to read, fetching and truncating their content under strict
//! budgets, and driving a multi-provider AI call with retry/fallback
//! semantics, all behind a per-client rate limiter.
//!
//! ## Usage
//! ```rust,ignore
//! use codetale::config::Config;
//! use codetale::github::GitHubClient;
//! use codetale::orchestrator::AnalysisOrchestrator;
//! use codetale::prompts::AnalysisOptions;
//! use codetale::providers::{OpenAiCompatClient, Provider, ProviderCascade};
//! use std::sync::Arc;
//!
//! async fn example() -> codetale::Result<()> {
//!     let config = Config::load()?;
//!     let github = Arc::new(GitHubClient::new(&config));
//!     let cascade = Arc::new(ProviderCascade::new(
//!         Provider::cascade_from_keys(&config.api_keys),
//!         Arc::new(OpenAiCompatClient::new()),
//!         &config.cascade,
//!     ));
//!     let orchestrator =
//!         AnalysisOrchestrator::new(github.clone(), github, cascade, config);
//!     let outcome = orchestrator
//!         .analyze("https://github.com/tokio-rs/tokio", None, &AnalysisOptions::default())
//!         .await?;
//!     println!("{}", outcome.analysis);
//!     Ok(())
//! }
//! ```

/// Request/response types and error mapping for the HTTP service
pub mod api;
/// Narration audio and slide image generation
pub mod assets;
/// Configuration and API keys
pub mod config;
/// Error handling types and utilities
pub mod error;
/// GitHub REST API client and service traits
pub mod github;
/// Logging configuration and utilities
pub mod logging;
/// Top-level analysis pipeline
pub mod orchestrator;
/// Presentation generation pipeline
pub mod presentation;
/// Prompt construction and structured-response schemas
pub mod prompts;
/// AI provider abstraction and failover cascade
pub mod providers;
/// Per-client request admission control
pub mod rate_limiter;
/// Repository sampling: filtering, prioritization, content retrieval
pub mod sampling;

// Re-export common types
pub use config::Config;
pub use error::{AnalyzerError, Result};
pub use github::{GitHubClient, TreeEntry};
pub use orchestrator::{AnalysisOrchestrator, AnalysisOutcome};
pub use presentation::{Presentation, PresentationOrchestrator, Slide};
pub use providers::{Provider, ProviderCascade};
pub use rate_limiter::RateLimiter;
pub use sampling::SamplingStats;
