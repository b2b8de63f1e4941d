//! Request/response types and error mapping for the HTTP service

use crate::error::AnalyzerError;
use crate::orchestrator::AnalysisMetadata;
use crate::prompts::AnalysisOptions;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body of `POST /api/analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Public GitHub repository URL
    pub repo_url: String,
    /// Optional analysis tuning
    #[serde(default)]
    pub options: AnalyzeRequestOptions,
}

/// Caller-tunable analysis options
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequestOptions {
    /// Requested file budget; clamped server-side
    pub max_files: Option<usize>,
    pub include_narrative: Option<bool>,
    pub include_mermaid: Option<bool>,
    /// `developer`, `manager`, `investor`, or `all`
    pub target_audience: Option<String>,
}

impl AnalyzeRequestOptions {
    /// Converts the wire options into prompt-shaping options
    pub fn to_analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            include_narrative: self.include_narrative.unwrap_or(true),
            include_mermaid: self.include_mermaid.unwrap_or(true),
            target_audience: self
                .target_audience
                .clone()
                .unwrap_or_else(|| "all".to_string()),
        }
    }
}

/// Body of `POST /api/presentation`
#[derive(Debug, Deserialize)]
pub struct PresentationRequest {
    /// Public GitHub repository URL
    pub repo_url: String,
    /// `developer` or `storyteller` tone
    pub mode: Option<String>,
    /// Narration language (`en`, `fr`, `de`)
    pub language: Option<String>,
}

/// Successful body of `POST /api/analyze`
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub analysis: Value,
    pub metadata: AnalysisMetadata,
}

/// Maps an error to its HTTP status code and `{status, error, code}` body
///
/// No stack traces and no internal tag prefixes reach the caller; throttled
/// responses carry a retry hint.
pub fn error_body(err: &AnalyzerError) -> (u16, Value) {
    let code = err.status_code();
    let mut body = json!({
        "status": "error",
        "error": err.public_message(),
        "code": code,
    });
    if let AnalyzerError::Throttled {
        retry_after_seconds: Some(secs),
        ..
    } = err
    {
        body["retry_after_seconds"] = json!(secs);
    }
    (code, body)
}

/// Identifies the client for rate limiting
///
/// First `x-forwarded-for` entry, else `cf-connecting-ip`, else `"unknown"`.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("cf-connecting-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string())
}
