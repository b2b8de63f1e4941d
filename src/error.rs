use std::io;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur while analyzing a repository
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad repository URL or unusable request options
    #[error("{0}")]
    InvalidInput(String),

    /// Repository missing or private
    #[error("{0}")]
    NotFound(String),

    /// Upstream rate limit hit (GitHub listing API or an AI provider)
    #[error("{message}")]
    Throttled {
        /// Human-readable description of the limit that was hit
        message: String,
        /// Seconds until a retry is worth attempting, when known
        retry_after_seconds: Option<u64>,
    },

    /// AI provider billing/credits exhausted
    #[error("{0}")]
    QuotaExhausted(String),

    /// Every file in the repository was excluded by the sampling rules
    #[error("No source code files found in this repository.")]
    NoEligibleFiles,

    /// Every provider/attempt combination in the AI cascade failed
    #[error("All AI providers failed: {0}")]
    AllProvidersExhausted(String),

    /// The whole pipeline exceeded its wall-clock budget
    #[error("Analysis timed out after {0} seconds")]
    Timeout(u64),

    /// GitHub API errors that fit no finer category
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Asset (image/audio) service errors
    #[error("Asset generation error: {0}")]
    Asset(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// General message errors
    #[error("{0}")]
    Message(String),
}

impl AnalyzerError {
    /// Creates a new error with the specified message
    pub fn new(message: &str) -> Self {
        Self::Message(message.to_string())
    }

    /// Checks if this error is transient and retryable
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Throttled { .. } | Self::Io(_) | Self::Timeout(_)
        )
    }

    /// Checks if this error is fatal and should terminate processing
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }

    /// The HTTP status code this error maps to at the service boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::NoEligibleFiles => 400,
            Self::QuotaExhausted(_) => 402,
            Self::NotFound(_) => 404,
            Self::Throttled { .. } => 429,
            _ => 500,
        }
    }

    /// User-facing message with internal tag prefixes stripped
    ///
    /// Provider names and upstream status lines stay; `SCREAMING:` routing
    /// prefixes never reach the caller.
    pub fn public_message(&self) -> String {
        let raw = self.to_string();
        match raw.split_once(':') {
            Some((tag, rest))
                if !tag.is_empty()
                    && tag.chars().all(|c| c.is_ascii_uppercase() || c == '_') =>
            {
                rest.trim_start().to_string()
            }
            _ => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = AnalyzerError::new("test error");
        assert!(matches!(error, AnalyzerError::Message(_)));

        if let AnalyzerError::Message(msg) = error {
            assert_eq!(msg, "test error");
        }
    }

    #[test]
    fn test_is_transient() {
        let transient = AnalyzerError::Throttled {
            message: "GitHub API rate limit exceeded".into(),
            retry_after_seconds: Some(30),
        };
        let fatal = AnalyzerError::InvalidInput("bad URL".into());

        assert!(transient.is_transient());
        assert!(!fatal.is_transient());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AnalyzerError::NoEligibleFiles.status_code(), 400);
        assert_eq!(
            AnalyzerError::QuotaExhausted("credits exhausted".into()).status_code(),
            402
        );
        assert_eq!(
            AnalyzerError::NotFound("missing".into()).status_code(),
            404
        );
        assert_eq!(
            AnalyzerError::Throttled {
                message: "slow down".into(),
                retry_after_seconds: None
            }
            .status_code(),
            429
        );
        assert_eq!(
            AnalyzerError::AllProvidersExhausted("auth failed".into()).status_code(),
            500
        );
    }

    #[test]
    fn test_public_message_strips_tag_prefix() {
        let err = AnalyzerError::NotFound(
            "REPO_NOT_FOUND:Repository not found or is private.".into(),
        );
        assert_eq!(
            err.public_message(),
            "Repository not found or is private."
        );

        let plain = AnalyzerError::Message("HTTP error: something broke".into());
        assert_eq!(plain.public_message(), "HTTP error: something broke");
    }
}
