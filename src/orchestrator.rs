//! Top-level analysis pipeline
//!
//! Pure composition: list the repository tree, filter and prioritize,
//! fetch the selected content, summarize the sampling decision for the
//! model, drive the provider cascade, and assemble the result with audit
//! metadata. A wall-clock timeout bounds the whole pipeline so upstream
//! callers never hang indefinitely.

use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::github::{parse_repo_url, FileContentService, RepositoryListing};
use crate::prompts::{self, AnalysisOptions};
use crate::providers::ProviderCascade;
use crate::sampling::{self, ContentFetcher, FetchedFile, SamplingStats};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Request-level metadata returned alongside the analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub files_scanned: usize,
    pub total_files_in_repo: usize,
    pub analysis_time_ms: u64,
    pub model_used: String,
    pub sampling_strategy: String,
    pub estimated_tokens: usize,
    pub timestamp: String,
}

/// A completed analysis: the model's structured payload plus metadata
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Structured analysis with the `_meta` audit block merged in
    pub analysis: Value,
    /// Request-level metadata
    pub metadata: AnalysisMetadata,
}

/// Coordinates one repository analysis from URL to structured result
pub struct AnalysisOrchestrator {
    listing: Arc<dyn RepositoryListing>,
    fetcher: ContentFetcher,
    cascade: Arc<ProviderCascade>,
    config: Config,
}

impl AnalysisOrchestrator {
    /// Creates an orchestrator over the given collaborators
    pub fn new(
        listing: Arc<dyn RepositoryListing>,
        content: Arc<dyn FileContentService>,
        cascade: Arc<ProviderCascade>,
        config: Config,
    ) -> Self {
        let fetcher = ContentFetcher::new(content, &config.sampling);
        Self {
            listing,
            fetcher,
            cascade,
            config,
        }
    }

    /// Analyzes one repository under the configured wall-clock budget
    pub async fn analyze(
        &self,
        repo_url: &str,
        max_files: Option<usize>,
        options: &AnalysisOptions,
    ) -> Result<AnalysisOutcome> {
        let budget = Duration::from_secs(self.config.pipeline_timeout_secs);
        tokio::time::timeout(budget, self.run(repo_url, max_files, options))
            .await
            .map_err(|_| AnalyzerError::Timeout(self.config.pipeline_timeout_secs))?
    }

    async fn run(
        &self,
        repo_url: &str,
        max_files: Option<usize>,
        options: &AnalysisOptions,
    ) -> Result<AnalysisOutcome> {
        let started = Instant::now();
        let (owner, repo) = parse_repo_url(repo_url)?;
        let max_files = self.config.clamp_max_files(max_files);

        info!("=== analyzing {}/{} (max_files={}) ===", owner, repo, max_files);

        let all_files = self.listing.fetch_tree(&owner, &repo).await?;
        info!("found {} total files", all_files.len());

        let (selected, stats) = sampling::select(&all_files, max_files);
        info!(
            "strategy: {} | code files: {} | excluded: {} | selected: {}",
            stats.budget_strategy, stats.code_files, stats.excluded_files, stats.selected_files
        );

        if selected.is_empty() {
            return Err(AnalyzerError::NoEligibleFiles);
        }

        let files = self.fetcher.fetch_all(&owner, &repo, &selected).await;
        let estimated_tokens = estimate_tokens(&files);
        info!("estimated tokens: ~{}", estimated_tokens);

        let sampling_context = prompts::build_sampling_context(&stats, estimated_tokens);
        let user_prompt =
            prompts::analysis_user_prompt(&owner, &repo, &files, &sampling_context, options);
        let schema = prompts::analysis_schema(options);

        let outcome = self
            .cascade
            .invoke(prompts::ANALYSIS_SYSTEM_PROMPT, &user_prompt, &schema)
            .await?;

        let analysis_time_ms = started.elapsed().as_millis() as u64;
        let timestamp = Utc::now().to_rfc3339();

        let mut analysis = outcome.payload;
        if let Some(obj) = analysis.as_object_mut() {
            obj.insert(
                "_meta".to_string(),
                meta_block(&owner, &repo, &stats, estimated_tokens, &timestamp),
            );
        }

        info!(
            "=== analysis complete for {}/{} in {}ms ({}/{} files, ~{} tokens) ===",
            owner, repo, analysis_time_ms, stats.selected_files, stats.total_files,
            estimated_tokens
        );

        Ok(AnalysisOutcome {
            analysis,
            metadata: AnalysisMetadata {
                files_scanned: stats.selected_files,
                total_files_in_repo: stats.total_files,
                analysis_time_ms,
                model_used: outcome.model_used,
                sampling_strategy: stats.budget_strategy,
                estimated_tokens,
                timestamp,
            },
        })
    }
}

/// Rough prompt-size estimate: four characters per token
///
/// A deliberately cheap budget signal, not tokenizer output.
pub fn estimate_tokens(files: &[FetchedFile]) -> usize {
    files
        .iter()
        .map(|f| f.content.len().div_ceil(4))
        .sum()
}

fn meta_block(
    owner: &str,
    repo: &str,
    stats: &SamplingStats,
    estimated_tokens: usize,
    timestamp: &str,
) -> Value {
    json!({
        "owner": owner,
        "repo": repo,
        "files_scanned": stats.selected_files,
        "total_files": stats.total_files,
        "analyzed_at": timestamp,
        "sampling": {
            "strategy": stats.budget_strategy,
            "code_files_found": stats.code_files,
            "files_excluded": stats.excluded_files,
            "estimated_tokens": estimated_tokens,
            "file_type_distribution": stats.file_type_distribution,
            "skipped_categories": stats.skipped_categories,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_ceil_division() {
        let files = vec![
            FetchedFile {
                path: "a".into(),
                content: "x".repeat(8),
            },
            FetchedFile {
                path: "b".into(),
                content: "y".repeat(9),
            },
        ];
        // 8/4 = 2, ceil(9/4) = 3.
        assert_eq!(estimate_tokens(&files), 5);
        assert_eq!(estimate_tokens(&[]), 0);
    }
}
