//! Batched file content retrieval with head/tail truncation
//!
//! Content is fetched in fixed-size batches so peak concurrency against the
//! content API stays bounded; within a batch every fetch runs concurrently
//! and the batch completes before the next begins, which also keeps result
//! order aligned with input order. Oversized files keep their head (imports,
//! declarations) and tail (exports, entry logic) around an omission marker.

use super::prioritize::PrioritizedFile;
use crate::config::SamplingConfig;
use crate::github::FileContentService;
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

/// A fetched file body, possibly truncated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Path relative to the repository root
    pub path: String,
    /// Full body, or a head/marker/tail representation
    pub content: String,
}

/// Retrieves file bodies for a prioritized selection
pub struct ContentFetcher {
    content: Arc<dyn FileContentService>,
    batch_size: usize,
    truncate_threshold: usize,
    truncate_head: usize,
    truncate_tail: usize,
}

impl ContentFetcher {
    /// Creates a fetcher over the given content service
    pub fn new(content: Arc<dyn FileContentService>, sampling: &SamplingConfig) -> Self {
        Self {
            content,
            batch_size: sampling.fetch_batch_size.max(1),
            truncate_threshold: sampling.truncate_threshold_lines,
            truncate_head: sampling.truncate_head_lines,
            truncate_tail: sampling.truncate_tail_lines,
        }
    }

    /// Fetches every selected file, in input order
    ///
    /// A failed fetch becomes a placeholder body rather than an error; the
    /// pipeline tolerates partial content loss.
    pub async fn fetch_all(
        &self,
        owner: &str,
        repo: &str,
        files: &[PrioritizedFile],
    ) -> Vec<FetchedFile> {
        let mut results = Vec::with_capacity(files.len());

        for batch in files.chunks(self.batch_size) {
            let fetches = batch.iter().map(|file| async move {
                match self.content.fetch_raw(owner, repo, &file.path).await {
                    Ok(body) => FetchedFile {
                        path: file.path.clone(),
                        content: truncate_content(
                            &body,
                            self.truncate_threshold,
                            self.truncate_head,
                            self.truncate_tail,
                        ),
                    },
                    Err(err) => FetchedFile {
                        path: file.path.clone(),
                        content: format!("// Failed to fetch: {}", err),
                    },
                }
            });
            results.extend(join_all(fetches).await);
            info!("fetched {}/{} files", results.len(), files.len());
        }

        results
    }
}

/// Truncates a file body to head + omission marker + tail when it exceeds
/// `threshold` lines; shorter bodies pass through unchanged
pub fn truncate_content(content: &str, threshold: usize, head: usize, tail: usize) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.len() <= threshold {
        return content.to_string();
    }

    let head_part = lines[..head.min(lines.len())].join("\n");
    let tail_part = lines[lines.len().saturating_sub(tail)..].join("\n");
    let omitted = lines.len().saturating_sub(head + tail);

    format!(
        "{}\n\n// ... [{} lines omitted — file has {} total lines] ...\n\n{}",
        head_part,
        omitted,
        lines.len(),
        tail_part
    )
}
