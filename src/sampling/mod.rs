//! Repository sampling: filtering, prioritization, and content retrieval

/// Eligibility rules applied to the raw file listing
pub mod filter;
/// Batched content fetching with truncation
pub mod fetcher;
/// Priority ranking and adaptive budgets
pub mod prioritize;

pub use fetcher::{truncate_content, ContentFetcher, FetchedFile};
pub use prioritize::{
    adaptive_budget, select, ExtensionShare, PrioritizedFile, SamplingStats, SkippedCategory,
};
