//! GitHub REST API client for the analysis pipeline
//!
//! The pipeline consumes three narrow capabilities: list every blob in a
//! repository, fetch one file's raw text, and read repository metadata for
//! presentations. Each capability is a trait so the orchestrators can be
//! exercised against scripted fakes in tests.

use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const GITHUB_API_BASE: &str = "https://api.github.com";
const API_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "CodeTale-Analyzer";
const MAX_README_MEDIA: usize = 6;

static REPO_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"github\.com/([^/]+)/([^/?#]+)").unwrap());

/// One entry from the recursive repository tree listing
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the repository root
    pub path: String,
    /// Whether this entry is a file or a directory
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
    /// Blob size in bytes, when the API reports it
    #[serde(default)]
    pub size: Option<u64>,
}

/// Tree entry kind as reported by the git trees API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    /// Regular file
    Blob,
    /// Directory
    Tree,
    /// Submodule pointer
    Commit,
}

/// Repository metadata used for presentation generation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoMetadata {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub language: String,
    pub topics: Vec<String>,
    #[serde(skip_serializing)]
    pub readme: String,
    pub languages: HashMap<String, u64>,
    pub open_issues: u64,
    pub license: String,
    /// Screenshots/demos/diagrams linked from the README
    pub media_urls: Vec<String>,
}

/// Lists the blobs of a repository's default branch
#[async_trait]
pub trait RepositoryListing: Send + Sync {
    /// Returns every blob in the repository's full recursive listing
    async fn fetch_tree(&self, owner: &str, repo: &str) -> Result<Vec<TreeEntry>>;
}

/// Fetches raw file bodies
#[async_trait]
pub trait FileContentService: Send + Sync {
    /// Returns the raw text of one file, or an error describing the failure
    async fn fetch_raw(&self, owner: &str, repo: &str, path: &str) -> Result<String>;
}

/// Reads repository metadata (description, stars, README, languages)
#[async_trait]
pub trait RepositoryMetadata: Send + Sync {
    /// Fetches the metadata block used to seed presentation generation
    async fn fetch_metadata(&self, owner: &str, repo: &str) -> Result<RepoMetadata>;
}

/// Extracts `(owner, repo)` from a GitHub repository URL
pub fn parse_repo_url(repo_url: &str) -> Result<(String, String)> {
    // Validate that it is a URL at all before pattern matching, so the
    // caller gets a consistent message for garbage input.
    if Url::parse(repo_url).is_err() {
        return Err(AnalyzerError::InvalidInput(format!(
            "Invalid GitHub URL: {}. Expected format: https://github.com/owner/repo",
            repo_url
        )));
    }

    let caps = REPO_URL_RE.captures(repo_url).ok_or_else(|| {
        AnalyzerError::InvalidInput(
            "Invalid GitHub URL. Expected format: https://github.com/owner/repo".into(),
        )
    })?;

    let owner = caps[1].to_string();
    let repo = caps[2].trim_end_matches('/').trim_end_matches(".git").to_string();
    Ok((owner, repo))
}

/// GitHub REST API client
///
/// Implements all three service traits against the real API. The base URL is
/// injectable so tests can point the client at a local mock server.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
}

impl GitHubClient {
    /// Creates a client using the token from `config`, if any
    pub fn new(config: &Config) -> Self {
        Self::with_api_base(config, GITHUB_API_BASE)
    }

    /// Creates a client against a custom API base URL
    pub fn with_api_base(config: &Config, api_base: &str) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        if let Some(token) = &config.api_keys.github {
            let auth_value = format!("Bearer {}", token);
            if let Ok(value) = reqwest::header::HeaderValue::from_str(&auth_value) {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn get_repo_info(&self, owner: &str, repo: &str) -> Result<Value> {
        let url = format!("{}/repos/{}/{}", self.api_base, owner, repo);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let reset_header = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok());
            let body = response.text().await.unwrap_or_default();

            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                let minutes_left = reset_header.and_then(|reset| {
                    let now = chrono::Utc::now().timestamp();
                    let left = reset - now;
                    (left > 0).then(|| (left + 59) / 60)
                });
                let wait_msg = match minutes_left {
                    Some(m) => format!(" Try again in ~{} minute(s).", m),
                    None => " Try again later.".to_string(),
                };
                return Err(AnalyzerError::Throttled {
                    message: format!("GitHub API rate limit exceeded.{}", wait_msg),
                    retry_after_seconds: minutes_left.map(|m| (m as u64) * 60),
                });
            }
            if status == StatusCode::NOT_FOUND {
                return Err(AnalyzerError::NotFound(
                    "Repository not found or is private. Add a GitHub token for private repos."
                        .into(),
                ));
            }
            return Err(AnalyzerError::GitHubApi(format!(
                "GitHub API error ({}): {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[async_trait]
impl RepositoryListing for GitHubClient {
    async fn fetch_tree(&self, owner: &str, repo: &str) -> Result<Vec<TreeEntry>> {
        let repo_info = self.get_repo_info(owner, repo).await?;
        let default_branch = repo_info["default_branch"].as_str().unwrap_or("main");

        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, owner, repo, default_branch
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::GitHubApi(format!(
                "Failed to fetch file tree: {} {}",
                status, body
            )));
        }

        let tree: TreeResponse = response.json().await?;
        let blobs: Vec<TreeEntry> = tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == TreeEntryKind::Blob)
            .collect();

        info!("{}/{}: listed {} blobs on {}", owner, repo, blobs.len(), default_branch);
        Ok(blobs)
    }
}

#[async_trait]
impl FileContentService for GitHubClient {
    async fn fetch_raw(&self, owner: &str, repo: &str, path: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            owner,
            repo,
            urlencode_path(path)
        );
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.raw")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("failed to fetch {}: {}", path, status);
            return Err(AnalyzerError::GitHubApi(format!("HTTP {}", status.as_u16())));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl RepositoryMetadata for GitHubClient {
    async fn fetch_metadata(&self, owner: &str, repo: &str) -> Result<RepoMetadata> {
        let readme_url = format!("{}/repos/{}/{}/readme", self.api_base, owner, repo);
        let languages_url = format!("{}/repos/{}/{}/languages", self.api_base, owner, repo);

        let (repo_info, readme_res, languages_res) = tokio::join!(
            self.get_repo_info(owner, repo),
            self.client
                .get(&readme_url)
                .header(reqwest::header::ACCEPT, "application/vnd.github.raw")
                .send(),
            self.client.get(&languages_url).send(),
        );
        let repo_info = repo_info?;

        let readme = match readme_res {
            Ok(res) if res.status().is_success() => res.text().await.unwrap_or_default(),
            _ => String::new(),
        };
        let languages: HashMap<String, u64> = match languages_res {
            Ok(res) if res.status().is_success() => res.json().await.unwrap_or_default(),
            _ => HashMap::new(),
        };

        let media_urls = extract_media_urls(&readme, owner, repo);
        info!("{}/{}: found {} media URLs in README", owner, repo, media_urls.len());

        Ok(RepoMetadata {
            name: repo_info["name"].as_str().unwrap_or(repo).to_string(),
            full_name: repo_info["full_name"]
                .as_str()
                .unwrap_or(&format!("{}/{}", owner, repo))
                .to_string(),
            description: repo_info["description"].as_str().unwrap_or("").to_string(),
            stars: repo_info["stargazers_count"].as_u64().unwrap_or(0),
            forks: repo_info["forks_count"].as_u64().unwrap_or(0),
            language: repo_info["language"].as_str().unwrap_or("Unknown").to_string(),
            topics: repo_info["topics"]
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|t| t.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            readme: readme.chars().take(3000).collect(),
            languages,
            open_issues: repo_info["open_issues_count"].as_u64().unwrap_or(0),
            license: repo_info["license"]["spdx_id"]
                .as_str()
                .unwrap_or("Unknown")
                .to_string(),
            media_urls,
        })
    }
}

static MD_IMAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").unwrap());
static HTML_IMG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap());
static HTML_VIDEO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<(?:video|source)[^>]+src=["']([^"']+)["']"#).unwrap());
static MEDIA_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(png|jpg|jpeg|gif|webp|svg|mp4|webm|mov)(\?|$)").unwrap());

/// Extracts image/video URLs from README markdown, badges filtered out
pub fn extract_media_urls(readme: &str, owner: &str, repo: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for re in [&*MD_IMAGE_RE, &*HTML_IMG_RE, &*HTML_VIDEO_RE] {
        for caps in re.captures_iter(readme) {
            urls.push(resolve_github_url(&caps[1], owner, repo));
        }
    }

    let mut seen = std::collections::HashSet::new();
    urls.into_iter()
        .filter(|u| {
            if !seen.insert(u.clone()) {
                return false;
            }
            let lower = u.to_lowercase();
            // Badges and CI shields are not screenshots.
            if lower.contains("shields.io") || lower.contains("badge") {
                return false;
            }
            if lower.contains("github.com") && lower.contains("/workflows/") {
                return false;
            }
            MEDIA_EXT_RE.is_match(&lower)
                || lower.contains("user-images.githubusercontent.com")
                || lower.contains("raw.githubusercontent.com")
        })
        .take(MAX_README_MEDIA)
        .collect()
}

fn resolve_github_url(url: &str, owner: &str, repo: &str) -> String {
    if url.starts_with("http") {
        return url.to_string();
    }
    let clean = url.trim_start_matches("./").trim_start_matches('/');
    format!("https://raw.githubusercontent.com/{}/{}/main/{}", owner, repo, clean)
}

fn urlencode_path(path: &str) -> String {
    // Only the characters that actually break GitHub content URLs.
    path.replace('%', "%25").replace(' ', "%20").replace('#', "%23").replace('?', "%3F")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_url() {
        let (owner, repo) = parse_repo_url("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "rust");

        let (owner, repo) =
            parse_repo_url("https://github.com/tokio-rs/tokio/?tab=readme").unwrap();
        assert_eq!(owner, "tokio-rs");
        assert_eq!(repo, "tokio");

        assert!(parse_repo_url("not a url").is_err());
        assert!(parse_repo_url("https://gitlab.com/foo/bar").is_err());
    }

    #[test]
    fn test_extract_media_urls_filters_badges() {
        let readme = r#"
# Demo
![build](https://img.shields.io/badge/build-passing-green.svg)
![screenshot](./docs/screenshot.png)
<img src="https://user-images.githubusercontent.com/1/demo.gif" />
<video src="https://raw.githubusercontent.com/o/r/main/demo.mp4"></video>
"#;
        let urls = extract_media_urls(readme, "o", "r");
        assert_eq!(
            urls,
            vec![
                "https://raw.githubusercontent.com/o/r/main/docs/screenshot.png".to_string(),
                "https://user-images.githubusercontent.com/1/demo.gif".to_string(),
                "https://raw.githubusercontent.com/o/r/main/demo.mp4".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_media_urls_dedupes_and_caps() {
        let line = "![a](https://raw.githubusercontent.com/o/r/main/x.png)\n";
        let many: String = (0..10)
            .map(|i| format!("![a](https://raw.githubusercontent.com/o/r/main/{}.png)\n", i))
            .collect();
        let doubled = format!("{line}{line}{many}");
        let urls = extract_media_urls(&doubled, "o", "r");
        assert_eq!(urls.len(), MAX_README_MEDIA);
        assert_eq!(urls.iter().filter(|u| u.ends_with("/x.png")).count(), 1);
    }
}
