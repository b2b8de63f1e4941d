//! Narrated slide presentation generation
//!
//! Reuses the provider cascade for the slide-script call, then hands the
//! slides to the asset generator for narration audio and illustration
//! images, and assembles the final presentation object.

use crate::assets::SequentialAssetGenerator;
use crate::error::{AnalyzerError, Result};
use crate::github::{parse_repo_url, RepoMetadata, RepositoryMetadata};
use crate::prompts;
use crate::providers::ProviderCascade;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// One presentation slide
///
/// Field names follow the JSON the slide renderer consumes. The rich
/// visualization blocks (chart, code animation, data structure animation)
/// are opaque here; only their presence matters to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    pub content: String,
    pub visual_description: String,
    pub voice_script: String,
    #[serde(rename = "type")]
    pub slide_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mermaid_diagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_animation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_structure_animation: Option<Value>,
    #[serde(default)]
    pub repo_media_urls: Vec<String>,
    /// Generated illustration URL, empty when skipped or failed
    #[serde(default)]
    pub image_url: String,
    /// Narration audio data URL, empty when synthesis failed
    #[serde(default)]
    pub audio_url: String,
}

/// Repository header shown alongside the slides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationRepoInfo {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub language: String,
    pub topics: Vec<String>,
}

impl From<&RepoMetadata> for PresentationRepoInfo {
    fn from(meta: &RepoMetadata) -> Self {
        Self {
            name: meta.name.clone(),
            full_name: meta.full_name.clone(),
            description: meta.description.clone(),
            stars: meta.stars,
            forks: meta.forks,
            language: meta.language.clone(),
            topics: meta.topics.clone(),
        }
    }
}

/// A fully assembled presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub repo_info: PresentationRepoInfo,
    pub slides: Vec<Slide>,
}

/// Drives one presentation generation end to end
pub struct PresentationOrchestrator {
    metadata: Arc<dyn RepositoryMetadata>,
    cascade: Arc<ProviderCascade>,
    assets: SequentialAssetGenerator,
}

impl PresentationOrchestrator {
    /// Creates an orchestrator over the given collaborators
    pub fn new(
        metadata: Arc<dyn RepositoryMetadata>,
        cascade: Arc<ProviderCascade>,
        assets: SequentialAssetGenerator,
    ) -> Self {
        Self {
            metadata,
            cascade,
            assets,
        }
    }

    /// Generates a narrated presentation for a repository URL
    pub async fn generate(
        &self,
        repo_url: &str,
        mode: &str,
        language: &str,
    ) -> Result<Presentation> {
        let (owner, repo) = parse_repo_url(repo_url)?;

        info!("fetching metadata for {}/{}", owner, repo);
        let meta = self.metadata.fetch_metadata(&owner, &repo).await?;

        info!("generating slides for {} ({} stars)", meta.full_name, meta.stars);
        let outcome = self
            .cascade
            .invoke(
                &prompts::slides_system_prompt(mode, language),
                &prompts::slides_user_prompt(&meta),
                &prompts::slides_schema(),
            )
            .await?;

        let mut slides: Vec<Slide> =
            serde_json::from_value(outcome.payload["slides"].clone()).map_err(|e| {
                AnalyzerError::AllProvidersExhausted(format!(
                    "slide payload did not match the expected shape: {}",
                    e
                ))
            })?;

        // Only media URLs that actually came from the README survive, and
        // at most two per slide.
        for slide in &mut slides {
            slide.repo_media_urls = slide
                .repo_media_urls
                .iter()
                .filter(|u| meta.media_urls.contains(*u))
                .take(2)
                .cloned()
                .collect();
        }

        info!("generating assets for {} slides", slides.len());
        let assets = self.assets.generate(&slides, language).await;
        for (i, slide) in slides.iter_mut().enumerate() {
            slide.audio_url = assets.audio_urls.get(i).cloned().unwrap_or_default();
            slide.image_url = assets.image_urls.get(i).cloned().unwrap_or_default();
        }

        let narrated = slides.iter().filter(|s| !s.audio_url.is_empty()).count();
        info!("audio coverage: {}/{} slides", narrated, slides.len());

        Ok(Presentation {
            repo_info: PresentationRepoInfo::from(&meta),
            slides,
        })
    }
}
