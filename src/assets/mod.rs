//! Narration audio and slide image generation
//!
//! Audio synthesis runs strictly sequentially: the speech provider enforces
//! a hard cap of 2 concurrent connections per account, and concurrent
//! requests get rejected provider-side. Image generation has no such
//! constraint and fans out in parallel. The two kinds run concurrently with
//! each other.

use crate::config::AssetConfig;
use crate::error::{AnalyzerError, Result};
use crate::presentation::Slide;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::future::join_all;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const GRADIUM_TTS_URL: &str = "https://eu.api.gradium.ai/api/post/speech/tts";
const FAL_IMAGE_URL: &str = "https://fal.run/fal-ai/flux/dev";
const ASSET_TIMEOUT_SECS: u64 = 60;

const IMAGE_STYLE_SUFFIX: &str = "Style: modern minimalist tech illustration, dark background with deep blues and purples, vibrant cyan and magenta accents, clean geometric shapes, abstract data visualization elements, high contrast, professional, ultra high quality";

/// Text-to-speech synthesis for one narration clip
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Returns an audio URL (typically a data URL) for the given text
    async fn synthesize(&self, text: &str, language: &str) -> Result<String>;
}

/// Illustration generation for one slide
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Returns the URL of a generated image for the given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generated asset URLs, index-aligned with the input slides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideAssets {
    /// Narration audio per slide; empty string where synthesis failed
    pub audio_urls: Vec<String>,
    /// Illustration per slide; empty string where skipped or failed
    pub image_urls: Vec<String>,
}

/// True when a slide already carries a richer visualization than a static
/// illustration, making image generation redundant
pub fn has_rich_visualization(slide: &Slide) -> bool {
    slide.mermaid_diagram.is_some()
        || slide.chart_config.is_some()
        || slide.code_animation.is_some()
        || slide.data_structure_animation.is_some()
        || !slide.repo_media_urls.is_empty()
}

/// Generates narration audio and slide images
pub struct SequentialAssetGenerator {
    speech: Arc<dyn SpeechService>,
    images: Arc<dyn ImageService>,
    audio_max_retries: u32,
    audio_backoff_base: Duration,
}

impl SequentialAssetGenerator {
    /// Creates a generator over the given asset services
    pub fn new(
        speech: Arc<dyn SpeechService>,
        images: Arc<dyn ImageService>,
        config: &AssetConfig,
    ) -> Self {
        Self {
            speech,
            images,
            audio_max_retries: config.audio_max_retries,
            audio_backoff_base: Duration::from_millis(config.audio_backoff_base_ms),
        }
    }

    /// Generates all assets for a slide deck
    ///
    /// Never fails as a whole: a slide whose audio exhausts its retries, or
    /// whose image generation errors, gets an empty URL and the rest of the
    /// deck proceeds. Result vectors are index-aligned with `slides`.
    pub async fn generate(&self, slides: &[Slide], language: &str) -> SlideAssets {
        let audio_task = self.generate_all_audio(slides, language);
        let image_task = self.generate_all_images(slides);

        let (audio_urls, image_urls) = tokio::join!(audio_task, image_task);
        SlideAssets {
            audio_urls,
            image_urls,
        }
    }

    // One clip at a time. Slide N finishes (or exhausts its retries) before
    // slide N+1 starts.
    async fn generate_all_audio(&self, slides: &[Slide], language: &str) -> Vec<String> {
        let mut results = Vec::with_capacity(slides.len());
        for (i, slide) in slides.iter().enumerate() {
            info!("audio {}/{}", i + 1, slides.len());
            match self.audio_with_retry(&slide.voice_script, language).await {
                Ok(url) => results.push(url),
                Err(err) => {
                    warn!("audio {} failed after all retries: {}", i + 1, err);
                    results.push(String::new());
                }
            }
        }
        results
    }

    async fn audio_with_retry(&self, text: &str, language: &str) -> Result<String> {
        let mut last_error = None;
        for attempt in 0..=self.audio_max_retries {
            if attempt > 0 {
                sleep(self.audio_backoff_base * attempt).await;
            }
            match self.speech.synthesize(text, language).await {
                Ok(url) => return Ok(url),
                Err(err) => {
                    warn!("audio attempt {} failed: {}", attempt + 1, err);
                    last_error = Some(err);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| AnalyzerError::Asset("audio generation failed".into())))
    }

    async fn generate_all_images(&self, slides: &[Slide]) -> Vec<String> {
        let tasks = slides.iter().enumerate().map(|(i, slide)| async move {
            if has_rich_visualization(slide) {
                info!("image {}: skipped (has rich visualization)", i + 1);
                return String::new();
            }
            match self.images.generate(&slide.visual_description).await {
                Ok(url) => url,
                Err(err) => {
                    warn!("image {} failed: {}", i + 1, err);
                    String::new()
                }
            }
        });
        join_all(tasks).await
    }
}

/// Gradium text-to-speech client
pub struct GradiumSpeechClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GradiumSpeechClient {
    /// Creates a client with the given API key
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, GRADIUM_TTS_URL)
    }

    /// Creates a client against a custom endpoint
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(ASSET_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            base_url: base_url.to_string(),
        }
    }

    // Cinematic narrator voices per language.
    fn voice_for(language: &str) -> &'static str {
        match language {
            "fr" => "axlOaUiFyOZhy4nv",
            "de" => "0y1VZjPabOBU3rWy",
            _ => "MZWrEHL2Fe_uc2Rv",
        }
    }
}

#[async_trait]
impl SpeechService for GradiumSpeechClient {
    async fn synthesize(&self, text: &str, language: &str) -> Result<String> {
        let voice_id = Self::voice_for(language);
        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .json(&json!({
                "text": text,
                "voice_id": voice_id,
                "output_format": "opus",
                "only_audio": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Asset(format!(
                "Audio generation failed: {} {}",
                status, body
            )));
        }

        let audio = response.bytes().await?;
        info!("audio generated: {} bytes", audio.len());
        Ok(format!("data:audio/ogg;base64,{}", BASE64.encode(&audio)))
    }
}

/// fal.ai image generation client
pub struct FalImageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FalImageClient {
    /// Creates a client with the given API key
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, FAL_IMAGE_URL)
    }

    /// Creates a client against a custom endpoint
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(ASSET_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl ImageService for FalImageClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let enhanced = format!("{}. {}", prompt, IMAGE_STYLE_SUFFIX);
        let response = self
            .client
            .post(&self.base_url)
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", self.api_key))
            .json(&json!({
                "prompt": enhanced,
                "image_size": "landscape_16_9",
                "num_images": 1,
                "enable_safety_checker": false,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Asset(format!(
                "Image generation failed: {} {}",
                status, body
            )));
        }

        let data: Value = response.json().await?;
        data["images"][0]["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AnalyzerError::Asset("No image returned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(voice: &str) -> Slide {
        Slide {
            title: "T".into(),
            content: "C".into(),
            visual_description: "a scene".into(),
            voice_script: voice.into(),
            slide_type: "overview".into(),
            mermaid_diagram: None,
            stats: None,
            chart_config: None,
            code_animation: None,
            data_structure_animation: None,
            repo_media_urls: vec![],
            image_url: String::new(),
            audio_url: String::new(),
        }
    }

    #[test]
    fn test_rich_visualization_predicate() {
        let plain = slide("hello");
        assert!(!has_rich_visualization(&plain));

        let mut with_mermaid = slide("hello");
        with_mermaid.mermaid_diagram = Some("graph TD".into());
        assert!(has_rich_visualization(&with_mermaid));

        let mut with_media = slide("hello");
        with_media.repo_media_urls = vec!["https://example.com/x.png".into()];
        assert!(has_rich_visualization(&with_media));

        let mut with_chart = slide("hello");
        with_chart.chart_config = Some(json!({"type": "bar"}));
        assert!(has_rich_visualization(&with_chart));
    }

    #[test]
    fn test_voice_map_falls_back_to_english() {
        assert_eq!(GradiumSpeechClient::voice_for("fr"), "axlOaUiFyOZhy4nv");
        assert_eq!(
            GradiumSpeechClient::voice_for("xx"),
            GradiumSpeechClient::voice_for("en")
        );
    }
}
