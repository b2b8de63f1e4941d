use async_trait::async_trait;
use codetale::assets::{ImageService, SequentialAssetGenerator, SpeechService};
use codetale::config::{AssetConfig, CascadeConfig};
use codetale::error::Result;
use codetale::github::{RepoMetadata, RepositoryMetadata};
use codetale::presentation::PresentationOrchestrator;
use codetale::providers::{
    Provider, ProviderCascade, ProviderError, ResponseSchema, StructuredModel,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

struct FakeMetadata;

#[async_trait]
impl RepositoryMetadata for FakeMetadata {
    async fn fetch_metadata(&self, owner: &str, repo: &str) -> Result<RepoMetadata> {
        Ok(RepoMetadata {
            name: repo.to_string(),
            full_name: format!("{}/{}", owner, repo),
            description: "a demo".to_string(),
            stars: 1200,
            forks: 34,
            language: "Rust".to_string(),
            topics: vec!["cli".to_string()],
            readme: "# Demo".to_string(),
            languages: HashMap::from([("Rust".to_string(), 9000)]),
            open_issues: 5,
            license: "MIT".to_string(),
            media_urls: vec![
                "https://raw.githubusercontent.com/octo/demo/main/shot.png".to_string(),
            ],
        })
    }
}

struct SlidesModel;

#[async_trait]
impl StructuredModel for SlidesModel {
    async fn invoke(
        &self,
        _provider: &Provider,
        _system_prompt: &str,
        _user_prompt: &str,
        _schema: &ResponseSchema,
    ) -> std::result::Result<Value, ProviderError> {
        Ok(json!({
            "slides": [
                {
                    "title": "The Hook",
                    "content": "Body",
                    "visualDescription": "a neon skyline",
                    "voiceScript": "Welcome to the story.",
                    "type": "hook",
                },
                {
                    "title": "Architecture",
                    "content": "Body",
                    "visualDescription": "a blueprint",
                    "voiceScript": "Here is how it works.",
                    "type": "architecture",
                    "mermaidDiagram": "graph TD\n A --> B",
                    "repoMediaUrls": [
                        "https://raw.githubusercontent.com/octo/demo/main/shot.png",
                        "https://evil.example/injected.png"
                    ],
                },
            ]
        }))
    }
}

struct OkSpeech;

#[async_trait]
impl SpeechService for OkSpeech {
    async fn synthesize(&self, text: &str, language: &str) -> Result<String> {
        Ok(format!("data:audio/ogg;base64,{}-{}", language, text.len()))
    }
}

struct OkImages;

#[async_trait]
impl ImageService for OkImages {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("https://img.example/{}", prompt.len()))
    }
}

#[tokio::test]
async fn presentation_end_to_end() {
    let cascade = Arc::new(ProviderCascade::new(
        vec![Provider {
            name: "Fake".into(),
            endpoint: "https://fake.example".into(),
            api_key: "k".into(),
            model: "fake-model".into(),
        }],
        Arc::new(SlidesModel),
        &CascadeConfig {
            max_retries_per_provider: 2,
            backoff_base_ms: 1,
        },
    ));
    let assets = SequentialAssetGenerator::new(
        Arc::new(OkSpeech),
        Arc::new(OkImages),
        &AssetConfig {
            audio_max_retries: 1,
            audio_backoff_base_ms: 1,
        },
    );
    let orchestrator =
        PresentationOrchestrator::new(Arc::new(FakeMetadata), cascade, assets);

    let presentation = orchestrator
        .generate("https://github.com/octo/demo", "developer", "en")
        .await
        .unwrap();

    assert_eq!(presentation.repo_info.full_name, "octo/demo");
    assert_eq!(presentation.repo_info.stars, 1200);
    assert_eq!(presentation.slides.len(), 2);

    // Every slide is narrated.
    assert!(presentation.slides.iter().all(|s| !s.audio_url.is_empty()));

    // The plain slide got an illustration; the mermaid slide skipped it.
    assert!(!presentation.slides[0].image_url.is_empty());
    assert!(presentation.slides[1].image_url.is_empty());

    // Media URLs the README never contained are discarded.
    assert_eq!(
        presentation.slides[1].repo_media_urls,
        vec!["https://raw.githubusercontent.com/octo/demo/main/shot.png".to_string()]
    );
}
