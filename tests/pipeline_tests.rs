use async_trait::async_trait;
use codetale::config::Config;
use codetale::error::{AnalyzerError, Result};
use codetale::github::{FileContentService, RepositoryListing, TreeEntry, TreeEntryKind};
use codetale::orchestrator::AnalysisOrchestrator;
use codetale::prompts::AnalysisOptions;
use codetale::providers::{
    Provider, ProviderCascade, ProviderError, ResponseSchema, StructuredModel,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

fn blob(path: &str) -> TreeEntry {
    TreeEntry {
        path: path.to_string(),
        kind: TreeEntryKind::Blob,
        size: None,
    }
}

struct FakeListing {
    files: Vec<TreeEntry>,
    delay_ms: u64,
}

#[async_trait]
impl RepositoryListing for FakeListing {
    async fn fetch_tree(&self, _owner: &str, _repo: &str) -> Result<Vec<TreeEntry>> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        Ok(self.files.clone())
    }
}

struct FakeContent;

#[async_trait]
impl FileContentService for FakeContent {
    async fn fetch_raw(&self, _owner: &str, _repo: &str, path: &str) -> Result<String> {
        Ok(format!("// {}\nfn work() {{}}\n", path))
    }
}

/// Succeeds on the first attempt and records the prompts it saw.
struct RecordingModel {
    payload: Value,
    last_user_prompt: Mutex<String>,
}

#[async_trait]
impl StructuredModel for RecordingModel {
    async fn invoke(
        &self,
        _provider: &Provider,
        _system_prompt: &str,
        user_prompt: &str,
        _schema: &ResponseSchema,
    ) -> std::result::Result<Value, ProviderError> {
        *self.last_user_prompt.lock().await = user_prompt.to_string();
        Ok(self.payload.clone())
    }
}

fn large_repo() -> Vec<TreeEntry> {
    // 500 raw files: 150 eligible sources, the rest dependency/asset noise.
    let mut files: Vec<TreeEntry> = (0..150)
        .map(|i| blob(&format!("src/part_{:02}/file_{:03}.ts", i % 20, i)))
        .collect();
    for i in 0..300 {
        files.push(blob(&format!("node_modules/dep/{}.js", i)));
    }
    for i in 0..50 {
        files.push(blob(&format!("assets/logo_{}.png", i)));
    }
    files
}

fn orchestrator_with(
    files: Vec<TreeEntry>,
    delay_ms: u64,
    config: Config,
) -> (AnalysisOrchestrator, Arc<RecordingModel>) {
    let model = Arc::new(RecordingModel {
        payload: json!({
            "project_name": "demo",
            "summary": "a demo project",
            "complexity_score": 4,
        }),
        last_user_prompt: Mutex::new(String::new()),
    });
    let cascade = Arc::new(ProviderCascade::new(
        vec![Provider {
            name: "Fake".into(),
            endpoint: "https://fake.example".into(),
            api_key: "k".into(),
            model: "fake-model".into(),
        }],
        model.clone(),
        &config.cascade,
    ));
    let orchestrator = AnalysisOrchestrator::new(
        Arc::new(FakeListing { files, delay_ms }),
        Arc::new(FakeContent),
        cascade,
        config,
    );
    (orchestrator, model)
}

#[tokio::test]
async fn large_repo_end_to_end() {
    let (orchestrator, model) = orchestrator_with(large_repo(), 0, Config::default());

    let outcome = orchestrator
        .analyze(
            "https://github.com/octo/demo",
            Some(30),
            &AnalysisOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.metadata.sampling_strategy, "large_repo_top20");
    assert_eq!(outcome.metadata.files_scanned, 20);
    assert_eq!(outcome.metadata.total_files_in_repo, 500);
    assert_eq!(outcome.metadata.model_used, "fake-model");
    assert!(outcome.metadata.estimated_tokens > 0);

    // The model payload survives with the audit block merged in.
    assert_eq!(outcome.analysis["project_name"], "demo");
    let meta = &outcome.analysis["_meta"];
    assert_eq!(meta["owner"], "octo");
    assert_eq!(meta["repo"], "demo");
    assert_eq!(meta["sampling"]["strategy"], "large_repo_top20");
    assert_eq!(meta["sampling"]["code_files_found"], 150);
    assert_eq!(meta["sampling"]["files_excluded"], 350);

    // The model was told about the true repository scale.
    let prompt = model.last_user_prompt.lock().await.clone();
    assert!(prompt.starts_with("REPOSITORY CONTEXT:"));
    assert!(prompt.contains("Repository has 500 files total."));
    assert!(prompt.contains("strategy: large_repo_top20"));
    assert!(prompt.contains("dependency files"));
}

#[tokio::test]
async fn repository_without_source_files_is_rejected() {
    let files: Vec<TreeEntry> = (0..40)
        .map(|i| blob(&format!("node_modules/x/{}.js", i)))
        .collect();
    let (orchestrator, _) = orchestrator_with(files, 0, Config::default());

    let err = orchestrator
        .analyze(
            "https://github.com/octo/empty",
            None,
            &AnalysisOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::NoEligibleFiles));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn invalid_url_is_rejected_before_any_network_call() {
    let (orchestrator, _) = orchestrator_with(vec![], 0, Config::default());

    let err = orchestrator
        .analyze("https://example.com/not/github", None, &AnalysisOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::InvalidInput(_)));
}

#[tokio::test]
async fn pipeline_times_out_under_wall_clock_budget() {
    let config = Config {
        pipeline_timeout_secs: 1,
        ..Config::default()
    };
    let (orchestrator, _) = orchestrator_with(large_repo(), 5_000, config);

    let err = orchestrator
        .analyze("https://github.com/octo/slow", None, &AnalysisOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::Timeout(1)));
}
