use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use codetale::api::{
    client_ip, error_body, AnalyzeRequest, AnalyzeResponse, PresentationRequest,
};
use codetale::assets::{FalImageClient, GradiumSpeechClient, SequentialAssetGenerator};
use codetale::config::Config;
use codetale::github::GitHubClient;
use codetale::orchestrator::AnalysisOrchestrator;
use codetale::presentation::PresentationOrchestrator;
use codetale::providers::{OpenAiCompatClient, Provider, ProviderCascade};
use codetale::rate_limiter::RateLimiter;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    orchestrator: Arc<AnalysisOrchestrator>,
    presenter: Arc<PresentationOrchestrator>,
    rate_limiter: Arc<RateLimiter>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let config = Config::load()?;

    let providers = Provider::cascade_from_keys(&config.api_keys);
    if providers.is_empty() {
        warn!("no AI provider key configured; analysis requests will fail");
    }

    let github = Arc::new(GitHubClient::new(&config));
    let cascade = Arc::new(ProviderCascade::new(
        providers,
        Arc::new(OpenAiCompatClient::new()),
        &config.cascade,
    ));

    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        github.clone(),
        github.clone(),
        cascade.clone(),
        config.clone(),
    ));

    let speech = Arc::new(GradiumSpeechClient::new(
        config.api_keys.gradium.clone().unwrap_or_default(),
    ));
    let images = Arc::new(FalImageClient::new(
        config.api_keys.fal.clone().unwrap_or_default(),
    ));
    let presenter = Arc::new(PresentationOrchestrator::new(
        github.clone(),
        cascade,
        SequentialAssetGenerator::new(speech, images, &config.assets),
    ));

    // The window map is the only cross-request shared mutable state; the
    // limiter and its sweep are owned here and handed to request handlers.
    let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    let _sweep = rate_limiter.start_sweep();

    let state = AppState {
        orchestrator,
        presenter,
        rate_limiter,
    };

    info!("CodeTale server starting...");
    let app = create_app(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the main application with all routes
fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/analyze", post(analyze))
        .route("/api/presentation", post(presentation))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint - returns basic service information
async fn index() -> Json<Value> {
    Json(json!({
        "service": "CodeTale",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AI-generated structural analysis and narrated presentations for GitHub repositories",
        "endpoints": {
            "health": "/health",
            "analyze": "/api/analyze",
            "presentation": "/api/presentation"
        }
    }))
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Admits or rejects a request against the per-client window
async fn admit(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let ip = client_ip(headers);
    let decision = state.rate_limiter.check(&ip).await;
    if decision.allowed {
        return Ok(());
    }

    warn!("rate limit exceeded for {}", ip);
    let retry_after = decision.retry_after_seconds.unwrap_or(60);
    let body = json!({
        "status": "error",
        "error": format!(
            "Rate limit exceeded. Max {} requests per minute.",
            state.rate_limiter.max_requests()
        ),
        "code": 429,
        "retry_after_seconds": retry_after,
    });
    Err((
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after.to_string())],
        Json(body),
    )
        .into_response())
}

/// Analyze a repository
async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    if let Err(rejection) = admit(&state, &headers).await {
        return rejection;
    }

    info!("analysis requested for {}", request.repo_url);
    let options = request.options.to_analysis_options();

    match state
        .orchestrator
        .analyze(&request.repo_url, request.options.max_files, &options)
        .await
    {
        Ok(outcome) => Json(AnalyzeResponse {
            status: "success".to_string(),
            analysis: outcome.analysis,
            metadata: outcome.metadata,
        })
        .into_response(),
        Err(err) => {
            warn!("analysis failed: {}", err);
            let (code, body) = error_body(&err);
            (
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(body),
            )
                .into_response()
        }
    }
}

/// Generate a narrated presentation for a repository
async fn presentation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PresentationRequest>,
) -> Response {
    if let Err(rejection) = admit(&state, &headers).await {
        return rejection;
    }

    info!("presentation requested for {}", request.repo_url);
    let mode = request.mode.as_deref().unwrap_or("developer");
    let language = request.language.as_deref().unwrap_or("en");

    match state
        .presenter
        .generate(&request.repo_url, mode, language)
        .await
    {
        Ok(presentation) => Json(presentation).into_response(),
        Err(err) => {
            warn!("presentation failed: {}", err);
            let (code, body) = error_body(&err);
            (
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(body),
            )
                .into_response()
        }
    }
}
