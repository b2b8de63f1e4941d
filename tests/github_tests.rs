use codetale::config::Config;
use codetale::error::AnalyzerError;
use codetale::github::{FileContentService, GitHubClient, RepositoryListing, RepositoryMetadata};

fn test_client(server: &mockito::ServerGuard) -> GitHubClient {
    let config = Config::default();
    GitHubClient::with_api_base(&config, &server.url())
}

#[tokio::test]
async fn fetch_tree_returns_blobs_only() {
    let mut server = mockito::Server::new_async().await;

    let _repo = server
        .mock("GET", "/repos/octo/demo")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"default_branch": "trunk"}"#)
        .create_async()
        .await;

    let _tree = server
        .mock("GET", "/repos/octo/demo/git/trees/trunk")
        .match_query(mockito::Matcher::UrlEncoded("recursive".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"tree": [
                {"path": "src", "type": "tree"},
                {"path": "src/main.rs", "type": "blob", "size": 1024},
                {"path": "README.md", "type": "blob"}
            ]}"#,
        )
        .create_async()
        .await;

    let client = test_client(&server);
    let blobs = client.fetch_tree("octo", "demo").await.unwrap();

    assert_eq!(blobs.len(), 2);
    assert_eq!(blobs[0].path, "src/main.rs");
    assert_eq!(blobs[0].size, Some(1024));
    assert_eq!(blobs[1].path, "README.md");
}

#[tokio::test]
async fn missing_repo_maps_to_not_found() {
    let mut server = mockito::Server::new_async().await;

    let _m = server
        .mock("GET", "/repos/octo/gone")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let client = test_client(&server);
    let err = client.fetch_tree("octo", "gone").await.unwrap_err();

    assert!(matches!(err, AnalyzerError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn listing_rate_limit_maps_to_throttled() {
    let mut server = mockito::Server::new_async().await;

    let reset = chrono::Utc::now().timestamp() + 300;
    let _m = server
        .mock("GET", "/repos/octo/busy")
        .with_status(403)
        .with_header("x-ratelimit-reset", &reset.to_string())
        .with_body(r#"{"message": "API rate limit exceeded"}"#)
        .create_async()
        .await;

    let client = test_client(&server);
    let err = client.fetch_tree("octo", "busy").await.unwrap_err();

    match err {
        AnalyzerError::Throttled {
            message,
            retry_after_seconds,
        } => {
            assert!(message.contains("rate limit"));
            assert!(retry_after_seconds.unwrap() > 0);
        }
        other => panic!("expected Throttled, got {:?}", other),
    }
}

#[tokio::test]
async fn fetch_raw_returns_body_or_status_error() {
    let mut server = mockito::Server::new_async().await;

    let _ok = server
        .mock("GET", "/repos/octo/demo/contents/src/main.rs")
        .with_status(200)
        .with_body("fn main() {}")
        .create_async()
        .await;

    let _missing = server
        .mock("GET", "/repos/octo/demo/contents/src/gone.rs")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let client = test_client(&server);

    let body = client.fetch_raw("octo", "demo", "src/main.rs").await.unwrap();
    assert_eq!(body, "fn main() {}");

    let err = client
        .fetch_raw("octo", "demo", "src/gone.rs")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn metadata_collects_readme_media_and_languages() {
    let mut server = mockito::Server::new_async().await;

    let _repo = server
        .mock("GET", "/repos/octo/demo")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "name": "demo",
                "full_name": "octo/demo",
                "description": "a demo",
                "stargazers_count": 42,
                "forks_count": 7,
                "language": "Rust",
                "topics": ["cli"],
                "open_issues_count": 3,
                "license": {"spdx_id": "MIT"},
                "default_branch": "main"
            }"#,
        )
        .create_async()
        .await;

    let _readme = server
        .mock("GET", "/repos/octo/demo/readme")
        .with_status(200)
        .with_body("# Demo\n![shot](./docs/shot.png)\n")
        .create_async()
        .await;

    let _langs = server
        .mock("GET", "/repos/octo/demo/languages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"Rust": 12345}"#)
        .create_async()
        .await;

    let client = test_client(&server);
    let meta = client.fetch_metadata("octo", "demo").await.unwrap();

    assert_eq!(meta.full_name, "octo/demo");
    assert_eq!(meta.stars, 42);
    assert_eq!(meta.license, "MIT");
    assert_eq!(meta.languages.get("Rust"), Some(&12345));
    assert_eq!(
        meta.media_urls,
        vec!["https://raw.githubusercontent.com/octo/demo/main/docs/shot.png".to_string()]
    );
}
