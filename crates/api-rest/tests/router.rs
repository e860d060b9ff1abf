use api_rest::{router, AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use synopsis_core::{
    CompletionService, CoreConfig, PaperRecord, PaperSource, ResearchQuery, ResearchService,
    SqliteResearchStore, SynopsisError, SynopsisResult, SynopsisService,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Returns papers for every query except "empty", and fails for "offline".
struct StubSource;

#[async_trait]
impl PaperSource for StubSource {
    async fn search(&self, query: &ResearchQuery, limit: usize) -> SynopsisResult<Vec<PaperRecord>> {
        match query.as_str() {
            "empty" => Ok(Vec::new()),
            "offline" => Err(SynopsisError::Upstream("connection refused".into())),
            _ => Ok((0..limit.min(4))
                .map(|i| PaperRecord {
                    title: format!("Soil Sensing Study {i}"),
                    abstract_text: "Abstract.".into(),
                    authors: "Doe, J.".into(),
                    year: "2023".into(),
                    venue: "Journal".into(),
                    url: "N/A".into(),
                })
                .collect()),
        }
    }
}

struct StubCompletion;

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, _prompt: &str) -> String {
        "Generated text.".to_string()
    }
}

async fn app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let cfg = Arc::new(CoreConfig::with_data_dir(dir.path().to_path_buf()));
    let store = SqliteResearchStore::connect("sqlite::memory:", 1)
        .await
        .unwrap();
    let service = ResearchService::new(cfg, Arc::new(StubSource), Arc::new(store))
        .with_synopsis(SynopsisService::new(Arc::new(StubCompletion)));
    (router(AppState::new(service)), dir)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ok"], true);
}

#[tokio::test]
async fn test_fetch_papers_returns_capitalised_fields() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json(
            "/fetch-papers",
            json!({"query": "soil", "max_results": 2}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let papers = body["papers"].as_array().unwrap();
    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0]["Title"], "Soil Sensing Study 0");
    assert_eq!(papers[0]["URL"], "N/A");
}

#[tokio::test]
async fn test_fetch_papers_error_statuses() {
    let cases = [
        (json!({"query": "empty"}), StatusCode::NOT_FOUND),
        (json!({"query": "offline"}), StatusCode::BAD_GATEWAY),
        (json!({"query": "   "}), StatusCode::BAD_REQUEST),
        (json!({"query": "soil", "max_results": 0}), StatusCode::BAD_REQUEST),
    ];

    for (body, expected) in cases {
        let (app, _dir) = app().await;
        let response = app.oneshot(post_json("/fetch-papers", body)).await.unwrap();
        assert_eq!(response.status(), expected);
        assert!(json_body(response).await["detail"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_bodies_get_detail_response() {
    let requests = [
        Request::builder()
            .method("POST")
            .uri("/fetch-papers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
        post_json("/generate", json!({"max_results": 3})),
        post_json("/render", json!({"text": "# Title"})),
        Request::builder()
            .method("POST")
            .uri("/analyze-papers")
            .body(Body::from(json!({"query": "soil"}).to_string()))
            .unwrap(),
    ];

    for request in requests {
        let (app, _dir) = app().await;
        let uri = request.uri().to_string();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert!(json_body(response).await["detail"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_generate_then_history() {
    let (app, _dir) = app().await;

    let response = app
        .clone()
        .oneshot(post_json("/generate", json!({"query": "soil"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["synopsis"]["title"], "Generated text.");
    assert!(std::path::Path::new(body["docx_path"].as_str().unwrap()).is_file());

    let response = app
        .clone()
        .oneshot(post_json("/generate", json!({"query": "soil"})))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["cached"], true);

    let response = app
        .oneshot(Request::get("/researches").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["researches"][0]["query"], "soil");
}

#[tokio::test]
async fn test_render_returns_docx_attachment() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json(
            "/render",
            json!({"markdown": "# Methodology\n\n1. Collect data\n\n# References\n\nDoe (2020). T."}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("research_synopsis.docx"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_render_empty_markdown_is_bad_request() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json("/render", json!({"markdown": "\n\n  \n"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
