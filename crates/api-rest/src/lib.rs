//! # API REST
//!
//! REST API for the research synopsis generator.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Mapping `SynopsisError` onto status codes and `{"detail": ...}` bodies
//!
//! Uses `api-shared` for request and response bodies.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, FromRequest, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    ErrorRes, GenerateRes, HealthRes, HealthService, Paper, PapersRes, RenderReq, ResearchEntry,
    ResearchReq, ResearchesRes, SavePapersRes, SynopsisRes, SynopsisSections,
};
use synopsis_core::{
    constants::SYNOPSIS_DOCX_FILENAME, CoreConfig, GroqClient, ResearchQuery, ResearchService,
    SemanticScholarSource, SqliteResearchStore, SynopsisError, SynopsisService,
};

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Pool size for file-backed research stores.
const STORE_MAX_CONNECTIONS: u32 = 5;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ResearchService>,
}

impl AppState {
    pub fn new(service: ResearchService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Wire the production collaborators from configuration.
    ///
    /// Without a completion API key the server still starts; the drafting endpoints then
    /// answer `400 Bad Request`.
    ///
    /// # Errors
    /// Returns an error if the research store cannot be opened.
    pub async fn from_config(cfg: Arc<CoreConfig>) -> anyhow::Result<Self> {
        let max_connections = if cfg.database_url().contains(":memory:") {
            1
        } else {
            STORE_MAX_CONNECTIONS
        };
        let store = SqliteResearchStore::connect(cfg.database_url(), max_connections).await?;
        let source = SemanticScholarSource::new(cfg.paper_source_url());

        let mut service = ResearchService::new(cfg.clone(), Arc::new(source), Arc::new(store));
        match GroqClient::new(cfg.completion()) {
            Ok(client) => service = service.with_synopsis(SynopsisService::new(Arc::new(client))),
            Err(e) => tracing::warn!("synopsis drafting disabled: {}", e),
        }

        Ok(Self::new(service))
    }
}

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    Core(SynopsisError),
    BadRequest(String),
    Internal(String),
}

impl From<SynopsisError> for ApiError {
    fn from(e: SynopsisError) -> Self {
        Self::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::Core(e @ (SynopsisError::InvalidInput(_) | SynopsisError::Parse(_))) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Self::Core(e @ SynopsisError::NoPapers(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            Self::Core(SynopsisError::Upstream(e)) => {
                tracing::error!("Upstream error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "An upstream service failed".to_string(),
                )
            }
            Self::Core(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        (status, Json(ErrorRes { detail })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// `Json` extractor whose rejections use the `{"detail": ...}` error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        fetch_papers,
        analyze_papers,
        save_papers,
        generate,
        list_researches,
        render,
    ),
    components(schemas(
        HealthRes,
        ResearchReq,
        Paper,
        PapersRes,
        SynopsisSections,
        SynopsisRes,
        SavePapersRes,
        GenerateRes,
        ResearchEntry,
        ResearchesRes,
        RenderReq,
        ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fetch-papers", post(fetch_papers))
        .route("/analyze-papers", post(analyze_papers))
        .route("/save-papers", post(save_papers))
        .route("/generate", post(generate))
        .route("/researches", get(list_researches))
        .route("/render", post(render))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Validate the query and resolve `max_results` against the configured default.
fn research_args(state: &AppState, req: ResearchReq) -> ApiResult<(ResearchQuery, usize)> {
    let query = ResearchQuery::new(&req.query).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let max_results = req
        .max_results
        .unwrap_or_else(|| state.service.config().default_max_results());
    Ok((query, max_results))
}

fn papers_body(papers: Vec<synopsis_core::PaperRecord>) -> Vec<Paper> {
    papers.into_iter().map(Paper::from).collect()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/fetch-papers",
    request_body = ResearchReq,
    responses(
        (status = 200, description = "Papers for the query", body = PapersRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "No papers found", body = ErrorRes),
        (status = 502, description = "Paper source failed", body = ErrorRes)
    )
)]
/// Fetch papers for a query, from the cache when available.
///
/// # Errors
/// Returns `404 Not Found` if the paper source has nothing for the query.
#[axum::debug_handler]
async fn fetch_papers(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResearchReq>,
) -> ApiResult<Json<PapersRes>> {
    let (query, max_results) = research_args(&state, req)?;
    let papers = state.service.fetch_papers(&query, max_results).await?;
    Ok(Json(PapersRes {
        papers: papers_body(papers),
    }))
}

#[utoipa::path(
    post,
    path = "/analyze-papers",
    request_body = ResearchReq,
    responses(
        (status = 200, description = "Generated synopsis", body = SynopsisRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "No papers found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Draft a synopsis for a query.
#[axum::debug_handler]
async fn analyze_papers(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResearchReq>,
) -> ApiResult<Json<SynopsisRes>> {
    let (query, max_results) = research_args(&state, req)?;
    let synopsis = state.service.analyze(&query, max_results).await?;
    Ok(Json(SynopsisRes {
        synopsis: synopsis.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/save-papers",
    request_body = ResearchReq,
    responses(
        (status = 200, description = "Papers exported to CSV", body = SavePapersRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "No papers found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Export the papers for a query as CSV on the server.
#[axum::debug_handler]
async fn save_papers(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResearchReq>,
) -> ApiResult<Json<SavePapersRes>> {
    let (query, max_results) = research_args(&state, req)?;
    let path = state.service.save_papers(&query, max_results).await?;
    Ok(Json(SavePapersRes {
        message: "Papers saved successfully".into(),
        path: path.display().to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/generate",
    request_body = ResearchReq,
    responses(
        (status = 200, description = "Synopsis generated and rendered", body = GenerateRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "No papers found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Run the full pipeline: papers, synopsis, markdown and `.docx`.
///
/// # Returns
/// * `Ok(Json<GenerateRes>)` - Artifact paths, with `cached` set when an earlier run was reused
///
/// # Errors
/// Returns `500 Internal Server Error` if an artifact cannot be written.
#[axum::debug_handler]
async fn generate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResearchReq>,
) -> ApiResult<Json<GenerateRes>> {
    let (query, max_results) = research_args(&state, req)?;
    let outcome = state.service.generate(&query, max_results).await?;
    Ok(Json(GenerateRes {
        papers: papers_body(outcome.papers),
        synopsis: outcome.synopsis.into(),
        csv_path: outcome.csv_path.display().to_string(),
        markdown_path: outcome.markdown_path.display().to_string(),
        docx_path: outcome.docx_path.display().to_string(),
        cached: outcome.cached,
    }))
}

#[utoipa::path(
    get,
    path = "/researches",
    responses(
        (status = 200, description = "Cached queries, most recent first", body = ResearchesRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_researches(State(state): State<AppState>) -> ApiResult<Json<ResearchesRes>> {
    let researches = state
        .service
        .history()
        .await?
        .into_iter()
        .map(|s| ResearchEntry {
            query: s.query,
            created_at: s.created_at.to_rfc3339(),
        })
        .collect();
    Ok(Json(ResearchesRes { researches }))
}

#[utoipa::path(
    post,
    path = "/render",
    request_body = RenderReq,
    responses(
        (status = 200, description = "Rendered .docx document", body = [u8], content_type = "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        (status = 400, description = "Empty or unparseable markdown", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Render markdown to a `.docx` download.
///
/// Rendering runs on the blocking pool; each request builds its own document.
#[axum::debug_handler]
async fn render(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RenderReq>,
) -> ApiResult<Response> {
    let service = state.service.clone();
    let bytes = tokio::task::spawn_blocking(move || service.render_markdown(&req.markdown))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    tracing::info!("rendered document ({} bytes)", bytes.len());
    let disposition = format!("attachment; filename=\"{SYNOPSIS_DOCX_FILENAME}\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
