use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use docdex_core::{Index, IndexError, IndexStats, Package, SortMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default = "default_limit")]
    pub limit: usize,
}
fn default_limit() -> usize { DEFAULT_LIMIT }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<PackageSummary>,
}

#[derive(Serialize)]
pub struct SubdirsResponse {
    pub path: String,
    pub results: Vec<PackageSummary>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PackageSummary {
    pub import_path: String,
    pub name: String,
    pub synopsis: String,
    pub project_root: String,
}

impl From<&Package> for PackageSummary {
    fn from(pkg: &Package) -> Self {
        Self {
            import_path: pkg.import_path.clone(),
            name: pkg.name.clone(),
            synopsis: pkg.synopsis.clone(),
            project_root: pkg.project_root.clone(),
        }
    }
}

/// Settings read from the environment at startup.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Token for the write endpoints. Writes are refused when unset.
    pub admin_token: Option<String>,
    /// Comma-separated allowed origins; any origin when unset or unparsable.
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<Index>,
    pub admin_token: Option<String>,
}

/// Error body returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    Index(IndexError),
    Unauthorized(&'static str),
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self { ApiError::Index(err) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Index(err) => {
                let status = match err {
                    IndexError::NotFound(_) => StatusCode::NOT_FOUND,
                    IndexError::InvalidArgument(_) | IndexError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn build_app(index: Arc<Index>, config: ServerConfig) -> Router {
    let cors = match config.cors_allow_origin.as_deref() {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app_state = AppState { index, admin_token: config.admin_token };
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/pkg/*path", get(get_handler).delete(remove_handler))
        .route("/subdirs/*path", get(subdirs_handler))
        .route("/stats", get(stats_handler))
        .route("/index/batch", post(index_batch))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let hits = state.index.query(&params.q, params.sort)?;
    let limit = params.limit.min(MAX_LIMIT);
    let results = hits.iter().take(limit).map(|pkg| PackageSummary::from(pkg.as_ref())).collect();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: hits.len(),
        results,
    }))
}

pub async fn get_handler(State(state): State<AppState>, Path(path): Path<String>) -> Result<Json<Package>, ApiError> {
    let pkg = state.index.get(&path)?;
    Ok(Json(Package::clone(&pkg)))
}

pub async fn subdirs_handler(State(state): State<AppState>, Path(path): Path<String>) -> Result<Json<SubdirsResponse>, ApiError> {
    let results = state.index.subdirs(&path)?.iter().map(|pkg| PackageSummary::from(pkg.as_ref())).collect();
    Ok(Json(SubdirsResponse { path, results }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.index.stats())
}

// --- Admin endpoints ---
async fn index_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(packages): Json<Vec<Package>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let indexed = state.index.put_all(packages)?;
    tracing::info!(indexed, "indexed batch");
    Ok(Json(serde_json::json!({ "indexed": indexed })))
}

async fn remove_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let removed = state.index.remove(&path)?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token"))
    }
}
