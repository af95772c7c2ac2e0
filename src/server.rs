//! Read-only HTTP API over the catalog.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/brands` | Brand entries from the master index |
//! | `GET`  | `/brands/{id}` | One normalized brand catalog |
//! | `GET`  | `/brands/{id}/galaxies` | One brand grouped by galaxy / spectrum |
//! | `GET`  | `/galaxies` | The fixed universal taxonomy |
//! | `GET`  | `/categories/{id}?brand=` | Products in a galaxy or spectrum |
//! | `GET`  | `/search?q=&brand=&category=&limit=` | Instant search |
//! | `GET`  | `/stats` | Index totals and cache occupancy |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "not found: brand 'acme'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `validation_error` (422),
//! `upstream_error` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser UI can
//! call the API from another origin.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::CatalogError;
use crate::loader::{CatalogLoader, CatalogStats};
use crate::models::{BrandCatalog, BrandEntry};
use crate::search::{InstantSearch, SearchHit, SearchOptions, SearchSettings};
use crate::source::{self, DataSource};
use crate::taxonomy::{self, GalaxyDef};
use crate::views::{self, BrandView, CategoryCatalog};
use crate::watcher::{self, DataWatcher};

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DataSource>,
    pub index_path: String,
    pub loader: Arc<CatalogLoader>,
    pub search: Arc<InstantSearch>,
}

impl AppState {
    pub fn new(source: Arc<dyn DataSource>, config: &Config) -> Self {
        let index_path = config.data.index_file.clone();
        Self {
            loader: Arc::new(CatalogLoader::new(source.clone(), index_path.clone())),
            search: Arc::new(InstantSearch::new(
                source.clone(),
                config.data.search_index_file.clone(),
                SearchSettings::from(&config.search),
            )),
            source,
            index_path,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/brands", get(handle_brands))
        .route("/brands/{id}", get(handle_brand))
        .route("/brands/{id}/galaxies", get(handle_brand_galaxies))
        .route("/galaxies", get(handle_galaxies))
        .route("/categories/{id}", get(handle_category))
        .route("/search", get(handle_search))
        .route("/stats", get(handle_stats))
        .layer(cors)
        .with_state(state)
}

/// Binds to `[server].bind` and serves until the process is terminated.
///
/// The search index is loaded before the listener opens; a failure there
/// is logged and retried on the first `/search`. With `[watch] enabled`,
/// changes in the data directory invalidate both caches.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let source = source::source_from_config(&config.data)?;
    let state = AppState::new(source.clone(), config);
    state.search.initialize().await;

    let _watcher = if config.watch.enabled {
        match source.local_root() {
            Some(root) => {
                let w = DataWatcher::start(root, Duration::from_millis(config.watch.debounce_ms))?;
                watcher::watch_and_invalidate(&w, state.loader.clone(), state.search.clone());
                Some(w)
            }
            None => {
                log::warn!("[watch] ignored: {} is not a local directory", source.describe());
                None
            }
        }
    } else {
        None
    };

    let app = router(state);
    let bind_addr = config.server.bind.clone();
    log::info!(
        "Catalog API listening on http://{} (data: {})",
        bind_addr,
        source.describe()
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let (status, code) = match &err {
            CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            CatalogError::Validation { .. } | CatalogError::Parse { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error")
            }
            CatalogError::Network { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            CatalogError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            log::error!("{}", err);
        }
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

// ============ Handlers ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_brands(State(state): State<AppState>) -> Result<Json<Vec<BrandEntry>>, AppError> {
    let index = state.loader.load_index().await?;
    Ok(Json(index.brands.clone()))
}

async fn handle_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BrandCatalog>, AppError> {
    let catalog = state.loader.load_brand(&id).await?;
    Ok(Json(catalog.as_ref().clone()))
}

async fn handle_brand_galaxies(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BrandView>, AppError> {
    Ok(Json(views::brand_catalog(&state.loader, &id).await?))
}

async fn handle_galaxies() -> Json<&'static [GalaxyDef]> {
    Json(taxonomy::galaxies())
}

#[derive(Deserialize)]
struct CategoryParams {
    brand: Option<String>,
}

async fn handle_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<CategoryParams>,
) -> Result<Json<CategoryCatalog>, AppError> {
    let brand = params.brand.as_deref().filter(|b| !b.is_empty());
    let view = views::category_catalog(state.source.clone(), &state.index_path, &id, brand).await?;
    Ok(Json(view))
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    brand: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SearchHit>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.unwrap_or_default();
    if params.limit == Some(0) {
        return Err(bad_request("limit must be at least 1"));
    }
    if !state.search.is_ready() {
        state.search.try_initialize().await?;
    }

    let options = SearchOptions {
        limit: params.limit,
        brand: params.brand.filter(|b| !b.is_empty()),
        category: params.category.filter(|c| !c.is_empty()),
    };
    let results = state.search.search(&query, &options);
    Ok(Json(SearchResponse { query, results }))
}

async fn handle_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, AppError> {
    state.loader.load_index().await?;
    Ok(Json(state.loader.get_stats()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::{json, Value};

    fn fixture() -> MemorySource {
        MemorySource::new()
            .with(
                "index.json",
                json!({
                    "version": "3.7",
                    "total_products": 2,
                    "brands": [
                        { "id": "roland", "name": "Roland", "data_file": "roland.json" },
                        { "id": "broken", "name": "Broken", "data_file": "broken.json" }
                    ]
                }),
            )
            .with(
                "roland.json",
                json!({
                    "brand_identity": { "id": "roland", "name": "Roland" },
                    "products": [
                        { "id": "r1", "name": "Juno-X", "category": "Synthesizers" },
                        { "id": "r2", "name": "TD-17", "category": "V-Drums" }
                    ]
                }),
            )
            .with("broken.json", json!({ "products": [] }))
            .with(
                "search_index.json",
                json!([
                    { "id": "r1", "label": "Juno-X", "brand": "roland", "category": "Synthesizers" },
                    { "id": "r2", "label": "TD-17", "brand": "roland", "category": "V-Drums" }
                ]),
            )
    }

    async fn spawn(source: MemorySource) -> String {
        let config = Config::minimal("memory");
        let state = AppState::new(Arc::new(source), &config);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn get_json(url: &str) -> (u16, Value) {
        let resp = reqwest::get(url).await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_health_and_brands() {
        let base = spawn(fixture()).await;
        let (status, body) = get_json(&format!("{}/health", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");

        let (status, body) = get_json(&format!("{}/brands", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["id"], "roland");
    }

    #[tokio::test]
    async fn test_brand_errors_map_to_status() {
        let base = spawn(fixture()).await;
        let (status, body) = get_json(&format!("{}/brands/roland", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["products"].as_array().unwrap().len(), 2);

        let (status, body) = get_json(&format!("{}/brands/acme", base)).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"]["code"], "not_found");

        let (status, body) = get_json(&format!("{}/brands/broken", base)).await;
        assert_eq!(status, 422);
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_missing_index_is_upstream_error() {
        let base = spawn(MemorySource::new()).await;
        let (status, body) = get_json(&format!("{}/brands", base)).await;
        assert_eq!(status, 502);
        assert_eq!(body["error"]["code"], "upstream_error");
    }

    #[tokio::test]
    async fn test_category_and_galaxies() {
        let base = spawn(fixture()).await;
        let (status, body) = get_json(&format!("{}/categories/drums?brand=roland", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["products"][0]["id"], "r2");

        let (_, body) = get_json(&format!("{}/brands/roland/galaxies", base)).await;
        assert_eq!(body["galaxies"][0]["id"], "keys");
        assert_eq!(body["galaxies"][0]["total"], 1);

        let (_, body) = get_json(&format!("{}/galaxies", base)).await;
        assert_eq!(body.as_array().unwrap().len(), taxonomy::galaxies().len());
    }

    #[tokio::test]
    async fn test_search_initializes_lazily() {
        let base = spawn(fixture()).await;
        let (status, body) = get_json(&format!("{}/search?q=juno", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["results"][0]["id"], "r1");

        let (status, _) = get_json(&format!("{}/search?q=juno&limit=0", base)).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_stats_reflect_index() {
        let base = spawn(fixture()).await;
        let (status, body) = get_json(&format!("{}/stats", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["total_brands"], 2);
        assert_eq!(body["version"], "3.7");
        assert_eq!(body["loaded_brands"], 0);
    }
}
