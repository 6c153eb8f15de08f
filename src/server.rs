//! HTTP service
//!
//! Read-only JSON endpoints over a [`Comparer`]:
//!
//! - `GET /api/table/list`
//! - `GET /api/column/list?table=T`
//! - `GET /api/field/list?table=T&column=C`
//! - `GET /server/info`
//! - `GET /health`

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::error::{DiffError, DiffResult};
use crate::report::{ColumnReport, Comparer, FieldReport, TableReport};
use crate::source::SchemaSource;

pub type DynComparer = Comparer<Box<dyn SchemaSource>, Box<dyn SchemaSource>>;

/// Shared state for the service.
pub struct AppState {
    pub comparer: DynComparer,
    /// Held for the duration of every comparison, so at most one runs at a time.
    pub lock: Mutex<()>,
    /// Directory holding `index.html` and `assets/`.
    pub assets: Option<PathBuf>,
}

impl AppState {
    pub fn new(comparer: DynComparer) -> Self {
        Self {
            comparer,
            lock: Mutex::new(()),
            assets: None,
        }
    }

    pub fn assets(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets = Some(dir.into());
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Handler error: a comparison failure or a malformed request.
#[derive(Debug)]
pub enum ApiError {
    Diff(DiffError),
    BadRequest(String),
}

impl From<DiffError> for ApiError {
    fn from(e: DiffError) -> Self {
        Self::Diff(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Diff(e) => {
                tracing::warn!("Request failed: {}", e);
                (
                    StatusCode::from_u16(e.status_code())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    ErrorResponse {
                        error: e.to_string(),
                        code: e.code().to_string(),
                    },
                )
            }
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    code: "BAD_REQUEST".to_string(),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ColumnParams {
    pub table: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldParams {
    pub table: Option<String>,
    pub column: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing query parameter: {}", name)))
}

pub async fn table_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TableReport>, ApiError> {
    let _guard = state.lock.lock().await;
    tracing::info!("Comparing tables");
    Ok(Json(state.comparer.table_report().await?))
}

pub async fn column_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ColumnParams>,
) -> Result<Json<ColumnReport>, ApiError> {
    let table = required(params.table, "table")?;
    let _guard = state.lock.lock().await;
    tracing::info!("Comparing columns of {}", table);
    Ok(Json(state.comparer.column_report(&table).await?))
}

pub async fn field_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FieldParams>,
) -> Result<Json<FieldReport>, ApiError> {
    let table = required(params.table, "table")?;
    let column = required(params.column, "column")?;
    let _guard = state.lock.lock().await;
    tracing::info!("Comparing fields of {}.{}", table, column);
    Ok(Json(state.comparer.field_report(&table, &column).await?))
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub left: serde_json::Value,
    pub right: serde_json::Value,
    pub now: String,
}

pub async fn server_info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        left: state.comparer.left().describe(),
        right: state.comparer.right().describe(),
        now: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/server/info", get(server_info))
        .route("/api/table/list", get(table_list))
        .route("/api/column/list", get(column_list))
        .route("/api/field/list", get(field_list));

    if let Some(dir) = &state.assets {
        let index = dir.join("index.html");
        router = router
            .route_service("/", ServeFile::new(&index))
            .route_service("/index", ServeFile::new(&index))
            .nest_service("/assets", ServeDir::new(dir.join("assets")));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> DiffResult<()> {
    let router = create_router(Arc::new(state));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| DiffError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("mysqldiff listening on {}", addr);
    tracing::info!("   GET /api/table/list");
    tracing::info!("   GET /api/column/list?table=");
    tracing::info!("   GET /api/field/list?table=&column=");

    axum::serve(listener, router).await?;
    Ok(())
}
