use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

use vitality_core::Document;
use vitality_core::db::{Database, json_path};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB
const MAX_QUERY_LIMIT: usize = 500;

#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Database>>,
    api_key: Option<String>,
}

// --- Wire types (shared with the HTTP remote client) ---

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DocumentRef {
    pub collection: String,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FieldQuery {
    pub collection: String,
    pub field: String,
    pub value: serde_json::Value,
    #[serde(default = "default_field_limit")]
    pub limit: usize,
}

fn default_field_limit() -> usize {
    1
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RecentQuery {
    pub collection: String,
    pub order_field: String,
    #[serde(default = "default_recent_limit")]
    pub limit: usize,
}

fn default_recent_limit() -> usize {
    30
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DocumentList {
    pub documents: Vec<Document>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn check_collection(collection: &str) -> Result<(), ApiError> {
    if collection.is_empty()
        || collection.split('/').any(|segment| segment.trim().is_empty())
    {
        return Err(ApiError::BadRequest(format!(
            "Invalid collection path '{collection}'"
        )));
    }
    Ok(())
}

fn check_field(field: &str) -> Result<(), ApiError> {
    json_path(field)
        .map(|_| ())
        .map_err(|e| ApiError::BadRequest(format!("{e}")))
}

impl DocumentRef {
    fn validate(&self) -> Result<(), ApiError> {
        check_collection(&self.collection)?;
        if self.id.trim().is_empty() || self.id.contains('/') {
            return Err(ApiError::BadRequest(format!(
                "Invalid document id '{}'",
                self.id
            )));
        }
        Ok(())
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn get_document(
    State(state): State<AppState>,
    Query(doc): Query<DocumentRef>,
) -> Result<Json<Document>, ApiError> {
    doc.validate()?;
    let found = {
        let db = state.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.get_document(&doc.collection, &doc.id)
            .context("database error")?
    };
    found.map(Json).ok_or_else(|| {
        ApiError::NotFound(format!(
            "No document '{}' in '{}'",
            doc.id, doc.collection
        ))
    })
}

async fn patch_document(
    State(state): State<AppState>,
    Query(doc): Query<DocumentRef>,
    Json(partial): Json<Document>,
) -> Result<Json<Document>, ApiError> {
    doc.validate()?;
    let merged = {
        let db = state.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.merge_document(&doc.collection, &doc.id, partial)
            .context("failed to merge document")?
    };
    Ok(Json(merged))
}

async fn query_documents(
    State(state): State<AppState>,
    Json(req): Json<FieldQuery>,
) -> Result<Json<DocumentList>, ApiError> {
    check_collection(&req.collection)?;
    check_field(&req.field)?;
    let limit = req.limit.min(MAX_QUERY_LIMIT);
    let documents = {
        let db = state.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.query_documents_by_field(&req.collection, &req.field, &req.value, limit)
            .context("database error")?
    };
    Ok(Json(DocumentList { documents }))
}

async fn recent_documents(
    State(state): State<AppState>,
    Json(req): Json<RecentQuery>,
) -> Result<Json<DocumentList>, ApiError> {
    check_collection(&req.collection)?;
    check_field(&req.order_field)?;
    let limit = req.limit.min(MAX_QUERY_LIMIT);
    let documents = {
        let db = state.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.recent_documents(&req.collection, &req.order_field, limit)
            .context("database error")?
    };
    Ok(Json(DocumentList { documents }))
}

// --- Router ---

pub(crate) fn build_router(db: Arc<Mutex<Database>>, api_key: Option<String>) -> Router {
    let state = AppState { db, api_key };
    Router::new()
        .route("/api/documents", get(get_document).patch(patch_document))
        .route("/api/query", post(query_documents))
        .route("/api/recent", post(recent_documents))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of the key, or a mask when it is too
/// short to hint at safely.
fn key_hint(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    db: Database,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let app = build_router(Arc::new(Mutex::new(db)), api_key.clone());

    if let Some(ref key) = api_key {
        eprintln!(
            "API key: {} (see api_key file in data directory)",
            key_hint(key)
        );
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {bind}:{port}"))?;
    eprintln!("Listening on http://{bind}:{port}");
    info!(%bind, port, "document server started");
    axum::serve(listener, app).await?;
    Ok(())
}
