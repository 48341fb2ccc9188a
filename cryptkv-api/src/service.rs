//! HTTP service adapter: decodes wire requests into typed subkeys, runs the
//! index engine, and maps each outcome onto the stable result codes.

use crate::wire::{
    codes, DeleteRequest, DeleteResponse, GetRequest, GetResponse, PutRequest, PutResponse,
    DELETE_PATH, GET_PATH, HEALTH_PATH, PUT_PATH,
};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cryptkv::{EncryptKey, IndexKey, KeyParseError};
use cryptkv_store::{DeleteError, GetMiss, IndexEngine, PutError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub struct AppState {
    pub engine: IndexEngine,
}

pub type Shared = Arc<AppState>;

/// Build the service router over an engine.
///
/// `request_timeout` bounds each request end to end; an expired request
/// answers 408 and never reaches the result-code space.
pub fn build_router(engine: IndexEngine, request_timeout: Duration) -> Router {
    let state: Shared = Arc::new(AppState { engine });

    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(PUT_PATH, post(put_handler))
        .route(GET_PATH, post(get_handler))
        .route(DELETE_PATH, post(delete_handler))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Serialize, Clone, Debug)]
pub struct ApiError {
    pub error: String,
}

fn err(msg: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: msg.into() }))
}

fn parse_keys(index_key: &str, encrypt_key: &str) -> Result<(IndexKey, EncryptKey), Response> {
    let bad = |field: &str, e: KeyParseError| {
        tracing::debug!(field, error = %e, "rejecting request");
        err(format!("{}: {}", field, e)).into_response()
    };
    let index_key = IndexKey::from_hex(index_key).map_err(|e| bad("index_key", e))?;
    let encrypt_key = EncryptKey::from_hex(encrypt_key).map_err(|e| bad("encrypt_key", e))?;
    Ok((index_key, encrypt_key))
}

// ---------------------------------------------------------------------------
// Code mapping
// ---------------------------------------------------------------------------

pub fn put_code(e: &PutError) -> u32 {
    match e {
        PutError::LookupFailed(_) => codes::put::LOOKUP_FAILED,
        PutError::DecryptFailed => codes::put::DECRYPT_FAILED,
        PutError::DeleteOldFailed(_) => codes::put::DELETE_OLD_FAILED,
        PutError::WriteFailed(_) => codes::put::WRITE_FAILED,
        // Sealing happens before any write; it shares the final-stage code.
        PutError::SealFailed | PutError::IndexWriteFailed(_) => codes::put::INDEX_WRITE_FAILED,
    }
}

pub fn get_code(miss: &GetMiss) -> u32 {
    match miss {
        GetMiss::NoIndex | GetMiss::LookupFailed(_) => codes::get::NO_INDEX,
        GetMiss::DecryptFailed => codes::get::DECRYPT_FAILED,
        GetMiss::DocumentMissing | GetMiss::DocumentLookupFailed(_) => {
            codes::get::DOCUMENT_MISSING
        }
    }
}

pub fn delete_code(e: &DeleteError) -> u32 {
    match e {
        DeleteError::NoIndex | DeleteError::LookupFailed(_) => codes::delete::NO_INDEX,
        DeleteError::DecryptFailed => codes::delete::DECRYPT_FAILED,
        DeleteError::DocumentDeleteFailed(_) => codes::delete::DOCUMENT_DELETE_FAILED,
        DeleteError::IndexDeleteFailed(_) => codes::delete::INDEX_DELETE_FAILED,
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

async fn health(State(state): State<Shared>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "labels_in_flight": state.engine.labels_in_flight(),
    }))
}

async fn put_handler(State(state): State<Shared>, Json(req): Json<PutRequest>) -> Response {
    let (index_key, encrypt_key) = match parse_keys(&req.index_key, &req.encrypt_key) {
        Ok(keys) => keys,
        Err(resp) => return resp,
    };

    let resp = match state
        .engine
        .put(
            &index_key,
            &encrypt_key,
            req.document_key.as_bytes(),
            req.document_value.as_bytes(),
        )
        .await
    {
        Ok(_) => PutResponse::success(),
        Err(e) => PutResponse::failure(put_code(&e)),
    };
    Json(resp).into_response()
}

async fn get_handler(State(state): State<Shared>, Json(req): Json<GetRequest>) -> Response {
    let (index_key, encrypt_key) = match parse_keys(&req.index_key, &req.encrypt_key) {
        Ok(keys) => keys,
        Err(resp) => return resp,
    };

    let resp = match state.engine.get(&index_key, &encrypt_key).await {
        Ok(doc) => GetResponse::found(
            String::from_utf8_lossy(&doc.key).into_owned(),
            String::from_utf8_lossy(&doc.value).into_owned(),
        ),
        Err(miss) => GetResponse::miss(get_code(&miss)),
    };
    Json(resp).into_response()
}

async fn delete_handler(State(state): State<Shared>, Json(req): Json<DeleteRequest>) -> Response {
    let (index_key, encrypt_key) = match parse_keys(&req.index_key, &req.encrypt_key) {
        Ok(keys) => keys,
        Err(resp) => return resp,
    };

    let resp = match state.engine.delete(&index_key, &encrypt_key).await {
        Ok(()) => DeleteResponse::success(),
        Err(e) => DeleteResponse::failure(delete_code(&e)),
    };
    Json(resp).into_response()
}
