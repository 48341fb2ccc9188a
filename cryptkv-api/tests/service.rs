//! HTTP-level behavior of the service adapter.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use cryptkv::{blind_label, derive_master_secret, derive_subkeys, Keyword, SubkeyPair};
use cryptkv_api::build_router;
use cryptkv_store::{Bucket, InMemoryAuditSink, InMemoryBackend, IndexEngine, StorageBackend};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_app() -> (Router, Arc<InMemoryBackend>) {
    let storage = Arc::new(InMemoryBackend::new());
    storage.init().unwrap();
    let engine = IndexEngine::new(storage.clone(), Arc::new(InMemoryAuditSink::new()));
    (build_router(engine, Duration::from_secs(3)), storage)
}

fn keys(passphrase: &str, keyword: &str) -> SubkeyPair {
    let master = derive_master_secret(passphrase.as_bytes(), b"service-tests", 4);
    derive_subkeys(&Keyword::from(keyword), &master)
}

fn key_fields(k: &SubkeyPair) -> Value {
    json!({ "index_key": k.index_key.to_hex(), "encrypt_key": k.encrypt_key.to_hex() })
}

fn put_body(k: &SubkeyPair, doc_key: &str, doc_value: &str) -> Value {
    let mut body = key_fields(k);
    body["document_key"] = json!(doc_key);
    body["document_value"] = json!(doc_value);
    body
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = test_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn put_get_delete_over_http() {
    let (app, _) = test_app();
    let k = keys("alice", "invoice");

    let (status, body) = post(&app, "/api/put", put_body(&k, "doc-1", "hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "code": 0 }));

    let (status, body) = post(&app, "/api/get", key_fields(&k)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["document_key"], "doc-1");
    assert_eq!(body["document_value"], "hello");

    let (_, body) = post(&app, "/api/delete", key_fields(&k)).await;
    assert_eq!(body, json!({ "ok": true, "code": 0 }));

    let (_, body) = post(&app, "/api/get", key_fields(&k)).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], 0);
}

#[tokio::test]
async fn storage_sees_only_labels_and_document_keys() {
    let (app, storage) = test_app();
    let k = keys("alice", "secret-keyword");
    post(&app, "/api/put", put_body(&k, "doc-1", "v")).await;

    let label = blind_label(&k.index_key);
    let entry = storage.get(Bucket::Index, label.as_bytes()).unwrap().unwrap();
    assert!(!entry.windows(b"doc-1".len()).any(|w| w == b"doc-1"));
    assert_eq!(storage.len(Bucket::Index), 1);
    assert_eq!(storage.get(Bucket::Documents, b"doc-1").unwrap(), Some(b"v".to_vec()));
}

#[tokio::test]
async fn wrong_encrypt_key_maps_to_decrypt_codes() {
    let (app, _) = test_app();
    let k = keys("alice", "shared");
    post(&app, "/api/put", put_body(&k, "doc-1", "v")).await;

    // Same label, different sealing key
    let other = keys("mallory", "shared");
    let forged = json!({ "index_key": k.index_key.to_hex(), "encrypt_key": other.encrypt_key.to_hex() });

    let (_, body) = post(&app, "/api/get", forged.clone()).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], 1);

    let (_, body) = post(&app, "/api/delete", forged.clone()).await;
    assert_eq!(body, json!({ "ok": false, "code": 1 }));

    let mut put = forged;
    put["document_key"] = json!("doc-2");
    put["document_value"] = json!("x");
    let (_, body) = post(&app, "/api/put", put).await;
    assert_eq!(body, json!({ "ok": false, "code": 1 }));

    // Original binding untouched
    let (_, body) = post(&app, "/api/get", key_fields(&k)).await;
    assert_eq!(body["document_key"], "doc-1");
}

#[tokio::test]
async fn missing_document_maps_to_code_2() {
    let (app, storage) = test_app();
    let k = keys("alice", "dangling");
    post(&app, "/api/put", put_body(&k, "doc-1", "v")).await;
    storage.delete(Bucket::Documents, b"doc-1").unwrap();

    let (status, body) = post(&app, "/api/get", key_fields(&k)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn delete_without_binding_maps_to_code_0() {
    let (app, _) = test_app();
    let (_, body) = post(&app, "/api/delete", key_fields(&keys("alice", "never"))).await;
    assert_eq!(body, json!({ "ok": false, "code": 0 }));
}

#[tokio::test]
async fn malformed_keys_are_rejected_before_the_engine() {
    let (app, storage) = test_app();
    let k = keys("alice", "k");

    let mut bad_hex = put_body(&k, "doc", "v");
    bad_hex["index_key"] = json!("zz-not-hex");
    let (status, body) = post(&app, "/api/put", bad_hex).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("index_key"));

    let mut short = key_fields(&k);
    short["encrypt_key"] = json!("abcd");
    let (status, body) = post(&app, "/api/get", short.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("encrypt_key"));

    let (status, _) = post(&app, "/api/delete", short).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(storage.is_empty(Bucket::Index));
    assert!(storage.is_empty(Bucket::Documents));
}

#[tokio::test]
async fn missing_fields_are_client_errors() {
    let (app, _) = test_app();
    let (status, _) = post(&app, "/api/put", json!({ "document_key": "a" })).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn non_utf8_values_are_returned_lossily() {
    let (app, storage) = test_app();
    let k = keys("alice", "bytes");
    post(&app, "/api/put", put_body(&k, "doc-1", "v")).await;
    storage.put(Bucket::Documents, b"doc-1", &[0x66, 0xff, 0x6f]).unwrap();

    let (_, body) = post(&app, "/api/get", key_fields(&k)).await;
    assert_eq!(body["document_value"], "f\u{fffd}o");
}
