//! # CryptKV API
//!
//! HTTP adapter for the encrypted keyword index, plus the client that
//! builds its queries.
//!
//! Routes (all JSON):
//!
//! ```text
//!   GET  /health      - liveness
//!   POST /api/put     - {document_key, document_value, index_key, encrypt_key} -> {ok, code}
//!   POST /api/get     - {index_key, encrypt_key} -> {ok, code, document_key, document_value}
//!   POST /api/delete  - {index_key, encrypt_key} -> {ok, code}
//! ```
//!
//! Malformed subkeys are rejected with 400 and `{"error": ...}`; protocol
//! outcomes always answer 200 with `ok` and a stable `code`
//! (see [`wire::codes`]).

pub mod client;
pub mod config;
pub mod server;
pub mod service;
pub mod wire;

pub use client::{ClientError, CryptKvClient, RouterTransport, Transport};
pub use config::{BackendKind, ClientConfig, ConfigError, LogFormat, ServerConfig};
pub use service::{build_router, ApiError, AppState, Shared};
pub use wire::{
    DeleteRequest, DeleteResponse, GetRequest, GetResponse, GetStatus, PutRequest, PutResponse,
};
