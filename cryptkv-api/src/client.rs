//! Client query builder.
//!
//! Holds the master secret, derives per-keyword subkeys locally and sends
//! only those to the service. Keywords and the master secret never leave
//! the client.

use crate::config::ClientConfig;
use crate::wire::{
    DeleteRequest, DeleteResponse, GetRequest, GetResponse, PutRequest, PutResponse, DELETE_PATH,
    GET_PATH, PUT_PATH,
};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::Router;
use cryptkv::{derive_subkeys, Keyword, MasterSecret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tower::ServiceExt;

/// Largest response body the in-process transport will buffer.
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No response within the configured deadline.
    Timeout(Duration),
    /// Request could not be built or serialized.
    Encode(String),
    /// Response body could not be read or parsed.
    Decode(String),
    /// Service answered with a non-success HTTP status.
    Status { status: u16, body: String },
    /// Underlying transport failed.
    Transport(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Timeout(d) => write!(f, "request timed out after {:?}", d),
            ClientError::Encode(msg) => write!(f, "encode request: {}", msg),
            ClientError::Decode(msg) => write!(f, "decode response: {}", msg),
            ClientError::Status { status, body } => write!(f, "service returned {}: {}", status, body),
            ClientError::Transport(msg) => write!(f, "transport: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Carries one JSON request to the service and returns its JSON response.
pub trait Transport: Send + Sync {
    fn call<Req, Resp>(
        &self,
        path: &'static str,
        request: &Req,
    ) -> impl Future<Output = Result<Resp, ClientError>> + Send
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send;
}

/// Drives a service router in-process.
#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

impl Transport for RouterTransport {
    async fn call<Req, Resp>(&self, path: &'static str, request: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send,
    {
        let body = serde_json::to_vec(request).map_err(|e| ClientError::Encode(e.to_string()))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|e| ClientError::Encode(e.to_string()))?;

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct CryptKvClient<T> {
    transport: T,
    master: MasterSecret,
    request_timeout: Duration,
}

impl<T: Transport> CryptKvClient<T> {
    /// Derive the master secret from `config` and bind it to a transport.
    pub fn connect(transport: T, config: &ClientConfig) -> Self {
        Self::with_master_secret(transport, config.master_secret(), config.request_timeout)
    }

    pub fn with_master_secret(transport: T, master: MasterSecret, request_timeout: Duration) -> Self {
        Self {
            transport,
            master,
            request_timeout,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Bind `document_key` to `keyword`, replacing any previous binding.
    pub async fn put(
        &self,
        keyword: impl Into<Keyword>,
        document_key: &str,
        document_value: &str,
    ) -> Result<PutResponse, ClientError> {
        let (index_key, encrypt_key) = self.wire_keys(&keyword.into());
        let request = PutRequest {
            document_key: document_key.to_string(),
            document_value: document_value.to_string(),
            index_key,
            encrypt_key,
        };
        self.send(PUT_PATH, &request).await
    }

    pub async fn get(&self, keyword: impl Into<Keyword>) -> Result<GetResponse, ClientError> {
        let (index_key, encrypt_key) = self.wire_keys(&keyword.into());
        self.send(GET_PATH, &GetRequest { index_key, encrypt_key }).await
    }

    pub async fn delete(&self, keyword: impl Into<Keyword>) -> Result<DeleteResponse, ClientError> {
        let (index_key, encrypt_key) = self.wire_keys(&keyword.into());
        self.send(DELETE_PATH, &DeleteRequest { index_key, encrypt_key })
            .await
    }

    /// Release the transport. The master secret is wiped on drop.
    pub fn close(self) -> T {
        self.transport
    }

    fn wire_keys(&self, keyword: &Keyword) -> (String, String) {
        let pair = derive_subkeys(keyword, &self.master);
        (pair.index_key.to_hex(), pair.encrypt_key.to_hex())
    }

    async fn send<Req, Resp>(&self, path: &'static str, request: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send,
    {
        match tokio::time::timeout(self.request_timeout, self.transport.call(path, request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(path, timeout = ?self.request_timeout, "request timed out");
                Err(ClientError::Timeout(self.request_timeout))
            }
        }
    }
}
