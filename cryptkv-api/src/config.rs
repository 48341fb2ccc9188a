//! Server and client configuration.
//!
//! Server settings come from the environment:
//!
//! ```text
//!   CRYPTKV_ADDR                - Listen address (default: 127.0.0.1:50051)
//!   CRYPTKV_BACKEND             - "file" or "memory" (default: file)
//!   CRYPTKV_DATA_DIR            - Storage root for the file backend (default: ./cryptkv-data)
//!   CRYPTKV_REQUEST_TIMEOUT_MS  - Per-request deadline (default: 3000)
//!   CRYPTKV_LOG_FORMAT          - "json" for structured logging, "pretty" for dev
//! ```

use cryptkv::{derive_master_secret, MasterSecret, DEFAULT_ITERATIONS};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ADDR: &str = "127.0.0.1:50051";
pub const DEFAULT_DATA_DIR: &str = "./cryptkv-data";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { var, value } => write!(f, "invalid {}: {:?}", var, value),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let invalid = |var: &'static str, value: &str| ConfigError::Invalid {
            var,
            value: value.to_string(),
        };

        let addr_raw = lookup("CRYPTKV_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into());
        let addr = addr_raw
            .parse()
            .map_err(|_| invalid("CRYPTKV_ADDR", &addr_raw))?;

        let backend = match lookup("CRYPTKV_BACKEND").as_deref() {
            None | Some("file") => BackendKind::File,
            Some("memory") => BackendKind::Memory,
            Some(other) => return Err(invalid("CRYPTKV_BACKEND", other)),
        };

        let data_dir = lookup("CRYPTKV_DATA_DIR")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.into())
            .into();

        let request_timeout = match lookup("CRYPTKV_REQUEST_TIMEOUT_MS") {
            None => DEFAULT_REQUEST_TIMEOUT,
            Some(ms) => match ms.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(invalid("CRYPTKV_REQUEST_TIMEOUT_MS", &ms)),
            },
        };

        let log_format = match lookup("CRYPTKV_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            addr,
            backend,
            data_dir,
            request_timeout,
            log_format,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 50051)),
            backend: BackendKind::File,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            log_format: LogFormat::Pretty,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client-side key material inputs and call deadline.
#[derive(Clone)]
pub struct ClientConfig {
    pub passphrase: Vec<u8>,
    pub salt: Vec<u8>,
    pub iterations: u32,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(passphrase: impl Into<Vec<u8>>, salt: impl Into<Vec<u8>>) -> Self {
        Self {
            passphrase: passphrase.into(),
            salt: salt.into(),
            iterations: DEFAULT_ITERATIONS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn master_secret(&self) -> MasterSecret {
        derive_master_secret(&self.passphrase, &self.salt, self.iterations)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("passphrase", &"[REDACTED]")
            .field("salt_len", &self.salt.len())
            .field("iterations", &self.iterations)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
