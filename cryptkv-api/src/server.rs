//! Server lifecycle: logging, storage open/close, serve until shutdown.

use crate::config::{BackendKind, LogFormat, ServerConfig};
use crate::service::build_router;

use cryptkv_store::{
    AuditAction, AuditEvent, AuditSinkSync, FileAuditSink, FileBackend, InMemoryBackend,
    IndexEngine, StorageBackend, StoreError, TracingAuditSink,
};
use std::future::Future;
use std::sync::Arc;

pub const AUDIT_LOG_FILE: &str = "audit.jsonl";

pub fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cryptkv_api=info,cryptkv_store=info,tower_http=info".into());
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }
}

/// Open and initialize the configured backend with its audit sink.
///
/// The file backend appends audit events next to its buckets; the memory
/// backend sends them to the log.
pub fn open_storage(
    config: &ServerConfig,
) -> Result<(Arc<dyn StorageBackend>, Arc<dyn AuditSinkSync>), StoreError> {
    let (storage, audit): (Arc<dyn StorageBackend>, Arc<dyn AuditSinkSync>) = match config.backend {
        BackendKind::File => (
            Arc::new(FileBackend::new(&config.data_dir)),
            Arc::new(FileAuditSink::new(config.data_dir.join(AUDIT_LOG_FILE))),
        ),
        BackendKind::Memory => (Arc::new(InMemoryBackend::new()), Arc::new(TracingAuditSink)),
    };
    storage.init()?;
    audit.record(
        AuditEvent::system_event(AuditAction::StorageOpened)
            .with_detail(format!("{:?}", config.backend)),
    );
    Ok((storage, audit))
}

/// Serve until `shutdown` resolves, then close storage.
///
/// In-flight requests finish before storage is closed.
pub async fn run(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let (storage, audit) = open_storage(&config)?;
    let engine = IndexEngine::new(storage.clone(), audit.clone());
    let app = build_router(engine, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        backend = ?config.backend,
        data_dir = %config.data_dir.display(),
        timeout_ms = config.request_timeout.as_millis() as u64,
        "starting CryptKV server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    storage.close();
    audit.record(AuditEvent::system_event(AuditAction::StorageClosed));
    tracing::info!("storage closed");
    served?;
    Ok(())
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => tracing::error!(error = %e, "cannot listen for shutdown signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptkv_store::Bucket;

    #[test]
    fn file_backend_opens_under_data_dir_with_audit_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_dir: dir.path().join("data"),
            ..ServerConfig::default()
        };

        let (storage, _audit) = open_storage(&config).unwrap();
        storage.put(Bucket::Documents, b"k", b"v").unwrap();
        assert_eq!(storage.get(Bucket::Documents, b"k").unwrap(), Some(b"v".to_vec()));

        let log = std::fs::read_to_string(config.data_dir.join(AUDIT_LOG_FILE)).unwrap();
        assert!(log.contains("StorageOpened"));

        storage.close();
        assert_eq!(storage.get(Bucket::Documents, b"k"), Err(StoreError::Closed));
    }

    #[test]
    fn memory_backend_opens() {
        let config = ServerConfig {
            backend: BackendKind::Memory,
            ..ServerConfig::default()
        };
        let (storage, _) = open_storage(&config).unwrap();
        assert_eq!(storage.get(Bucket::Index, b"absent").unwrap(), None);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_and_closes_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            addr: "127.0.0.1:0".parse().unwrap(),
            data_dir: dir.path().to_path_buf(),
            ..ServerConfig::default()
        };

        run(config, async {}).await.unwrap();

        let log = std::fs::read_to_string(dir.path().join(AUDIT_LOG_FILE)).unwrap();
        assert!(log.contains("StorageOpened"));
        assert!(log.contains("StorageClosed"));
    }
}
