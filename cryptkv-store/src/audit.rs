//! Audit logging: every index operation emits a structured event.
//!
//! Events carry the blind label (already visible to storage) and never the
//! document key, document value or any subkey.

use chrono::{DateTime, Utc};
use cryptkv::BlindLabel;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

// ---------------------------------------------------------------------------
// Audit events
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    BindingCreated,
    BindingReplaced,
    BindingRemoved,
    LookupHit,
    LookupMiss { stage: String },
    /// An index entry names a document that does not exist.
    ConsistencyViolation,
    PutFailed { stage: String },
    DeleteFailed { stage: String },
    StorageOpened,
    StorageClosed,
}

/// A structured audit event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Hex blind label involved, if any.
    pub label: Option<String>,
    /// What happened.
    pub action: AuditAction,
    /// Success or failure.
    pub success: bool,
    /// Additional context.
    pub detail: Option<String>,
}

impl AuditEvent {
    /// Event for an operation on one label.
    pub fn label_event(label: &BlindLabel, action: AuditAction) -> Self {
        Self {
            timestamp: Utc::now(),
            label: Some(label.to_hex()),
            action,
            success: true,
            detail: None,
        }
    }

    /// System-level event (no specific label).
    pub fn system_event(action: AuditAction) -> Self {
        Self {
            timestamp: Utc::now(),
            label: None,
            action,
            success: true,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.success = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Audit sink trait
// ---------------------------------------------------------------------------

/// Where audit events go. Implement this for your SIEM/log system.
///
/// Synchronous so it can be called while a label lock is held without
/// introducing an await point.
pub trait AuditSinkSync: Send + Sync {
    fn record(&self, event: AuditEvent);
}

// ---------------------------------------------------------------------------
// Built-in sinks
// ---------------------------------------------------------------------------

/// Logs events via the `tracing` crate.
pub struct TracingAuditSink;

impl AuditSinkSync for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            timestamp = %event.timestamp,
            label = ?event.label,
            action = ?event.action,
            success = event.success,
            detail = ?event.detail,
            "audit"
        );
    }
}

/// Collects events in memory (for tests).
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.events().into_iter().map(|e| e.action).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSinkSync for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Writes JSON events to a file (append-only, one event per line).
pub struct FileAuditSink {
    path: std::path::PathBuf,
    // Serializes appends so lines from concurrent requests never interleave.
    write_lock: Mutex<()>,
}

impl FileAuditSink {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl AuditSinkSync for FileAuditSink {
    fn record(&self, event: AuditEvent) {
        use std::io::Write;

        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "audit: serialize failed");
                return;
            }
        };

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", json) {
                    tracing::error!(path = ?self.path, error = %e, "audit: write failed");
                }
            }
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "audit: cannot open log");
            }
        }
    }
}
