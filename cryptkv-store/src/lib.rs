//! # CryptKV Store
//!
//! Encrypted keyword index over a bucketed key-value store.
//!
//! The engine receives only per-keyword subkeys, derives the blind label
//! itself, and keeps the `index` and `documents` buckets consistent across
//! put, overwrite and delete. Storage is pluggable.
//!
//! Built on top of `cryptkv` for the key schedule and entry sealing.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cryptkv::{derive_master_secret, derive_subkeys, Keyword};
//! use cryptkv_store::*;
//! use std::sync::Arc;
//!
//! let storage = Arc::new(InMemoryBackend::new());
//! storage.init().unwrap();
//! let engine = IndexEngine::new(storage, Arc::new(TracingAuditSink));
//!
//! let master = derive_master_secret(b"passphrase", b"salt", 4096);
//! let pair = derive_subkeys(&Keyword::from("invoice"), &master);
//!
//! engine.put(&pair.index_key, &pair.encrypt_key, b"doc-1", b"body").await.unwrap();
//! let doc = engine.get(&pair.index_key, &pair.encrypt_key).await.unwrap();
//! assert_eq!(doc.value, b"body");
//! ```

pub mod audit;
pub mod engine;
pub mod error;
pub mod locks;
pub mod storage;
pub mod types;

// Re-export main types for convenience
pub use audit::{AuditAction, AuditEvent, AuditSinkSync, FileAuditSink, InMemoryAuditSink, TracingAuditSink};
pub use engine::IndexEngine;
pub use error::{DeleteError, GetMiss, PutError, StoreError};
pub use locks::{LabelGuard, LabelLocks};
pub use storage::{FileBackend, InMemoryBackend, StorageBackend};
pub use types::{BindingState, Bucket, Document, PutOutcome};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
