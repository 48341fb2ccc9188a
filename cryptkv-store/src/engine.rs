//! Index protocol engine: put / get / delete over the `documents` and
//! `index` buckets.
//!
//! Invariants kept by every sequence:
//! - a present index entry opens to a document key whose record exists;
//! - a label is bound to at most one document, and a rebinding deletes the
//!   old document before writing the new one.
//!
//! The index entry is always written last on put and removed last on delete,
//! so an interrupted sequence leaves at worst an entry whose document is
//! gone, which a later get reports as `DocumentMissing`.

use crate::audit::{AuditAction, AuditEvent, AuditSinkSync};
use crate::error::{DeleteError, GetMiss, PutError};
use crate::locks::LabelLocks;
use crate::storage::StorageBackend;
use crate::types::{Bucket, Document, PutOutcome};

use cryptkv::{blind_label, open_entry, seal_entry, BlindLabel, EncryptKey, IndexKey};
use std::sync::Arc;

pub struct IndexEngine {
    storage: Arc<dyn StorageBackend>,
    audit: Arc<dyn AuditSinkSync>,
    locks: LabelLocks,
}

impl IndexEngine {
    /// Create an engine over an initialized storage backend.
    pub fn new(storage: Arc<dyn StorageBackend>, audit: Arc<dyn AuditSinkSync>) -> Self {
        Self {
            storage,
            audit,
            locks: LabelLocks::new(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Labels with an operation currently in flight.
    pub fn labels_in_flight(&self) -> usize {
        self.locks.active()
    }

    // -----------------------------------------------------------------------
    // Put
    // -----------------------------------------------------------------------

    /// Bind `document_key` (with its value) to the keyword behind `index_key`,
    /// replacing and deleting any document previously bound to it.
    pub async fn put(
        &self,
        index_key: &IndexKey,
        encrypt_key: &EncryptKey,
        document_key: &[u8],
        document_value: &[u8],
    ) -> Result<PutOutcome, PutError> {
        let label = blind_label(index_key);
        let _guard = self.locks.lock(label).await;
        // No await points past this line: once started, the sequence runs to completion.

        let sealed = seal_entry(encrypt_key, &label, document_key)
            .map_err(|_| self.put_failed(&label, PutError::SealFailed))?;

        let existing = self
            .storage
            .get(Bucket::Index, label.as_bytes())
            .map_err(|e| self.put_failed(&label, PutError::LookupFailed(e)))?;

        let outcome = match existing {
            Some(entry) => {
                let old_key = open_entry(encrypt_key, &label, &entry)
                    .map_err(|_| self.put_failed(&label, PutError::DecryptFailed))?;
                self.storage
                    .delete(Bucket::Documents, &old_key)
                    .map_err(|e| self.put_failed(&label, PutError::DeleteOldFailed(e)))?;
                PutOutcome::Replaced
            }
            None => PutOutcome::Created,
        };

        self.storage
            .put(Bucket::Documents, document_key, document_value)
            .map_err(|e| self.put_failed(&label, PutError::WriteFailed(e)))?;

        self.storage
            .put(Bucket::Index, label.as_bytes(), &sealed)
            .map_err(|e| self.put_failed(&label, PutError::IndexWriteFailed(e)))?;

        let action = match outcome {
            PutOutcome::Created => AuditAction::BindingCreated,
            PutOutcome::Replaced => AuditAction::BindingReplaced,
        };
        tracing::debug!(label = %label, outcome = %outcome, "put");
        self.audit.record(AuditEvent::label_event(&label, action));
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Get
    // -----------------------------------------------------------------------

    /// Look up the document bound to the keyword behind `index_key`.
    pub async fn get(
        &self,
        index_key: &IndexKey,
        encrypt_key: &EncryptKey,
    ) -> Result<Document, GetMiss> {
        let label = blind_label(index_key);
        let _guard = self.locks.lock(label).await;

        let entry = match self.storage.get(Bucket::Index, label.as_bytes()) {
            Ok(Some(entry)) => entry,
            Ok(None) => return Err(self.get_missed(&label, GetMiss::NoIndex)),
            Err(e) => return Err(self.get_missed(&label, GetMiss::LookupFailed(e))),
        };

        let key = open_entry(encrypt_key, &label, &entry)
            .map_err(|_| self.get_missed(&label, GetMiss::DecryptFailed))?;

        let value = match self.storage.get(Bucket::Documents, &key) {
            Ok(Some(value)) => value,
            Ok(None) => return Err(self.get_missed(&label, GetMiss::DocumentMissing)),
            Err(e) => return Err(self.get_missed(&label, GetMiss::DocumentLookupFailed(e))),
        };

        tracing::debug!(label = %label, "get: hit");
        self.audit
            .record(AuditEvent::label_event(&label, AuditAction::LookupHit));
        Ok(Document { key, value })
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Remove the keyword's binding and the document it points at.
    pub async fn delete(
        &self,
        index_key: &IndexKey,
        encrypt_key: &EncryptKey,
    ) -> Result<(), DeleteError> {
        let label = blind_label(index_key);
        let _guard = self.locks.lock(label).await;

        let entry = match self.storage.get(Bucket::Index, label.as_bytes()) {
            Ok(Some(entry)) => entry,
            Ok(None) => return Err(self.delete_failed(&label, DeleteError::NoIndex)),
            Err(e) => return Err(self.delete_failed(&label, DeleteError::LookupFailed(e))),
        };

        let key = open_entry(encrypt_key, &label, &entry)
            .map_err(|_| self.delete_failed(&label, DeleteError::DecryptFailed))?;

        self.storage
            .delete(Bucket::Documents, &key)
            .map_err(|e| self.delete_failed(&label, DeleteError::DocumentDeleteFailed(e)))?;

        self.storage
            .delete(Bucket::Index, label.as_bytes())
            .map_err(|e| self.delete_failed(&label, DeleteError::IndexDeleteFailed(e)))?;

        tracing::debug!(label = %label, "delete");
        self.audit
            .record(AuditEvent::label_event(&label, AuditAction::BindingRemoved));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Failure reporting
    // -----------------------------------------------------------------------

    fn put_failed(&self, label: &BlindLabel, err: PutError) -> PutError {
        match err.storage_error() {
            Some(e) => tracing::error!(label = %label, stage = err.stage(), error = %e, "put failed"),
            None => tracing::info!(label = %label, stage = err.stage(), "put rejected"),
        }
        self.audit.record(
            AuditEvent::label_event(label, AuditAction::PutFailed { stage: err.stage().into() })
                .with_failure(),
        );
        err
    }

    fn get_missed(&self, label: &BlindLabel, miss: GetMiss) -> GetMiss {
        let action = match &miss {
            GetMiss::DocumentMissing => {
                tracing::warn!(label = %label, "index entry points at a missing document");
                AuditAction::ConsistencyViolation
            }
            GetMiss::LookupFailed(e) | GetMiss::DocumentLookupFailed(e) => {
                tracing::error!(label = %label, stage = miss.stage(), error = %e, "get: storage error");
                AuditAction::LookupMiss { stage: miss.stage().into() }
            }
            GetMiss::NoIndex | GetMiss::DecryptFailed => {
                tracing::debug!(label = %label, stage = miss.stage(), "get: miss");
                AuditAction::LookupMiss { stage: miss.stage().into() }
            }
        };
        self.audit
            .record(AuditEvent::label_event(label, action).with_failure());
        miss
    }

    fn delete_failed(&self, label: &BlindLabel, err: DeleteError) -> DeleteError {
        match &err {
            DeleteError::NoIndex | DeleteError::DecryptFailed => {
                tracing::debug!(label = %label, stage = err.stage(), "delete: not found");
            }
            _ => tracing::error!(label = %label, error = %err, "delete failed"),
        }
        self.audit.record(
            AuditEvent::label_event(label, AuditAction::DeleteFailed { stage: err.stage().into() })
                .with_failure(),
        );
        err
    }
}
