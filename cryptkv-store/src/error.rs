//! Error types for storage and the index engine.

use crate::types::Bucket;
use std::fmt;

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend was closed.
    Closed,
    /// Underlying I/O failed.
    Io { bucket: Bucket, msg: String },
    /// Internal lock poisoned by a panicking writer.
    Poisoned,
}

impl StoreError {
    pub fn io(bucket: Bucket, msg: impl Into<String>) -> Self {
        Self::Io { bucket, msg: msg.into() }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "storage closed"),
            Self::Io { bucket, msg } => write!(f, "storage error in {}: {}", bucket, msg),
            Self::Poisoned => write!(f, "storage lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Per-operation engine errors
// ---------------------------------------------------------------------------

/// Why a put did not complete. Variants are in protocol order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutError {
    /// Reading the existing index entry failed.
    LookupFailed(StoreError),
    /// The existing entry did not open under the supplied key. Nothing was changed.
    DecryptFailed,
    /// Deleting the previously bound document failed.
    DeleteOldFailed(StoreError),
    /// Writing the new document failed.
    WriteFailed(StoreError),
    /// Sealing the new entry failed. Nothing was changed.
    SealFailed,
    /// Writing the new index entry failed.
    IndexWriteFailed(StoreError),
}

impl PutError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::LookupFailed(_) => "lookup",
            Self::DecryptFailed => "decrypt",
            Self::DeleteOldFailed(_) => "delete-old",
            Self::WriteFailed(_) => "write",
            Self::SealFailed => "seal",
            Self::IndexWriteFailed(_) => "index-write",
        }
    }

    pub fn storage_error(&self) -> Option<&StoreError> {
        match self {
            Self::LookupFailed(e)
            | Self::DeleteOldFailed(e)
            | Self::WriteFailed(e)
            | Self::IndexWriteFailed(e) => Some(e),
            Self::DecryptFailed | Self::SealFailed => None,
        }
    }
}

impl fmt::Display for PutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.storage_error() {
            Some(e) => write!(f, "put failed at {}: {}", self.stage(), e),
            None => write!(f, "put failed at {}", self.stage()),
        }
    }
}

impl std::error::Error for PutError {}

/// Why a get found nothing. Every variant reads as "not found" to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetMiss {
    /// No entry at the label.
    NoIndex,
    /// Reading the entry failed.
    LookupFailed(StoreError),
    /// The entry did not open under the supplied key.
    DecryptFailed,
    /// The entry names a document that does not exist.
    DocumentMissing,
    /// Reading the named document failed.
    DocumentLookupFailed(StoreError),
}

impl GetMiss {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::NoIndex => "no-index",
            Self::LookupFailed(_) => "lookup",
            Self::DecryptFailed => "decrypt",
            Self::DocumentMissing => "document-missing",
            Self::DocumentLookupFailed(_) => "document-lookup",
        }
    }

    /// Whether this miss means the index and document store disagree.
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, Self::DocumentMissing)
    }
}

impl fmt::Display for GetMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookupFailed(e) | Self::DocumentLookupFailed(e) => {
                write!(f, "not found ({}): {}", self.stage(), e)
            }
            _ => write!(f, "not found ({})", self.stage()),
        }
    }
}

impl std::error::Error for GetMiss {}

/// Why a delete did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteError {
    /// No entry at the label. Not fatal.
    NoIndex,
    /// Reading the entry failed.
    LookupFailed(StoreError),
    /// The entry did not open under the supplied key. Nothing was changed.
    DecryptFailed,
    /// Deleting the bound document failed.
    DocumentDeleteFailed(StoreError),
    /// Deleting the index entry failed.
    IndexDeleteFailed(StoreError),
}

impl DeleteError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::NoIndex => "no-index",
            Self::LookupFailed(_) => "lookup",
            Self::DecryptFailed => "decrypt",
            Self::DocumentDeleteFailed(_) => "document-delete",
            Self::IndexDeleteFailed(_) => "index-delete",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoIndex | Self::DecryptFailed)
    }
}

impl fmt::Display for DeleteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookupFailed(e) | Self::DocumentDeleteFailed(e) | Self::IndexDeleteFailed(e) => {
                write!(f, "delete failed at {}: {}", self.stage(), e)
            }
            _ => write!(f, "delete failed at {}", self.stage()),
        }
    }
}

impl std::error::Error for DeleteError {}
