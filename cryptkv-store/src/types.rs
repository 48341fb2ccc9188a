//! Core types: Bucket, Document, PutOutcome, BindingState.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// The two buckets the index protocol reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Plaintext document key → document value.
    Documents,
    /// Blind label → sealed document key.
    Index,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Documents, Bucket::Index];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Documents => "documents",
            Bucket::Index => "index",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A document record as returned by a successful lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Binding state machine
// ---------------------------------------------------------------------------

/// Per-label binding state.
///
/// ```text
///            put                 put
/// UNBOUND ─────────→ BOUND(k) ─────────→ BOUND(k')
///    ↑                  │
///    └──────────────────┘
///           delete
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Bound,
}

/// What a successful put did to the label's binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PutOutcome {
    /// The label was unbound.
    Created,
    /// The label was bound; the previous document was deleted first.
    Replaced,
}

impl PutOutcome {
    /// State the label was in before the put.
    pub fn previous_state(&self) -> BindingState {
        match self {
            PutOutcome::Created => BindingState::Unbound,
            PutOutcome::Replaced => BindingState::Bound,
        }
    }
}

impl fmt::Display for PutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PutOutcome::Created => write!(f, "CREATED"),
            PutOutcome::Replaced => write!(f, "REPLACED"),
        }
    }
}
