//! Per-label mutual exclusion.
//!
//! Put and delete touch both buckets in several separate storage calls. Two
//! sequences on the same label must not interleave, so each label gets its
//! own async mutex for the duration of the sequence. Distinct labels never
//! contend.

use cryptkv::BlindLabel;

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table size at which dead slots are swept on the next insert.
const PRUNE_THRESHOLD: usize = 1024;

/// Holds a label's lock until dropped.
pub struct LabelGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Lock table keyed by blind label.
///
/// Slots are held weakly: a label's mutex lives exactly as long as someone
/// holds or awaits it.
#[derive(Default)]
pub struct LabelLocks {
    table: StdMutex<HashMap<BlindLabel, Weak<Mutex<()>>>>,
}

impl LabelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `label`.
    pub async fn lock(&self, label: BlindLabel) -> LabelGuard {
        let slot = self.slot(label);
        LabelGuard {
            _guard: slot.lock_owned().await,
        }
    }

    /// Number of labels currently locked or awaited.
    pub fn active(&self) -> usize {
        let table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.values().filter(|w| w.strong_count() > 0).count()
    }

    fn slot(&self, label: BlindLabel) -> Arc<Mutex<()>> {
        // The table lock is never held across an await.
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(live) = table.get(&label).and_then(Weak::upgrade) {
            return live;
        }
        if table.len() >= PRUNE_THRESHOLD {
            table.retain(|_, w| w.strong_count() > 0);
        }
        let slot = Arc::new(Mutex::new(()));
        table.insert(label, Arc::downgrade(&slot));
        slot
    }
}
