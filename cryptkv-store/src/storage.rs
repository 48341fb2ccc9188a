//! Storage backends: the bucketed key-value store the index protocol runs on.

use crate::error::StoreError;
use crate::types::Bucket;

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Bucketed byte-string store with atomic single-key operations.
///
/// Implement this for your infrastructure:
/// - InMemoryBackend (testing)
/// - FileBackend (single node)
/// - Your embedded database (production)
///
/// `delete` of an absent key succeeds. After `close`, every call returns
/// [`StoreError::Closed`] until `init` is called again.
pub trait StorageBackend: Send + Sync {
    fn init(&self) -> Result<(), StoreError>;
    fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn delete(&self, bucket: Bucket, key: &[u8]) -> Result<(), StoreError>;
    fn close(&self);
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

type BucketMap = HashMap<Vec<u8>, Vec<u8>>;

/// In-memory storage (for testing and ephemeral use).
pub struct InMemoryBackend {
    buckets: RwLock<HashMap<Bucket, BucketMap>>,
    closed: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(Bucket::ALL.iter().map(|b| (*b, BucketMap::new())).collect()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of keys currently held in `bucket`.
    pub fn len(&self, bucket: Bucket) -> usize {
        self.buckets
            .read()
            .map(|b| b.get(&bucket).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, bucket: Bucket) -> bool {
        self.len(bucket) == 0
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn init(&self) -> Result<(), StoreError> {
        let mut buckets = self.buckets.write().map_err(|_| StoreError::Poisoned)?;
        for bucket in Bucket::ALL {
            buckets.entry(bucket).or_default();
        }
        self.closed.store(false, Ordering::Release);
        Ok(())
    }

    fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_open()?;
        let buckets = self.buckets.read().map_err(|_| StoreError::Poisoned)?;
        Ok(buckets.get(&bucket).and_then(|b| b.get(key)).cloned())
    }

    fn put(&self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_open()?;
        let mut buckets = self.buckets.write().map_err(|_| StoreError::Poisoned)?;
        buckets
            .entry(bucket)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, bucket: Bucket, key: &[u8]) -> Result<(), StoreError> {
        self.check_open()?;
        let mut buckets = self.buckets.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(b) = buckets.get_mut(&bucket) {
            b.remove(key);
        }
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// File-based storage (one file per key).
///
/// Directory layout:
/// ```text
/// root/
///   documents/
///     {sha256(key)}
///   index/
///     {sha256(key)}
/// ```
///
/// File names are hashed so arbitrary byte keys map to fixed-length names.
pub struct FileBackend {
    root: PathBuf,
    closed: AtomicBool,
    tmp_seq: AtomicU64,
}

impl FileBackend {
    /// Create a backend rooted at `root`. Directories are created by `init`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            closed: AtomicBool::new(false),
            tmp_seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.root.join(bucket.as_str())
    }

    fn key_path(&self, bucket: Bucket, key: &[u8]) -> PathBuf {
        self.bucket_dir(bucket).join(hex::encode(Sha256::digest(key)))
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn init(&self) -> Result<(), StoreError> {
        for bucket in Bucket::ALL {
            std::fs::create_dir_all(self.bucket_dir(bucket))
                .map_err(|e| StoreError::io(bucket, format!("create dir: {}", e)))?;
        }
        self.closed.store(false, Ordering::Release);
        Ok(())
    }

    fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_open()?;
        match std::fs::read(self.key_path(bucket, key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(bucket, format!("read: {}", e))),
        }
    }

    fn put(&self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_open()?;
        let path = self.key_path(bucket, key);
        // Atomic write: write to a unique temp file, then rename over the target
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.tmp", seq));
        std::fs::write(&tmp, value)
            .map_err(|e| StoreError::io(bucket, format!("write: {}", e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| StoreError::io(bucket, format!("rename: {}", e)))?;
        Ok(())
    }

    fn delete(&self, bucket: Bucket, key: &[u8]) -> Result<(), StoreError> {
        self.check_open()?;
        match std::fs::remove_file(self.key_path(bucket, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(bucket, format!("delete: {}", e))),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
