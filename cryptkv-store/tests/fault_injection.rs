//! Storage faults at each protocol stage, and what state they leave behind.

use cryptkv::{blind_label, derive_master_secret, derive_subkeys, Keyword, SubkeyPair};
use cryptkv_store::{
    Bucket, DeleteError, GetMiss, InMemoryAuditSink, InMemoryBackend, IndexEngine, PutError,
    StorageBackend, StoreError,
};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Get,
    Put,
    Delete,
}

/// Wraps an in-memory backend and fails the first call matching `fail_on`.
struct FaultyBackend {
    inner: InMemoryBackend,
    fail_on: Mutex<Option<(Op, Bucket)>>,
    log: Mutex<Vec<(Op, Bucket)>>,
}

impl FaultyBackend {
    fn new() -> Self {
        let inner = InMemoryBackend::new();
        inner.init().unwrap();
        Self {
            inner,
            fail_on: Mutex::new(None),
            log: Mutex::new(Vec::new()),
        }
    }

    fn fail_next(&self, op: Op, bucket: Bucket) {
        *self.fail_on.lock().unwrap() = Some((op, bucket));
    }

    fn take_log(&self) -> Vec<(Op, Bucket)> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    fn check(&self, op: Op, bucket: Bucket) -> Result<(), StoreError> {
        self.log.lock().unwrap().push((op, bucket));
        let mut fail_on = self.fail_on.lock().unwrap();
        if *fail_on == Some((op, bucket)) {
            *fail_on = None;
            return Err(StoreError::io(bucket, "injected fault"));
        }
        Ok(())
    }
}

impl StorageBackend for FaultyBackend {
    fn init(&self) -> Result<(), StoreError> {
        self.inner.init()
    }

    fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.check(Op::Get, bucket)?;
        self.inner.get(bucket, key)
    }

    fn put(&self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check(Op::Put, bucket)?;
        self.inner.put(bucket, key, value)
    }

    fn delete(&self, bucket: Bucket, key: &[u8]) -> Result<(), StoreError> {
        self.check(Op::Delete, bucket)?;
        self.inner.delete(bucket, key)
    }

    fn close(&self) {
        self.inner.close()
    }
}

fn keys(keyword: &str) -> SubkeyPair {
    let master = derive_master_secret(b"faults", b"salt", 4);
    derive_subkeys(&Keyword::from(keyword), &master)
}

fn setup() -> (IndexEngine, Arc<FaultyBackend>) {
    let storage = Arc::new(FaultyBackend::new());
    let engine = IndexEngine::new(storage.clone(), Arc::new(InMemoryAuditSink::new()));
    (engine, storage)
}

fn injected(bucket: Bucket) -> StoreError {
    StoreError::io(bucket, "injected fault")
}

#[tokio::test]
async fn put_issues_storage_calls_in_protocol_order() {
    let (engine, storage) = setup();
    let k = keys("order");

    engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap();
    assert_eq!(
        storage.take_log(),
        vec![(Op::Get, Bucket::Index), (Op::Put, Bucket::Documents), (Op::Put, Bucket::Index)]
    );

    engine.put(&k.index_key, &k.encrypt_key, b"b", b"2").await.unwrap();
    assert_eq!(
        storage.take_log(),
        vec![
            (Op::Get, Bucket::Index),
            (Op::Delete, Bucket::Documents),
            (Op::Put, Bucket::Documents),
            (Op::Put, Bucket::Index),
        ]
    );
}

#[tokio::test]
async fn delete_removes_document_before_entry() {
    let (engine, storage) = setup();
    let k = keys("order");
    engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap();
    storage.take_log();

    engine.delete(&k.index_key, &k.encrypt_key).await.unwrap();
    assert_eq!(
        storage.take_log(),
        vec![(Op::Get, Bucket::Index), (Op::Delete, Bucket::Documents), (Op::Delete, Bucket::Index)]
    );
}

#[tokio::test]
async fn put_lookup_fault() {
    let (engine, storage) = setup();
    let k = keys("lookup");
    storage.fail_next(Op::Get, Bucket::Index);

    let err = engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap_err();
    assert_eq!(err, PutError::LookupFailed(injected(Bucket::Index)));
    assert!(storage.inner.is_empty(Bucket::Documents));
}

#[tokio::test]
async fn put_delete_old_fault_keeps_old_binding() {
    let (engine, storage) = setup();
    let k = keys("old");
    engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap();
    storage.fail_next(Op::Delete, Bucket::Documents);

    let err = engine.put(&k.index_key, &k.encrypt_key, b"b", b"2").await.unwrap_err();
    assert_eq!(err, PutError::DeleteOldFailed(injected(Bucket::Documents)));

    let doc = engine.get(&k.index_key, &k.encrypt_key).await.unwrap();
    assert_eq!(doc.key, b"a");
    assert_eq!(storage.inner.get(Bucket::Documents, b"b").unwrap(), None);
}

#[tokio::test]
async fn put_write_fault_after_old_delete_is_detectable() {
    let (engine, storage) = setup();
    let k = keys("write");
    engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap();
    storage.fail_next(Op::Put, Bucket::Documents);

    let err = engine.put(&k.index_key, &k.encrypt_key, b"b", b"2").await.unwrap_err();
    assert_eq!(err, PutError::WriteFailed(injected(Bucket::Documents)));

    // Old document is gone, entry still names it: surfaced as a miss, never a stale hit
    let miss = engine.get(&k.index_key, &k.encrypt_key).await.unwrap_err();
    assert_eq!(miss, GetMiss::DocumentMissing);

    // Retrying the same put converges
    engine.put(&k.index_key, &k.encrypt_key, b"b", b"2").await.unwrap();
    assert_eq!(engine.get(&k.index_key, &k.encrypt_key).await.unwrap().value, b"2");
}

#[tokio::test]
async fn put_index_write_fault_never_points_at_new_document() {
    let (engine, storage) = setup();
    let k = keys("index");
    storage.fail_next(Op::Put, Bucket::Index);

    let err = engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap_err();
    assert_eq!(err, PutError::IndexWriteFailed(injected(Bucket::Index)));

    let label = blind_label(&k.index_key);
    assert_eq!(storage.inner.get(Bucket::Index, label.as_bytes()).unwrap(), None);
    assert_eq!(engine.get(&k.index_key, &k.encrypt_key).await, Err(GetMiss::NoIndex));

    engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap();
    assert_eq!(engine.get(&k.index_key, &k.encrypt_key).await.unwrap().key, b"a");
}

#[tokio::test]
async fn get_document_lookup_fault() {
    let (engine, storage) = setup();
    let k = keys("doc-lookup");
    engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap();
    storage.fail_next(Op::Get, Bucket::Documents);

    let miss = engine.get(&k.index_key, &k.encrypt_key).await.unwrap_err();
    assert_eq!(miss, GetMiss::DocumentLookupFailed(injected(Bucket::Documents)));
}

#[tokio::test]
async fn delete_document_fault_keeps_binding() {
    let (engine, storage) = setup();
    let k = keys("del-doc");
    engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap();
    storage.fail_next(Op::Delete, Bucket::Documents);

    let err = engine.delete(&k.index_key, &k.encrypt_key).await.unwrap_err();
    assert_eq!(err, DeleteError::DocumentDeleteFailed(injected(Bucket::Documents)));
    assert!(!err.is_not_found());
    assert!(engine.get(&k.index_key, &k.encrypt_key).await.is_ok());
}

#[tokio::test]
async fn delete_index_fault_then_retry() {
    let (engine, storage) = setup();
    let k = keys("del-index");
    engine.put(&k.index_key, &k.encrypt_key, b"a", b"1").await.unwrap();
    storage.fail_next(Op::Delete, Bucket::Index);

    let err = engine.delete(&k.index_key, &k.encrypt_key).await.unwrap_err();
    assert_eq!(err, DeleteError::IndexDeleteFailed(injected(Bucket::Index)));
    assert_eq!(
        engine.get(&k.index_key, &k.encrypt_key).await,
        Err(GetMiss::DocumentMissing)
    );

    // Document already gone; the retry finishes the job
    engine.delete(&k.index_key, &k.encrypt_key).await.unwrap();
    assert_eq!(engine.get(&k.index_key, &k.encrypt_key).await, Err(GetMiss::NoIndex));
}
