//! In-memory evidence stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use cleanstreet_core::{EvidenceError, EvidenceStore};
use tokio::sync::Mutex;

/// Evidence store that keeps bytes in a map.
///
/// References are `mem-<n>-<suggested name>`. Counts every call so tests
/// can assert that rollbacks and cascades happened.
#[derive(Debug, Default)]
pub struct MemoryEvidenceStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `reference` is currently stored.
    pub async fn contains(&self, reference: &str) -> bool {
        self.files.lock().await.contains_key(reference)
    }

    /// Bytes stored under `reference`.
    pub async fn get(&self, reference: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(reference).cloned()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.files.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Successful `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// `delete` calls so far, including deletes of missing references.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvidenceStore for MemoryEvidenceStore {
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<String, EvidenceError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = format!("mem-{}-{}", id, suggested_name);
        self.files.lock().await.insert(reference.clone(), bytes.to_vec());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<(), EvidenceError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.files.lock().await.remove(reference);
        Ok(())
    }
}

/// Store whose operations can be made to fail.
///
/// Wraps a [`MemoryEvidenceStore`] so successful writes stay observable.
#[derive(Debug, Default)]
pub struct FailingEvidenceStore {
    inner: MemoryEvidenceStore,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FailingEvidenceStore {
    /// A store that fails every `put`.
    pub fn failing_puts() -> Self {
        let store = Self::default();
        store.set_fail_puts(true);
        store
    }

    /// A store that fails every `delete`.
    pub fn failing_deletes() -> Self {
        let store = Self::default();
        store.set_fail_deletes(true);
        store
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// The backing memory store.
    pub fn inner(&self) -> &MemoryEvidenceStore {
        &self.inner
    }
}

#[async_trait]
impl EvidenceStore for FailingEvidenceStore {
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<String, EvidenceError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(EvidenceError::Backend("put disabled".to_string()));
        }
        self.inner.put(bytes, suggested_name).await
    }

    async fn delete(&self, reference: &str) -> Result<(), EvidenceError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(EvidenceError::Backend("delete disabled".to_string()));
        }
        self.inner.delete(reference).await
    }
}
