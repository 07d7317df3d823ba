#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use teamboard::error::AppError;
use teamboard::services::FileUpload;
use teamboard::store::{BlobRef, RemoteStore, SelectQuery, SqliteStore};

/// In-memory store that can be told to fail each kind of call, and counts
/// every call it receives.
pub struct FlakyStore {
    inner: SqliteStore,
    pub fail_select: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_upload: AtomicBool,
    /// Answer selects for this parent id fail while the rest succeed.
    pub fail_children_of: std::sync::Mutex<Option<String>>,
    pub selects: AtomicUsize,
    pub inserts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub uploads: AtomicUsize,
    select_delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FlakyStore {
    pub async fn new() -> Arc<Self> {
        Self::with_select_delay(Duration::ZERO).await
    }

    pub async fn with_select_delay(select_delay: Duration) -> Arc<Self> {
        let inner = SqliteStore::in_memory().await.expect("in-memory store");
        Arc::new(Self {
            inner,
            fail_select: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_upload: AtomicBool::new(false),
            fail_children_of: std::sync::Mutex::new(None),
            selects: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
            select_delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn reset_counts(&self) {
        for counter in [&self.selects, &self.inserts, &self.deletes, &self.uploads] {
            counter.store(0, Ordering::SeqCst);
        }
        self.max_in_flight.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, AppError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.select_delay.is_zero() {
            tokio::time::sleep(self.select_delay).await;
        }

        let failing_parent = self.fail_children_of.lock().expect("lock").clone();
        let result = match (&query.filter, failing_parent) {
            _ if self.fail_select.load(Ordering::SeqCst) => {
                Err(AppError::Read("select refused".to_string()))
            }
            (Some((_, parent)), Some(failing)) if *parent == failing => {
                Err(AppError::Read(format!("children of {} refused", parent)))
            }
            _ => self.inner.select(query).await,
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<Value, AppError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(AppError::Write("insert refused".to_string()));
        }
        self.inner.insert(collection, record).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::Write("delete refused".to_string()));
        }
        self.inner.delete(collection, id).await
    }

    async fn upload_blob(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<BlobRef, AppError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(AppError::Upload("bucket refused".to_string()));
        }
        self.inner.upload_blob(bucket, path, bytes, content_type).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.inner.public_url(bucket, path)
    }
}

pub fn upload(file_name: &str, bytes: &[u8]) -> FileUpload {
    FileUpload {
        file_name: file_name.to_string(),
        bytes: bytes.to_vec(),
        content_type: None,
    }
}
