pub mod dto;
pub mod sqlite;
pub mod supabase;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

pub use sqlite::SqliteStore;
pub use supabase::{StoreConfig, SupabaseHttpClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// A full-collection read: fixed sort, optional equality filter on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub collection: String,
    pub order_by: String,
    pub direction: Direction,
    pub filter: Option<(String, String)>,
}

impl SelectQuery {
    pub fn new(collection: &str, order_by: &str, direction: Direction) -> Self {
        Self {
            collection: collection.to_string(),
            order_by: order_by.to_string(),
            direction,
            filter: None,
        }
    }

    pub fn eq(mut self, field: &str, value: &str) -> Self {
        self.filter = Some((field.to_string(), value.to_string()));
        self
    }
}

/// Location of a stored blob. Only produced by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub bucket: String,
    pub path: String,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, AppError>;
    async fn insert(&self, collection: &str, record: Value) -> Result<Value, AppError>;
    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;
    async fn upload_blob(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<BlobRef, AppError>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
