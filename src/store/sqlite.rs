use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{debug, info};
use uuid::Uuid;

use super::{BlobRef, RemoteStore, SelectQuery};
use crate::error::AppError;

/// Local stand-in for the hosted store. Assigns `id` and `created_at` on
/// insert the same way the hosted store does.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
    public_base: String,
}

impl SqliteStore {
    pub fn new(db: SqlitePool, public_base: &str) -> Self {
        Self {
            db,
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn connect(database_url: &str, public_base: &str) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Config(format!("Failed to open {}: {}", database_url, e)))?;

        let store = Self::new(pool, public_base);
        store.migrate().await?;
        info!("local store ready at {}", database_url);
        Ok(store)
    }

    /// Single-connection in-memory store; the database lives as long as the pool.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::Config(format!("Failed to open in-memory store: {}", e)))?;

        let store = Self::new(pool, "http://localhost");
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .map_err(|e| AppError::Config(format!("Failed to run migrations: {}", e)))
    }

    pub async fn read_blob(&self, bucket: &str, path: &str) -> Result<Option<Vec<u8>>, AppError> {
        sqlx::query_scalar::<_, Vec<u8>>("SELECT bytes FROM blobs WHERE bucket = ?1 AND path = ?2")
            .bind(bucket)
            .bind(path)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| AppError::Read(format!("{}/{}: {}", bucket, path, e)))
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl RemoteStore for SqliteStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, AppError> {
        let direction = match query.direction {
            super::Direction::Ascending => "ASC",
            super::Direction::Descending => "DESC",
        };
        let filter = if query.filter.is_some() {
            "AND json_extract(data, ?3) = ?4"
        } else {
            ""
        };
        let sql = format!(
            "SELECT data FROM records WHERE collection = ?1 {} ORDER BY json_extract(data, ?2) {}, seq {}",
            filter, direction, direction
        );

        let mut rows = sqlx::query_scalar::<_, String>(&sql)
            .bind(&query.collection)
            .bind(format!("$.{}", query.order_by));
        if let Some((field, value)) = &query.filter {
            rows = rows.bind(format!("$.{}", field)).bind(value);
        }

        let rows = rows
            .fetch_all(&self.db)
            .await
            .map_err(|e| AppError::Read(format!("{}: {}", query.collection, e)))?;

        rows.iter()
            .map(|data| {
                serde_json::from_str::<Value>(data)
                    .map_err(|e| AppError::Read(format!("Corrupt {} row: {}", query.collection, e)))
            })
            .collect()
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<Value, AppError> {
        let Value::Object(mut fields) = record else {
            return Err(AppError::Write(format!("{}: record must be a JSON object", collection)));
        };
        if fields.contains_key("id") || fields.contains_key("created_at") {
            return Err(AppError::Write(format!(
                "{}: id and created_at are assigned by the store",
                collection
            )));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();
        fields.insert("id".to_string(), Value::String(id.clone()));
        fields.insert("created_at".to_string(), Value::String(created_at.clone()));
        let created = Value::Object(fields);
        let data = created.to_string();

        sqlx::query("INSERT INTO records (collection, id, created_at, data) VALUES (?1, ?2, ?3, ?4)")
            .bind(collection)
            .bind(&id)
            .bind(&created_at)
            .bind(&data)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::Write(format!("{}: {}", collection, e)))?;

        debug!("inserted {} into {}", id, collection);
        Ok(created)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        let affected = sqlx::query("DELETE FROM records WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::Write(format!("{}: {}", collection, e)))?
            .rows_affected();

        debug!("deleted {} row(s) from {}", affected, collection);
        Ok(())
    }

    async fn upload_blob(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<BlobRef, AppError> {
        sqlx::query(
            "INSERT INTO blobs (bucket, path, content_type, bytes, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(bucket)
        .bind(path)
        .bind(content_type)
        .bind(bytes)
        .bind(now_timestamp())
        .execute(&self.db)
        .await
        .map_err(|e| AppError::Upload(format!("{}/{}: {}", bucket, path, e)))?;

        Ok(BlobRef {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.public_base, bucket, path)
    }
}
