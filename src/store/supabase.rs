use std::env;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error};

use super::{BlobRef, RemoteStore, SelectQuery, dto};
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
}

impl StoreConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let url = env::var("SUPABASE_URL")
            .map_err(|_| AppError::Config("SUPABASE_URL is not set".to_string()))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        Ok(Self { url, anon_key })
    }

    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// PostgREST + storage client for a hosted Supabase project.
pub struct SupabaseHttpClient {
    client: Client,
    config: StoreConfig,
}

impl SupabaseHttpClient {
    pub fn new(config: StoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn rest_url(&self, collection: &str) -> Result<Url, AppError> {
        let raw = format!("{}/rest/v1/{}", self.config.base(), collection);
        Url::parse(&raw).map_err(|e| AppError::Config(format!("Invalid store url {}: {}", raw, e)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.config.anon_key))
    }
}

fn rest_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<dto::PostgrestError>(body) {
        Ok(parsed) => format!("{} {}", status, parsed.summary()),
        Err(_) => format!("{} {}", status, body),
    }
}

fn storage_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<dto::StorageError>(body) {
        Ok(parsed) => format!(
            "{} {}",
            parsed.status_code.unwrap_or_else(|| status.to_string()),
            parsed.message.or(parsed.error).unwrap_or_default()
        ),
        Err(_) => format!("{} {}", status, body),
    }
}

#[async_trait]
impl RemoteStore for SupabaseHttpClient {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, AppError> {
        let mut url = self.rest_url(&query.collection).map_err(|e| AppError::Read(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            pairs.append_pair(
                "order",
                &format!("{}.{}", query.order_by, query.direction.as_str()),
            );
            if let Some((field, value)) = &query.filter {
                pairs.append_pair(field, &format!("eq.{}", value));
            }
        }
        debug!("select {}", url);

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| AppError::Read(format!("{}: {}", query.collection, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Read(format!(
                "{}: {}",
                query.collection,
                rest_error(status, &body)
            )));
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| {
                error!("Failed to parse {} rows: {}", query.collection, e);
                AppError::Read(format!("Failed to parse {} rows: {}", query.collection, e))
            })
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<Value, AppError> {
        let url = self.rest_url(collection).map_err(|e| AppError::Write(e.to_string()))?;

        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![record]))
            .send()
            .await
            .map_err(|e| AppError::Write(format!("{}: {}", collection, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Write(format!("{}: {}", collection, rest_error(status, &body))));
        }

        let mut created = response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| AppError::Write(format!("Failed to parse created {} row: {}", collection, e)))?;

        if created.is_empty() {
            return Err(AppError::Write(format!("{}: insert returned no row", collection)));
        }
        Ok(created.swap_remove(0))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        let mut url = self.rest_url(collection).map_err(|e| AppError::Write(e.to_string()))?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));

        let response = self
            .authorized(self.client.delete(url))
            .send()
            .await
            .map_err(|e| AppError::Write(format!("{}: {}", collection, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Write(format!("{}: {}", collection, rest_error(status, &body))));
        }

        Ok(())
    }

    async fn upload_blob(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<BlobRef, AppError> {
        let raw = format!("{}/storage/v1/object/{}/{}", self.config.base(), bucket, path);
        let url = Url::parse(&raw).map_err(|e| AppError::Upload(format!("Invalid upload url {}: {}", raw, e)))?;

        let response = self
            .authorized(self.client.post(url))
            .header("Content-Type", content_type.unwrap_or("application/octet-stream"))
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("{}/{}: {}", bucket, path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upload(format!(
                "{}/{}: {}",
                bucket,
                path,
                storage_error(status, &body)
            )));
        }

        let uploaded = response
            .json::<dto::UploadResponse>()
            .await
            .map_err(|e| AppError::Upload(format!("Failed to parse upload response: {}", e)))?;
        debug!("stored blob {}", uploaded.key);

        Ok(BlobRef {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.config.base(), bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Direction;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SupabaseHttpClient {
        SupabaseHttpClient::new(StoreConfig {
            url: server.uri(),
            anon_key: "anon".to_string(),
        })
        .expect("client")
    }

    #[tokio::test]
    async fn test_select_sends_order_and_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/task_comments"))
            .and(query_param("select", "*"))
            .and(query_param("order", "created_at.asc"))
            .and(query_param("task_id", "eq.t-1"))
            .and(header("apikey", "anon"))
            .and(header("Authorization", "Bearer anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "c-1", "task_id": "t-1", "content": "hi", "type": "text", "created_at": "2024-01-01T00:00:00Z" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let query = SelectQuery::new("task_comments", "created_at", Direction::Ascending).eq("task_id", "t-1");
        let rows = client.select(&query).await.expect("select");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "c-1");
    }

    #[tokio::test]
    async fn test_insert_returns_store_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/discussions"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(json!([{ "question": "Why?" }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "id": "d-1", "question": "Why?", "created_at": "2024-01-01T00:00:00Z" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let created = client
            .insert("discussions", json!({ "question": "Why?" }))
            .await
            .expect("insert");

        assert_eq!(created["id"], "d-1");
        assert_eq!(created["created_at"], "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_delete_failure_is_a_write_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("id", "eq.t-9"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23503",
                "message": "violates foreign key constraint"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.delete("tasks", "t-9").await.expect_err("delete should fail");

        match err {
            AppError::Write(msg) => assert!(msg.contains("23503"), "unexpected message: {}", msg),
            other => panic!("expected write error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_failure_is_an_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/task-files/task-files/abc.pdf"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "statusCode": "413",
                "error": "Payload too large",
                "message": "The object exceeded the maximum allowed size"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .upload_blob("task-files", "task-files/abc.pdf", vec![1, 2, 3], None)
            .await
            .expect_err("upload should fail");

        match err {
            AppError::Upload(msg) => assert!(msg.contains("maximum allowed size")),
            other => panic!("expected upload error, got {:?}", other),
        }
    }

    #[test]
    fn test_public_url_layout() {
        let client = SupabaseHttpClient::new(StoreConfig {
            url: "https://example.supabase.co/".to_string(),
            anon_key: "anon".to_string(),
        })
        .expect("client");

        assert_eq!(
            client.public_url("tasks", "tasks/a.png"),
            "https://example.supabase.co/storage/v1/object/public/tasks/tasks/a.png"
        );
    }
}
