use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::{BlobRef, RemoteStore};

/// Raw file as picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Result of a confirmed upload. The only way to obtain a public file URL
/// for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub blob: BlobRef,
    pub public_url: String,
    pub label: String,
}

/// First phase of the upload-then-reference pipeline: stores bytes under a
/// random path in one bucket and resolves the public URL.
pub struct BlobUploader {
    store: Arc<dyn RemoteStore>,
    bucket: String,
    prefix: String,
    fallback_extension: &'static str,
}

impl BlobUploader {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        bucket: &str,
        prefix: &str,
        fallback_extension: &'static str,
    ) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            fallback_extension,
        }
    }

    /// Attachments on task comments.
    pub fn task_files(store: Arc<dyn RemoteStore>) -> Self {
        Self::new(store, "task-files", "task-files", "bin")
    }

    /// Images embedded in image tasks.
    pub fn task_images(store: Arc<dyn RemoteStore>) -> Self {
        Self::new(store, "tasks", "tasks", "png")
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `<prefix>/<random>.<ext>`, keeping the extension of the original name.
    /// A name without an extension gets the fallback extension instead of
    /// keeping the bare name.
    pub fn object_path(&self, file_name: &str) -> String {
        let extension = file_extension(file_name).unwrap_or(self.fallback_extension);
        format!("{}/{}.{}", self.prefix, Uuid::new_v4().simple(), extension)
    }

    pub async fn upload(&self, file: FileUpload) -> Result<UploadedFile, AppError> {
        if file.file_name.trim().is_empty() {
            return Err(AppError::Validation("a file is required".to_string()));
        }

        let path = self.object_path(&file.file_name);
        let blob = self
            .store
            .upload_blob(&self.bucket, &path, file.bytes, file.content_type.as_deref())
            .await
            .map_err(|e| {
                error!("Error uploading {}: {}", file.file_name, e);
                match e {
                    AppError::Upload(_) => e,
                    other => AppError::Upload(other.to_string()),
                }
            })?;

        let public_url = self.store.public_url(&blob.bucket, &blob.path);
        info!("uploaded {} to {}/{}", file.file_name, blob.bucket, blob.path);

        Ok(UploadedFile {
            blob,
            public_url,
            label: file.file_name,
        })
    }
}

pub fn file_extension(file_name: &str) -> Option<&str> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}
