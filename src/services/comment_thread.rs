use std::sync::Arc;

use super::thread_controller::ThreadController;
use super::uploader::{BlobUploader, FileUpload, UploadedFile};
use crate::error::AppError;
use crate::models::{AttachmentKind, NewTaskComment, TaskComment};
use crate::store::RemoteStore;

/// What the user submits in the comment box of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentInput {
    Text(String),
    Link(String),
    File(FileUpload),
    Folder(FileUpload),
}

/// Comments of one task. File and folder comments go through the uploader
/// first and are only inserted once the upload is confirmed.
pub struct CommentThread {
    thread: ThreadController<TaskComment>,
    uploader: BlobUploader,
}

impl CommentThread {
    pub fn new(store: Arc<dyn RemoteStore>, task_id: &str) -> Self {
        Self {
            thread: ThreadController::new(store.clone(), task_id),
            uploader: BlobUploader::task_files(store),
        }
    }

    pub async fn mount(store: Arc<dyn RemoteStore>, task_id: &str) -> Self {
        Self {
            thread: ThreadController::mount(store.clone(), task_id).await,
            uploader: BlobUploader::task_files(store),
        }
    }

    pub fn task_id(&self) -> &str {
        self.thread.parent_id()
    }

    pub fn comments(&self) -> &[TaskComment] {
        self.thread.items()
    }

    pub fn error(&self) -> Option<&str> {
        self.thread.error()
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        self.thread.load().await
    }

    pub async fn submit(&mut self, input: CommentInput) -> Result<(), AppError> {
        let draft = match input {
            CommentInput::Text(content) => {
                if content.trim().is_empty() {
                    return Err(AppError::Validation("comment text is required".to_string()));
                }
                NewTaskComment::text(&content)
            }
            CommentInput::Link(url) => {
                if url.trim().is_empty() {
                    return Err(AppError::Validation("link url is required".to_string()));
                }
                NewTaskComment::link(&url)
            }
            CommentInput::File(file) => {
                let uploaded = self.upload(file).await?;
                NewTaskComment::attachment(AttachmentKind::File, &uploaded)
            }
            CommentInput::Folder(file) => {
                let uploaded = self.upload(file).await?;
                NewTaskComment::attachment(AttachmentKind::Folder, &uploaded)
            }
        };

        self.thread.create(draft).await
    }

    async fn upload(&mut self, file: FileUpload) -> Result<UploadedFile, AppError> {
        let result = self.uploader.upload(file).await;
        if let Err(e) = &result {
            self.thread.record_error(e);
        }
        result
    }
}
