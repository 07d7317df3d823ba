use serde::{Deserialize, Serialize};

use super::{ChildEntity, Entity};
use crate::services::UploadedFile;
use crate::store::Direction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    #[default]
    Text,
    Link,
    File,
    Folder,
    #[serde(other)]
    Unknown,
}

/// Comment kinds that are backed by an uploaded blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    File,
    Folder,
}

impl From<AttachmentKind> for CommentKind {
    fn from(kind: AttachmentKind) -> Self {
        match kind {
            AttachmentKind::File => CommentKind::File,
            AttachmentKind::Folder => CommentKind::Folder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskComment {
    pub id: String,
    pub task_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: CommentKind,
    #[serde(default)]
    pub file_url: Option<String>,
    pub created_at: String,
}

/// Draft of a comment. A `file_url` can only come from a finished upload,
/// so the fields are private and set through the constructors below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTaskComment {
    content: String,
    #[serde(rename = "type")]
    kind: CommentKind,
    file_url: Option<String>,
}

impl NewTaskComment {
    pub fn text(content: &str) -> Self {
        Self {
            content: content.trim().to_string(),
            kind: CommentKind::Text,
            file_url: None,
        }
    }

    pub fn link(url: &str) -> Self {
        Self {
            content: url.trim().to_string(),
            kind: CommentKind::Link,
            file_url: None,
        }
    }

    pub fn attachment(kind: AttachmentKind, upload: &UploadedFile) -> Self {
        Self {
            content: upload.label.clone(),
            kind: kind.into(),
            file_url: Some(upload.public_url.clone()),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> CommentKind {
        self.kind
    }

    pub fn file_url(&self) -> Option<&str> {
        self.file_url.as_deref()
    }
}

impl Entity for TaskComment {
    const COLLECTION: &'static str = "task_comments";
    const ORDER_BY: &'static str = "created_at";
    const DIRECTION: Direction = Direction::Ascending;

    type Draft = NewTaskComment;

    fn id(&self) -> &str {
        &self.id
    }
}

impl ChildEntity for TaskComment {
    const PARENT_FIELD: &'static str = "task_id";

    fn parent_id(&self) -> &str {
        &self.task_id
    }
}
