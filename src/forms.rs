use chrono::Local;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;
use crate::models::{NewAnswer, NewDailyEntry, NewDiscussion, NewResource, NewTask, ResourceKind, TaskKind};
use crate::services::{BlobUploader, FileUpload};

/// Local input state for one draft shape.
pub trait EntryForm: Default {
    type Draft;

    /// Checks required fields and builds the draft. Does not touch the store.
    fn draft(&self) -> Result<Self::Draft, AppError>;

    fn reset(&mut self) {
        *self = Self::default();
    }
}

fn required(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

/// Splits a comma separated list of names, trimming each one. Empty segments
/// are kept, so an empty input yields a single empty name.
pub fn split_participants(input: &str) -> Vec<String> {
    input.split(',').map(|name| name.trim().to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DailyEntryForm {
    pub date: String,
    pub topics: String,
    pub participants: String,
}

impl Default for DailyEntryForm {
    fn default() -> Self {
        Self {
            date: Local::now().format("%Y-%m-%d").to_string(),
            topics: String::new(),
            participants: String::new(),
        }
    }
}

impl EntryForm for DailyEntryForm {
    type Draft = NewDailyEntry;

    fn draft(&self) -> Result<NewDailyEntry, AppError> {
        required(&self.date, "date")?;
        required(&self.topics, "topics")?;
        required(&self.participants, "participants")?;

        Ok(NewDailyEntry {
            date: self.date.clone(),
            topics: self.topics.clone(),
            participants: split_participants(&self.participants),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub content: String,
    #[serde(skip)]
    pub preview: Option<String>,
}

impl TaskForm {
    pub fn set_kind(&mut self, kind: TaskKind) {
        self.kind = kind;
        if kind != TaskKind::Image {
            self.preview = None;
        }
    }

    /// Uploads an image for an image task and stores its public URL as the
    /// task content. On failure the current content is kept.
    pub async fn attach_image(&mut self, uploader: &BlobUploader, file: FileUpload) -> Result<(), AppError> {
        if self.kind != TaskKind::Image {
            return Err(AppError::Validation("only image tasks take an image".to_string()));
        }

        let file_name = file.file_name.clone();
        match uploader.upload(file).await {
            Ok(uploaded) => {
                self.preview = Some(file_name);
                self.content = uploaded.public_url;
                Ok(())
            }
            Err(e) => {
                warn!("Error uploading image {}: {}", file_name, e);
                Err(e)
            }
        }
    }
}

impl EntryForm for TaskForm {
    type Draft = NewTask;

    fn draft(&self) -> Result<NewTask, AppError> {
        required(&self.text, "text")?;
        if self.kind == TaskKind::Unknown {
            return Err(AppError::Validation("unsupported task type".to_string()));
        }

        let content = Some(self.content.trim())
            .filter(|content| !content.is_empty())
            .map(str::to_string);

        Ok(NewTask {
            text: self.text.clone(),
            kind: self.kind,
            content,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResourceForm {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
}

impl EntryForm for ResourceForm {
    type Draft = NewResource;

    fn draft(&self) -> Result<NewResource, AppError> {
        required(&self.title, "title")?;
        required(&self.url, "url")?;
        if self.kind == ResourceKind::Unknown {
            return Err(AppError::Validation("unsupported resource type".to_string()));
        }

        Ok(NewResource {
            title: self.title.clone(),
            description: self.description.clone(),
            kind: self.kind,
            url: self.url.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscussionForm {
    pub question: String,
}

impl EntryForm for DiscussionForm {
    type Draft = NewDiscussion;

    fn draft(&self) -> Result<NewDiscussion, AppError> {
        required(&self.question, "question")?;
        Ok(NewDiscussion {
            question: self.question.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnswerForm {
    pub content: String,
}

impl EntryForm for AnswerForm {
    type Draft = NewAnswer;

    fn draft(&self) -> Result<NewAnswer, AppError> {
        required(&self.content, "content")?;
        Ok(NewAnswer {
            content: self.content.clone(),
        })
    }
}
