//! Pure record-to-view mappings for the four views.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::models::{
    Answer, CommentKind, DailyEntry, Resource, ResourceKind, Task, TaskComment, TaskKind,
};
use crate::services::DiscussionThread;

fn format_timestamp(raw: &str, pattern: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.format(pattern).to_string(),
        Err(_) => raw.to_string(),
    }
}

fn format_date(raw: &str, pattern: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format(pattern).to_string(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskContent {
    Image { src: String, alt: String },
    /// Literal text, shown preformatted.
    Code { text: String },
    /// Opens in a new browsing context.
    Link { href: String },
    Text { text: String },
}

impl TaskContent {
    pub fn for_task(task: &Task) -> Option<Self> {
        let content = task.content.as_deref().filter(|c| !c.is_empty())?;

        Some(match task.kind {
            TaskKind::Image => TaskContent::Image {
                src: content.to_string(),
                alt: task.text.clone(),
            },
            TaskKind::Coding => TaskContent::Code {
                text: content.to_string(),
            },
            TaskKind::Link => TaskContent::Link {
                href: content.to_string(),
            },
            TaskKind::Text | TaskKind::Unknown => TaskContent::Text {
                text: content.to_string(),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCard {
    pub id: String,
    pub badge: &'static str,
    pub date: String,
    pub text: String,
    pub content: Option<TaskContent>,
}

impl From<&Task> for TaskCard {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            badge: task.kind.as_str(),
            date: format_timestamp(&task.created_at, "%b %-d, %Y"),
            text: task.text.clone(),
            content: TaskContent::for_task(task),
        }
    }
}

/// Full-size view of an image task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageOverlay {
    open: bool,
}

impl ImageOverlay {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens only for image tasks that have an image.
    pub fn click_thumbnail(&mut self, card: &TaskCard) {
        if matches!(card.content, Some(TaskContent::Image { .. })) {
            self.open = true;
        }
    }

    pub fn click_backdrop(&mut self) {
        self.open = false;
    }

    pub fn click_close(&mut self) {
        self.open = false;
    }

    /// Clicks on the enlarged image stop here and never reach the backdrop.
    pub fn click_image(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommentBody {
    Link { href: String },
    Attachment { href: String, label: String, folder: bool },
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: String,
    pub timestamp: String,
    pub body: CommentBody,
}

impl From<&TaskComment> for CommentView {
    fn from(comment: &TaskComment) -> Self {
        let body = match comment.kind {
            CommentKind::Link => CommentBody::Link {
                href: comment.content.clone(),
            },
            CommentKind::File | CommentKind::Folder => CommentBody::Attachment {
                href: comment.file_url.clone().unwrap_or_default(),
                label: comment.content.clone(),
                folder: comment.kind == CommentKind::Folder,
            },
            CommentKind::Text | CommentKind::Unknown => CommentBody::Text {
                text: comment.content.clone(),
            },
        };

        Self {
            id: comment.id.clone(),
            timestamp: format_timestamp(&comment.created_at, "%b %-d, %Y %-I:%M %p"),
            body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceIcon {
    Document,
    Video,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceCard {
    pub id: String,
    pub icon: ResourceIcon,
    pub badge: &'static str,
    pub date: String,
    pub title: String,
    pub href: String,
    pub description: Option<String>,
}

impl From<&Resource> for ResourceCard {
    fn from(resource: &Resource) -> Self {
        let icon = match resource.kind {
            ResourceKind::Document => ResourceIcon::Document,
            ResourceKind::Video => ResourceIcon::Video,
            ResourceKind::Link | ResourceKind::Unknown => ResourceIcon::Link,
        };

        Self {
            id: resource.id.clone(),
            icon,
            badge: resource.kind.as_str(),
            date: format_timestamp(&resource.created_at, "%b %-d, %Y"),
            title: resource.title.clone(),
            href: resource.url.clone(),
            description: Some(resource.description.clone()).filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyEntryCard {
    pub id: String,
    pub date: String,
    pub topics: String,
    pub participants: Vec<String>,
}

impl From<&DailyEntry> for DailyEntryCard {
    fn from(entry: &DailyEntry) -> Self {
        Self {
            id: entry.id.clone(),
            date: format_date(&entry.date, "%B %-d, %Y"),
            topics: entry.topics.clone(),
            participants: entry.participants.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerView {
    pub id: String,
    pub content: String,
    pub date: String,
}

impl From<&Answer> for AnswerView {
    fn from(answer: &Answer) -> Self {
        Self {
            id: answer.id.clone(),
            content: answer.content.clone(),
            date: format_timestamp(&answer.created_at, "%b %-d, %Y"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscussionCard {
    pub id: String,
    pub question: String,
    pub date: String,
    pub answers: Vec<AnswerView>,
}

impl From<&DiscussionThread> for DiscussionCard {
    fn from(thread: &DiscussionThread) -> Self {
        Self {
            id: thread.discussion.id.clone(),
            question: thread.discussion.question.clone(),
            date: format_timestamp(&thread.discussion.created_at, "%b %-d, %Y"),
            answers: thread.answers.iter().map(AnswerView::from).collect(),
        }
    }
}
