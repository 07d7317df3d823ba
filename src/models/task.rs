use serde::{Deserialize, Serialize};

use super::Entity;
use crate::store::Direction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Text,
    Coding,
    Image,
    Link,
    #[serde(other)]
    Unknown,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Text => "text",
            TaskKind::Coding => "coding",
            TaskKind::Image => "image",
            TaskKind::Link => "link",
            TaskKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default)]
    pub content: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Entity for Task {
    const COLLECTION: &'static str = "tasks";
    const ORDER_BY: &'static str = "created_at";
    const DIRECTION: Direction = Direction::Descending;

    type Draft = NewTask;

    fn id(&self) -> &str {
        &self.id
    }
}
