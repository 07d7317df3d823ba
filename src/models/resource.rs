use serde::{Deserialize, Serialize};

use super::Entity;
use crate::store::Direction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[default]
    Document,
    Link,
    Video,
    #[serde(other)]
    Unknown,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Document => "document",
            ResourceKind::Link => "link",
            ResourceKind::Video => "video",
            ResourceKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
}

impl Entity for Resource {
    const COLLECTION: &'static str = "resources";
    const ORDER_BY: &'static str = "created_at";
    const DIRECTION: Direction = Direction::Descending;

    type Draft = NewResource;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_description_reads_as_empty() {
        let resource: Resource = serde_json::from_value(serde_json::json!({
            "id": "r-1",
            "title": "Axum docs",
            "description": null,
            "type": "link",
            "url": "https://docs.rs/axum",
            "created_at": "2024-05-01T09:00:00Z"
        }))
        .expect("decode");

        assert_eq!(resource.description, "");
        assert_eq!(resource.kind, ResourceKind::Link);
    }
}
