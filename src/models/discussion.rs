use serde::{Deserialize, Serialize};

use super::{ChildEntity, Entity};
use crate::store::Direction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub question: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDiscussion {
    pub question: String,
}

impl Entity for Discussion {
    const COLLECTION: &'static str = "discussions";
    const ORDER_BY: &'static str = "created_at";
    const DIRECTION: Direction = Direction::Descending;

    type Draft = NewDiscussion;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub discussion_id: String,
    pub content: String,
    pub created_at: String,
}

/// The parent `discussion_id` is added by the thread the answer is posted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnswer {
    pub content: String,
}

impl Entity for Answer {
    const COLLECTION: &'static str = "answers";
    const ORDER_BY: &'static str = "created_at";
    const DIRECTION: Direction = Direction::Ascending;

    type Draft = NewAnswer;

    fn id(&self) -> &str {
        &self.id
    }
}

impl ChildEntity for Answer {
    const PARENT_FIELD: &'static str = "discussion_id";

    fn parent_id(&self) -> &str {
        &self.discussion_id
    }
}
