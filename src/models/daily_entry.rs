use serde::{Deserialize, Serialize};

use super::Entity;
use crate::store::Direction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub id: String,
    pub date: String,
    pub topics: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub participants: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDailyEntry {
    pub date: String,
    pub topics: String,
    pub participants: Vec<String>,
}

impl Entity for DailyEntry {
    const COLLECTION: &'static str = "daily_entries";
    const ORDER_BY: &'static str = "date";
    const DIRECTION: Direction = Direction::Descending;

    type Draft = NewDailyEntry;

    fn id(&self) -> &str {
        &self.id
    }
}
