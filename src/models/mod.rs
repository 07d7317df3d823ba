pub mod daily_entry;
pub mod discussion;
pub mod resource;
pub mod task;
pub mod task_comment;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::Direction;

pub use daily_entry::{DailyEntry, NewDailyEntry};
pub use discussion::{Answer, Discussion, NewAnswer, NewDiscussion};
pub use resource::{NewResource, Resource, ResourceKind};
pub use task::{NewTask, Task, TaskKind};
pub use task_comment::{AttachmentKind, CommentKind, NewTaskComment, TaskComment};

/// A record type stored in one collection of the remote store.
pub trait Entity: DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
    const ORDER_BY: &'static str;
    const DIRECTION: Direction;

    /// Fields supplied by the user; never carries `id` or `created_at`.
    type Draft: Serialize + Send + Sync;

    fn id(&self) -> &str;
}

/// A record that only exists under a parent record.
pub trait ChildEntity: Entity {
    const PARENT_FIELD: &'static str;

    fn parent_id(&self) -> &str;
}

/// Reads a nullable column, mapping both a missing key and `null` to the
/// empty value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
