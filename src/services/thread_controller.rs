use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use super::list_controller::{Fetched, fetch_all};
use crate::error::AppError;
use crate::models::ChildEntity;
use crate::store::{RemoteStore, SelectQuery};

/// Children of one parent, oldest first.
pub fn children_query<T: ChildEntity>(parent_id: &str) -> SelectQuery {
    SelectQuery::new(T::COLLECTION, T::ORDER_BY, T::DIRECTION).eq(T::PARENT_FIELD, parent_id)
}

pub(crate) async fn fetch_children<T: ChildEntity>(
    store: &dyn RemoteStore,
    parent_id: &str,
) -> Result<Fetched<T>, AppError> {
    fetch_all::<T>(store, &children_query::<T>(parent_id)).await
}

/// Inserts a child draft with its parent reference filled in.
pub(crate) async fn insert_child<T: ChildEntity>(
    store: &dyn RemoteStore,
    parent_id: &str,
    draft: &T::Draft,
) -> Result<Value, AppError> {
    let mut record = serde_json::to_value(draft)
        .map_err(|e| AppError::Validation(format!("Invalid {} draft: {}", T::COLLECTION, e)))?;

    let Value::Object(fields) = &mut record else {
        return Err(AppError::Validation(format!(
            "{} draft must serialize to an object",
            T::COLLECTION
        )));
    };
    fields.insert(T::PARENT_FIELD.to_string(), Value::String(parent_id.to_string()));

    store.insert(T::COLLECTION, record).await
}

/// Child collection scoped to the parent record it is mounted under.
pub struct ThreadController<T: ChildEntity> {
    store: Arc<dyn RemoteStore>,
    parent_id: String,
    items: Vec<T>,
    error: Option<String>,
}

impl<T: ChildEntity> ThreadController<T> {
    pub fn new(store: Arc<dyn RemoteStore>, parent_id: &str) -> Self {
        Self {
            store,
            parent_id: parent_id.to_string(),
            items: Vec::new(),
            error: None,
        }
    }

    pub async fn mount(store: Arc<dyn RemoteStore>, parent_id: &str) -> Self {
        let mut thread = Self::new(store, parent_id);
        let _ = thread.load().await;
        thread
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn record_error(&mut self, err: &AppError) {
        self.error = Some(err.to_string());
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        match fetch_children::<T>(self.store.as_ref(), &self.parent_id).await {
            Ok(fetched) => {
                self.error = fetched.skipped_error();
                self.items = fetched.records;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching {} for {}: {}", T::COLLECTION, self.parent_id, e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, draft: T::Draft) -> Result<(), AppError> {
        if let Err(e) = insert_child::<T>(self.store.as_ref(), &self.parent_id, &draft).await {
            error!("Error adding to {} for {}: {}", T::COLLECTION, self.parent_id, e);
            self.error = Some(e.to_string());
            return Err(e);
        }

        info!("added to {} for {}", T::COLLECTION, self.parent_id);
        let _ = self.load().await;
        Ok(())
    }
}
