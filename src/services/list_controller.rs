use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::AppError;
use crate::forms::EntryForm;
use crate::models::Entity;
use crate::store::{RemoteStore, SelectQuery};

/// Full-collection read for `T` with its fixed sort key and direction.
pub fn collection_query<T: Entity>() -> SelectQuery {
    SelectQuery::new(T::COLLECTION, T::ORDER_BY, T::DIRECTION)
}

/// Decoded rows of one select, in store order.
pub(crate) struct Fetched<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T: Entity> Fetched<T> {
    /// User-visible note for rows that were present but could not be read.
    pub fn skipped_error(&self) -> Option<String> {
        (self.skipped > 0).then(|| {
            format!("{} {} record(s) could not be read", self.skipped, T::COLLECTION)
        })
    }
}

/// Runs one select and decodes the rows in store order. Rows that do not
/// decode are left out and counted in `skipped`.
pub(crate) async fn fetch_all<T: Entity>(
    store: &dyn RemoteStore,
    query: &SelectQuery,
) -> Result<Fetched<T>, AppError> {
    let rows = store.select(query).await?;
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for row in rows {
        match serde_json::from_value::<T>(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Skipping unreadable {} row: {}", T::COLLECTION, e);
                skipped += 1;
            }
        }
    }

    Ok(Fetched { records, skipped })
}

/// Serializes a draft and inserts it into the collection of `T`.
pub(crate) async fn insert_record<T: Entity>(
    store: &dyn RemoteStore,
    draft: &T::Draft,
) -> Result<(), AppError> {
    let record = serde_json::to_value(draft)
        .map_err(|e| AppError::Validation(format!("Invalid {} draft: {}", T::COLLECTION, e)))?;

    match store.insert(T::COLLECTION, record).await {
        Ok(_) => {
            info!("created record in {}", T::COLLECTION);
            Ok(())
        }
        Err(e) => {
            error!("Error creating {}: {}", T::COLLECTION, e);
            Err(e)
        }
    }
}

pub(crate) async fn delete_record<T: Entity>(store: &dyn RemoteStore, id: &str) -> Result<(), AppError> {
    match store.delete(T::COLLECTION, id).await {
        Ok(()) => {
            info!("deleted {} from {}", id, T::COLLECTION);
            Ok(())
        }
        Err(e) => {
            error!("Error deleting {} from {}: {}", id, T::COLLECTION, e);
            Err(e)
        }
    }
}

/// Owns the in-memory collection of one entity type.
///
/// Every successful mutation is followed by exactly one full reload; nothing
/// is retried and nothing is merged locally.
pub struct ListController<T: Entity> {
    store: Arc<dyn RemoteStore>,
    items: Vec<T>,
    form_open: bool,
    error: Option<String>,
}

impl<T: Entity> ListController<T> {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            items: Vec::new(),
            form_open: false,
            error: None,
        }
    }

    /// Builds the controller and runs the initial load. A failed load leaves
    /// the collection empty with the failure recorded in `error()`.
    pub async fn mount(store: Arc<dyn RemoteStore>) -> Self {
        let mut controller = Self::new(store);
        let _ = controller.load().await;
        controller
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    pub fn open_form(&mut self) {
        self.form_open = true;
    }

    pub fn close_form(&mut self) {
        self.form_open = false;
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        match fetch_all::<T>(self.store.as_ref(), &collection_query::<T>()).await {
            Ok(fetched) => {
                self.error = fetched.skipped_error();
                self.items = fetched.records;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching {}: {}", T::COLLECTION, e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, draft: T::Draft) -> Result<(), AppError> {
        if let Err(e) = insert_record::<T>(self.store.as_ref(), &draft).await {
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.form_open = false;
        // The record exists now; a failed reload is recorded in `error()`.
        let _ = self.load().await;
        Ok(())
    }

    /// Validates the form, creates the record and resets the form on success.
    /// On any failure the form keeps its input.
    pub async fn submit<F>(&mut self, form: &mut F) -> Result<(), AppError>
    where
        F: EntryForm<Draft = T::Draft>,
    {
        let draft = form.draft()?;
        self.create(draft).await?;
        form.reset();
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), AppError> {
        if let Err(e) = delete_record::<T>(self.store.as_ref(), id).await {
            self.error = Some(e.to_string());
            return Err(e);
        }

        let _ = self.load().await;
        Ok(())
    }
}
