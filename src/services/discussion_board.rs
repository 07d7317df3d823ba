use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info};

use super::list_controller::{Fetched, collection_query, delete_record, fetch_all, insert_record};
use super::thread_controller::{fetch_children, insert_child};
use crate::error::AppError;
use crate::forms::{AnswerForm, DiscussionForm, EntryForm};
use crate::models::{Answer, Discussion, Entity, NewAnswer, NewDiscussion};
use crate::store::RemoteStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscussionThread {
    pub discussion: Discussion,
    pub answers: Vec<Answer>,
}

/// Discussions newest first, each carrying its own answers oldest first.
pub struct DiscussionBoard {
    store: Arc<dyn RemoteStore>,
    fanout: usize,
    threads: Vec<DiscussionThread>,
    form_open: bool,
    error: Option<String>,
}

impl DiscussionBoard {
    pub const DEFAULT_FANOUT: usize = 4;

    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_fanout(store, Self::DEFAULT_FANOUT)
    }

    /// `fanout` bounds how many answer fetches are in flight at once.
    pub fn with_fanout(store: Arc<dyn RemoteStore>, fanout: usize) -> Self {
        Self {
            store,
            fanout: fanout.max(1),
            threads: Vec::new(),
            form_open: false,
            error: None,
        }
    }

    pub fn threads(&self) -> &[DiscussionThread] {
        &self.threads
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

    /// Loads the discussions, then one answer list per discussion. The board
    /// is replaced only once every answer fetch has resolved. A discussion
    /// whose answers fail to load is kept with no answers.
    pub async fn load(&mut self) -> Result<(), AppError> {
        let discussions =
            match fetch_all::<Discussion>(self.store.as_ref(), &collection_query::<Discussion>()).await {
                Ok(discussions) => discussions,
                Err(e) => {
                    error!("Error fetching discussions: {}", e);
                    self.error = Some(e.to_string());
                    return Err(e);
                }
            };

        let mut problems: Vec<String> = discussions.skipped_error().into_iter().collect();

        let store = self.store.clone();
        let fetched: Vec<(Discussion, Result<Fetched<Answer>, AppError>)> = stream::iter(discussions.records)
            .map(|discussion| {
                let store = store.clone();
                async move {
                    let answers = fetch_children::<Answer>(store.as_ref(), &discussion.id).await;
                    (discussion, answers)
                }
            })
            .buffered(self.fanout)
            .collect()
            .await;

        let mut failed = 0;
        let mut skipped = 0;
        let mut threads = Vec::with_capacity(fetched.len());
        for (discussion, answers) in fetched {
            let answers = match answers {
                Ok(answers) => {
                    skipped += answers.skipped;
                    answers.records
                }
                Err(e) => {
                    error!("Error fetching answers for {}: {}", discussion.id, e);
                    failed += 1;
                    Vec::new()
                }
            };
            threads.push(DiscussionThread { discussion, answers });
        }

        if failed > 0 {
            problems.push(format!("answers could not be loaded for {} discussion(s)", failed));
        }
        if skipped > 0 {
            problems.push(format!("{} {} record(s) could not be read", skipped, Answer::COLLECTION));
        }

        self.threads = threads;
        self.error = (!problems.is_empty()).then(|| problems.join("; "));
        Ok(())
    }

    pub async fn create(&mut self, draft: NewDiscussion) -> Result<(), AppError> {
        if let Err(e) = insert_record::<Discussion>(self.store.as_ref(), &draft).await {
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.form_open = false;
        let _ = self.load().await;
        Ok(())
    }

    pub async fn submit(&mut self, form: &mut DiscussionForm) -> Result<(), AppError> {
        let draft = form.draft()?;
        self.create(draft).await?;
        form.reset();
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), AppError> {
        if let Err(e) = delete_record::<Discussion>(self.store.as_ref(), id).await {
            self.error = Some(e.to_string());
            return Err(e);
        }

        let _ = self.load().await;
        Ok(())
    }

    pub async fn answer(&mut self, discussion_id: &str, draft: NewAnswer) -> Result<(), AppError> {
        if let Err(e) = insert_child::<Answer>(self.store.as_ref(), discussion_id, &draft).await {
            error!("Error creating answer for {}: {}", discussion_id, e);
            self.error = Some(e.to_string());
            return Err(e);
        }

        info!("answered discussion {}", discussion_id);
        let _ = self.load().await;
        Ok(())
    }

    pub async fn submit_answer(&mut self, discussion_id: &str, form: &mut AnswerForm) -> Result<(), AppError> {
        let draft = form.draft()?;
        self.answer(discussion_id, draft).await?;
        form.reset();
        Ok(())
    }
}
