use std::sync::Arc;

use crate::store::RemoteStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RemoteStore>,
    pub fanout: usize,
    /// Largest request body accepted by the upload routes.
    pub upload_limit: usize,
}
