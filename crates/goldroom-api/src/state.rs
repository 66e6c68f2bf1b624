use std::sync::Arc;

use tracing::error;

use goldroom_db::Database;
use goldroom_gateway::dispatcher::Dispatcher;

use crate::error::{ApiError, ApiResult};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    pub fn new(db: Database, dispatcher: Dispatcher) -> AppState {
        Arc::new(Self { db, dispatcher })
    }
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
}
