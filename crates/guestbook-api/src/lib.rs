pub mod admin;
pub mod error;
pub mod files;
pub mod messages;
pub mod routes;
pub mod storage;
pub mod users;

use std::sync::Arc;

use tracing::error;

use guestbook_db::Database;

use crate::error::ApiError;
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

/// Handles built once by the entry point and shared by every handler.
pub struct AppStateInner {
    pub db: Arc<Database>,
    pub storage: Storage,
}

/// Run a blocking database call off the async runtime.
///
/// Failures are logged with their cause and reported to the client as
/// `ApiError::Store(failure)`.
pub(crate) async fn run_blocking<F, T>(
    state: &AppState,
    failure: &'static str,
    f: F,
) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store(failure)
        })?
        .map_err(|e| {
            error!("{}: {:#}", failure, e);
            ApiError::Store(failure)
        })
}
