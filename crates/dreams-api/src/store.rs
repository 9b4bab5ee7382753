//! Store access from handlers. `Database` calls take a std mutex and may
//! write to disk, so they run on the blocking pool rather than on a runtime
//! worker.

use tracing::error;

use dreams_db::{Database, DbResult};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

pub async fn blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })?
}

/// Runs one store operation with `state`'s database.
pub async fn with_db<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> DbResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    blocking(move || Ok(f(&state.db)?)).await
}
