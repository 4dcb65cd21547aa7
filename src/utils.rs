pub mod session;

pub use session::{get_current_user_id, require_user, set_user_session};

use crate::data::models::ReviewError;

/// Runs blocking store work off the async executor.
pub async fn run_blocking<T, F>(work: F) -> Result<T, ReviewError>
where
    F: FnOnce() -> Result<T, ReviewError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ReviewError::Internal(format!("Blocking task failed: {}", e)))?
}
