use tower_sessions::Session;

use crate::data::models::ReviewError;

pub const USER_ID_KEY: &str = "user_id";

pub async fn set_user_session(session: &Session, user_id: i32) -> Result<(), ReviewError> {
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .map_err(|e| ReviewError::Internal(format!("Session error: {}", e)))
}

pub async fn get_current_user_id(session: &Session) -> Option<i32> {
    match session.get::<i32>(USER_ID_KEY).await {
        Ok(user_id) => user_id,
        Err(e) => {
            log::error!("Failed to get user_id from session: {}", e);
            None
        }
    }
}

/// The logged-in user, or `Unauthenticated`.
pub async fn require_user(session: &Session) -> Result<i32, ReviewError> {
    get_current_user_id(session)
        .await
        .ok_or(ReviewError::Unauthenticated)
}
