pub mod reviews;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Review API routes. Session handling is layered on by the caller.
pub fn review_router(state: AppState) -> Router {
    Router::new()
        .route("/cards/{card_id}/review", post(reviews::submit_review))
        .route("/cards/{card_id}/progress", get(reviews::card_progress))
        .route("/cards/{card_id}/history", get(reviews::card_history))
        .route("/cards/due/summary", get(reviews::due_summary))
        .route("/reviews/due", get(reviews::due_cards))
        .route("/reviews/stats", get(reviews::review_stats))
        .route("/reviews/mastery", get(reviews::mastery_breakdown))
        .with_state(state)
}
