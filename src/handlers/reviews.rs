use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, Query, State};
use tower_sessions::Session;

use crate::{
    data::models::{
        CardProgress, DeckScope, DueCard, DueSummary, Grade, MasteryBreakdown, ReviewError,
        ReviewRequest, ReviewStats, StudyLog,
    },
    state::AppState,
    utils::{require_user, run_blocking},
};

pub async fn submit_review(
    State(state): State<AppState>,
    session: Session,
    Path(card_id): Path<i32>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<CardProgress>, ReviewError> {
    let user_id = require_user(&session).await?;
    let Json(payload) = payload.map_err(|e| ReviewError::InvalidArgument(e.body_text()))?;
    let grade: Grade = payload.grade.parse()?;

    let progress = run_blocking(move || {
        state
            .reviews
            .review_card(user_id, card_id, grade, payload.time_taken_ms)
    })
    .await?;

    Ok(Json(progress))
}

pub async fn card_progress(
    State(state): State<AppState>,
    session: Session,
    Path(card_id): Path<i32>,
) -> Result<Json<CardProgress>, ReviewError> {
    let user_id = require_user(&session).await?;
    let progress = run_blocking(move || state.reviews.card_progress(user_id, card_id)).await?;
    Ok(Json(progress))
}

pub async fn card_history(
    State(state): State<AppState>,
    session: Session,
    Path(card_id): Path<i32>,
) -> Result<Json<Vec<StudyLog>>, ReviewError> {
    let user_id = require_user(&session).await?;
    let logs = run_blocking(move || state.reviews.history(user_id, card_id)).await?;
    Ok(Json(logs))
}

pub async fn due_cards(
    State(state): State<AppState>,
    session: Session,
    Query(scope): Query<DeckScope>,
) -> Result<Json<Vec<DueCard>>, ReviewError> {
    let user_id = require_user(&session).await?;
    let due = run_blocking(move || Ok(state.due.due_cards(user_id, scope.deck_id)?)).await?;
    Ok(Json(due))
}

pub async fn review_stats(
    State(state): State<AppState>,
    session: Session,
    Query(scope): Query<DeckScope>,
) -> Result<Json<ReviewStats>, ReviewError> {
    let user_id = require_user(&session).await?;
    let stats = run_blocking(move || Ok(state.due.stats(user_id, scope.deck_id)?)).await?;
    Ok(Json(stats))
}

pub async fn due_summary(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DueSummary>, ReviewError> {
    let user_id = require_user(&session).await?;
    let summary = run_blocking(move || Ok(state.due.due_summary(user_id)?)).await?;
    Ok(Json(summary))
}

pub async fn mastery_breakdown(
    State(state): State<AppState>,
    session: Session,
    Query(scope): Query<DeckScope>,
) -> Result<Json<MasteryBreakdown>, ReviewError> {
    let user_id = require_user(&session).await?;
    let breakdown =
        run_blocking(move || Ok(state.due.mastery_breakdown(user_id, scope.deck_id)?)).await?;
    Ok(Json(breakdown))
}
