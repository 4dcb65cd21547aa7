#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Path,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use diesel::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

use flashcard_review::data::models::NewCardProgressRow;
use flashcard_review::data::repositories::{SqliteCardCatalog, SqliteReviewStore};
use flashcard_review::db::{create_pool, init_schema, DbPool};
use flashcard_review::features::srs::FixedClock;
use flashcard_review::schema::{card_progress, cards, decks};
use flashcard_review::utils::set_user_session;
use flashcard_review::{review_router, AppState};

pub const ALICE: i32 = 1;
pub const BOB: i32 = 2;

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
}

pub fn test_pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = dir.path().join("test.db");
    let pool = create_pool(url.to_str().expect("utf-8 path"), 8).expect("pool");
    init_schema(&pool).expect("schema");
    seed(&pool);
    (dir, pool)
}

/// Alice owns "Spanish" (10, 11, 12) and "French" (20, 21).
/// Bob owns "German" (30).
fn seed(pool: &DbPool) {
    let mut conn = pool.get().expect("connection");
    for (deck_id, user_id, title) in [(1, ALICE, "Spanish"), (2, ALICE, "French"), (3, BOB, "German")] {
        diesel::insert_into(decks::table)
            .values((
                decks::deck_id.eq(deck_id),
                decks::user_id.eq(user_id),
                decks::title.eq(title),
                decks::deleted.eq(false),
            ))
            .execute(&mut conn)
            .expect("insert deck");
    }
    for (card_id, deck_id, term, definition) in [
        (10, 1, "perro", "dog"),
        (11, 1, "gato", "cat"),
        (12, 1, "casa", "house"),
        (20, 2, "chien", "dog"),
        (21, 2, "chat", "cat"),
        (30, 3, "Hund", "dog"),
    ] {
        diesel::insert_into(cards::table)
            .values((
                cards::card_id.eq(card_id),
                cards::deck_id.eq(deck_id),
                cards::term.eq(term),
                cards::definition.eq(definition),
                cards::deleted.eq(false),
            ))
            .execute(&mut conn)
            .expect("insert card");
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub clock: Arc<FixedClock>,
    _dir: TempDir,
}

async fn login(session: Session, Path(user_id): Path<i32>) -> StatusCode {
    match set_user_session(&session, user_id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl TestApp {
    pub fn new() -> Self {
        let (dir, pool) = test_pool();
        let clock = Arc::new(FixedClock::new(start()));
        let state = AppState::new(
            Arc::new(SqliteReviewStore::new(pool.clone())),
            Arc::new(SqliteCardCatalog::new(pool.clone())),
            clock.clone(),
        );

        let router = Router::new()
            .route("/test/login/{user_id}", post(login))
            .merge(review_router(state))
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false));

        Self {
            router,
            pool,
            clock,
            _dir: dir,
        }
    }

    /// Logs `user_id` in and returns the session cookie.
    pub async fn login(&self, user_id: i32) -> String {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("/test/login/{}", user_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn review(&self, card_id: i32, grade: &str, cookie: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            &format!("/cards/{}/review", card_id),
            Some(cookie),
            Some(serde_json::json!({ "grade": grade })),
        )
        .await
    }

    pub fn soft_delete_card(&self, card_id: i32) {
        let mut conn = self.pool.get().unwrap();
        diesel::update(cards::table.filter(cards::card_id.eq(card_id)))
            .set(cards::deleted.eq(true))
            .execute(&mut conn)
            .unwrap();
    }

    /// Writes a progress row owned by another study mode, due in `due_in_days`.
    pub fn hold_in_other_mode(&self, user_id: i32, card_id: i32, label: &str, due_in_days: i64) {
        let mut conn = self.pool.get().unwrap();
        let at = start().naive_utc();
        diesel::insert_into(card_progress::table)
            .values(&NewCardProgressRow {
                user_id,
                card_id,
                learning_state: label,
                review_interval: 0,
                ease_factor: 2.5,
                repetitions: 0,
                next_review: (start() + chrono::Duration::days(due_in_days)).naive_utc(),
                version: 1,
                created_at: at,
                updated_at: at,
            })
            .execute(&mut conn)
            .unwrap();
    }
}
