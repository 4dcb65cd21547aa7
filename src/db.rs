use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError};
use diesel::SqliteConnection;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS decks (
    deck_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    deleted BOOLEAN NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS cards (
    card_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    deck_id INTEGER NOT NULL REFERENCES decks(deck_id),
    term TEXT NOT NULL,
    definition TEXT NOT NULL,
    deleted BOOLEAN NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id);

CREATE TABLE IF NOT EXISTS card_progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    user_id INTEGER NOT NULL,
    card_id INTEGER NOT NULL,
    learning_state TEXT NOT NULL,
    review_interval INTEGER NOT NULL DEFAULT 0,
    ease_factor DOUBLE NOT NULL DEFAULT 2.5,
    repetitions INTEGER NOT NULL DEFAULT 0,
    next_review TIMESTAMP NOT NULL,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL,
    UNIQUE (user_id, card_id)
);

CREATE INDEX IF NOT EXISTS idx_card_progress_due ON card_progress(user_id, next_review);

CREATE TABLE IF NOT EXISTS study_logs (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    user_id INTEGER NOT NULL,
    card_id INTEGER NOT NULL,
    grade TEXT NOT NULL,
    action TEXT NOT NULL,
    time_taken_ms BIGINT,
    reviewed_at TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_study_logs_user_card ON study_logs(user_id, card_id);
"#;

/// Per-connection pragmas. SQLite applies these per handle, so every pooled
/// connection needs them.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub busy_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions::default()))
        .build(manager)
}

/// Creates the tables if they are missing. Safe to call on every start.
pub fn init_schema(pool: &DbPool) -> Result<(), crate::data::models::StoreError> {
    let mut conn = pool.get()?;
    conn.batch_execute(SCHEMA_SQL)?;
    Ok(())
}
