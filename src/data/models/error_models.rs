use diesel::r2d2::PoolError;
use diesel::result::Error as DieselError;
use thiserror::Error;

/// Failures raised by the progress store and the card catalog.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
    #[error("Connection pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("Unsupported learning state: {0}")]
    UnsupportedState(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    /// The row changed between read and write.
    #[error("Progress was modified concurrently")]
    VersionConflict,
}

/// Failures of a single review or review query.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Not logged in")]
    Unauthenticated,
    #[error("Invalid grade: {0:?}")]
    InvalidGrade(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Card {card_id} is being reviewed concurrently, try again")]
    ConcurrencyConflict { user_id: i32, card_id: i32 },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(String),
}
