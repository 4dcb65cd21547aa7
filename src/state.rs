use std::sync::Arc;

use crate::data::repositories::{CardLookup, ReviewStore, SqliteCardCatalog, SqliteReviewStore};
use crate::db::DbPool;
use crate::features::srs::{Clock, DueSetClassifier, ReviewService, SystemClock};

/// Shared state of the review routes.
#[derive(Clone)]
pub struct AppState {
    pub reviews: ReviewService,
    pub due: DueSetClassifier,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        cards: Arc<dyn CardLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reviews: ReviewService::new(store.clone(), cards.clone(), clock.clone()),
            due: DueSetClassifier::new(store, cards, clock),
        }
    }

    /// SQLite-backed state using the wall clock.
    pub fn from_pool(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqliteReviewStore::new(pool.clone())),
            Arc::new(SqliteCardCatalog::new(pool)),
            Arc::new(SystemClock),
        )
    }
}
