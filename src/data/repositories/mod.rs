//! Storage seams for the review engine.
//!
//! `ReviewStore` owns card progress and the study log. `CardLookup` is the
//! catalog of decks and cards kept by the rest of the site; the engine only
//! reads from it.

mod cards;
mod memory;
mod progress;

pub use cards::SqliteCardCatalog;
pub use memory::{InMemoryCardCatalog, InMemoryReviewStore};
pub use progress::SqliteReviewStore;

use std::collections::HashSet;

use crate::data::models::{
    Card, CardCheck, CardProgress, CardRef, DeckRef, NewStudyLog, ProgressWrite, StoreError,
    StudyLog,
};

pub trait ReviewStore: Send + Sync {
    /// Progress for one card, `None` if the user never reviewed it.
    fn get(&self, user_id: i32, card_id: i32) -> Result<Option<CardProgress>, StoreError>;

    /// Upserts progress and appends the log entry in one transaction.
    ///
    /// `expected_version` is the version read before scheduling, `None` if
    /// no row existed. If the row no longer matches, nothing is written and
    /// `StoreError::VersionConflict` is returned.
    fn save_review(
        &self,
        write: &ProgressWrite,
        expected_version: Option<i32>,
        log: &NewStudyLog,
    ) -> Result<CardProgress, StoreError>;

    /// All progress rows of a user, earliest `next_review` first.
    fn list_for_user(&self, user_id: i32) -> Result<Vec<CardProgress>, StoreError>;

    /// Log entries for one card, newest first.
    fn study_logs(&self, user_id: i32, card_id: i32) -> Result<Vec<StudyLog>, StoreError>;

    /// Cards whose progress row is held by another study mode. These rows
    /// are left out of `list_for_user` and cannot be reviewed here.
    fn cards_in_other_modes(&self, user_id: i32) -> Result<HashSet<i32>, StoreError>;
}

pub trait CardLookup: Send + Sync {
    fn verify(&self, user_id: i32, card_id: i32) -> Result<CardCheck, StoreError>;

    /// A live card, `None` if missing or soft-deleted.
    fn card(&self, card_id: i32) -> Result<Option<Card>, StoreError>;

    /// Live cards in the user's live decks, optionally limited to one deck.
    fn cards_for_user(&self, user_id: i32, deck_id: Option<i32>)
        -> Result<Vec<CardRef>, StoreError>;

    /// Live decks of the user, ordered by id.
    fn decks_for_user(&self, user_id: i32) -> Result<Vec<DeckRef>, StoreError>;
}
