//! In-memory implementations of the storage seams.
//!
//! Same semantics as the SQLite versions, including the version check.
//! All state is lost when the value is dropped.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::data::models::{
    Card, CardCheck, CardProgress, CardRef, DeckRef, NewStudyLog, ProgressWrite, StoreError,
    StoredLearningState, StudyLog,
};

use super::{CardLookup, ReviewStore};

#[derive(Default)]
struct ProgressTables {
    progress: HashMap<(i32, i32), CardProgress>,
    other_modes: HashMap<(i32, i32), StoredLearningState>,
    logs: Vec<StudyLog>,
    next_progress_id: i32,
    next_log_id: i32,
}

#[derive(Default)]
pub struct InMemoryReviewStore {
    tables: Mutex<ProgressTables>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the pair as owned by another study mode, the way a
    /// `LEARNING_MCQ` or `LEARNING_TYPING` row does in SQLite.
    pub fn hold_in_other_mode(&self, user_id: i32, card_id: i32, state: StoredLearningState) {
        let mut tables = self.tables();
        tables.progress.remove(&(user_id, card_id));
        tables.other_modes.insert((user_id, card_id), state);
    }

    fn tables(&self) -> MutexGuard<'_, ProgressTables> {
        // Both tables are only touched after every check has passed.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReviewStore for InMemoryReviewStore {
    fn get(&self, user_id: i32, card_id: i32) -> Result<Option<CardProgress>, StoreError> {
        let tables = self.tables();
        if let Some(state) = tables.other_modes.get(&(user_id, card_id)) {
            return Err(StoreError::UnsupportedState(state.as_str().to_string()));
        }
        Ok(tables.progress.get(&(user_id, card_id)).cloned())
    }

    fn save_review(
        &self,
        write: &ProgressWrite,
        expected_version: Option<i32>,
        log: &NewStudyLog,
    ) -> Result<CardProgress, StoreError> {
        let mut tables = self.tables();
        let key = (write.user_id, write.card_id);
        if tables.other_modes.contains_key(&key) {
            return Err(StoreError::VersionConflict);
        }
        let current = tables.progress.get(&key).cloned();

        let saved = match (current, expected_version) {
            (None, None) => {
                tables.next_progress_id += 1;
                CardProgress {
                    id: tables.next_progress_id,
                    user_id: write.user_id,
                    card_id: write.card_id,
                    learning_state: write.state.learning_state,
                    next_review: write.next_review,
                    interval: write.state.interval,
                    ease_factor: write.state.ease_factor,
                    repetitions: write.state.repetitions,
                    version: 1,
                    created_at: write.reviewed_at,
                    updated_at: write.reviewed_at,
                }
            }
            (Some(existing), Some(version)) if existing.version == version => CardProgress {
                learning_state: write.state.learning_state,
                next_review: write.next_review,
                interval: write.state.interval,
                ease_factor: write.state.ease_factor,
                repetitions: write.state.repetitions,
                version: version + 1,
                updated_at: write.reviewed_at,
                ..existing
            },
            _ => return Err(StoreError::VersionConflict),
        };

        tables.next_log_id += 1;
        let log_id = tables.next_log_id;
        tables.logs.push(StudyLog {
            id: log_id,
            user_id: log.user_id,
            card_id: log.card_id,
            grade: log.grade,
            action: log.action.to_string(),
            time_taken_ms: log.time_taken_ms,
            reviewed_at: log.reviewed_at,
        });
        tables.progress.insert(key, saved.clone());
        Ok(saved)
    }

    fn list_for_user(&self, user_id: i32) -> Result<Vec<CardProgress>, StoreError> {
        let mut rows: Vec<CardProgress> = self
            .tables()
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.next_review.cmp(&b.next_review).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn study_logs(&self, user_id: i32, card_id: i32) -> Result<Vec<StudyLog>, StoreError> {
        let mut logs: Vec<StudyLog> = self
            .tables()
            .logs
            .iter()
            .filter(|l| l.user_id == user_id && l.card_id == card_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at).then(b.id.cmp(&a.id)));
        Ok(logs)
    }

    fn cards_in_other_modes(&self, user_id: i32) -> Result<HashSet<i32>, StoreError> {
        Ok(self
            .tables()
            .other_modes
            .keys()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, card_id)| *card_id)
            .collect())
    }
}

#[derive(Debug, Clone)]
struct StoredDeck {
    owner_id: i32,
    title: String,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct StoredCard {
    card: Card,
    deleted: bool,
}

/// Card catalog held in memory, filled through the builder methods.
#[derive(Debug, Default)]
pub struct InMemoryCardCatalog {
    decks: Mutex<HashMap<i32, StoredDeck>>,
    cards: Mutex<HashMap<i32, StoredCard>>,
}

impl InMemoryCardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deck(self, deck_id: i32, owner_id: i32, title: &str) -> Self {
        self.lock_decks().insert(
            deck_id,
            StoredDeck {
                owner_id,
                title: title.to_string(),
                deleted: false,
            },
        );
        self
    }

    pub fn with_card(self, card_id: i32, deck_id: i32, term: &str, definition: &str) -> Self {
        self.lock_cards().insert(
            card_id,
            StoredCard {
                card: Card {
                    id: card_id,
                    deck_id,
                    term: term.to_string(),
                    definition: definition.to_string(),
                },
                deleted: false,
            },
        );
        self
    }

    pub fn delete_card(&self, card_id: i32) {
        if let Some(card) = self.lock_cards().get_mut(&card_id) {
            card.deleted = true;
        }
    }

    pub fn delete_deck(&self, deck_id: i32) {
        if let Some(deck) = self.lock_decks().get_mut(&deck_id) {
            deck.deleted = true;
        }
    }

    fn lock_decks(&self) -> MutexGuard<'_, HashMap<i32, StoredDeck>> {
        self.decks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_cards(&self) -> MutexGuard<'_, HashMap<i32, StoredCard>> {
        self.cards.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn live_deck_owner(&self, deck_id: i32) -> Option<i32> {
        self.lock_decks()
            .get(&deck_id)
            .filter(|d| !d.deleted)
            .map(|d| d.owner_id)
    }
}

impl CardLookup for InMemoryCardCatalog {
    fn verify(&self, _user_id: i32, card_id: i32) -> Result<CardCheck, StoreError> {
        let Some(stored) = self.lock_cards().get(&card_id).cloned() else {
            return Ok(CardCheck::missing());
        };
        let deck = self.lock_decks().get(&stored.card.deck_id).cloned();
        let Some(deck) = deck else {
            return Ok(CardCheck::missing());
        };

        Ok(CardCheck {
            exists: true,
            deleted: stored.deleted || deck.deleted,
            deck_id: Some(stored.card.deck_id),
            deck_owner_id: Some(deck.owner_id),
        })
    }

    fn card(&self, card_id: i32) -> Result<Option<Card>, StoreError> {
        let stored = self.lock_cards().get(&card_id).cloned();
        Ok(stored
            .filter(|s| !s.deleted)
            .filter(|s| self.live_deck_owner(s.card.deck_id).is_some())
            .map(|s| s.card))
    }

    fn cards_for_user(
        &self,
        user_id: i32,
        deck_id: Option<i32>,
    ) -> Result<Vec<CardRef>, StoreError> {
        let cards: Vec<StoredCard> = self.lock_cards().values().cloned().collect();
        let mut refs: Vec<CardRef> = cards
            .into_iter()
            .filter(|s| !s.deleted)
            .filter(|s| deck_id.is_none_or(|d| d == s.card.deck_id))
            .filter(|s| self.live_deck_owner(s.card.deck_id) == Some(user_id))
            .map(|s| CardRef {
                card_id: s.card.id,
                deck_id: s.card.deck_id,
            })
            .collect();
        refs.sort_by_key(|r| r.card_id);
        Ok(refs)
    }

    fn decks_for_user(&self, user_id: i32) -> Result<Vec<DeckRef>, StoreError> {
        let mut decks: Vec<DeckRef> = self
            .lock_decks()
            .iter()
            .filter(|(_, d)| d.owner_id == user_id && !d.deleted)
            .map(|(id, d)| DeckRef {
                deck_id: *id,
                title: d.title.clone(),
            })
            .collect();
        decks.sort_by_key(|d| d.deck_id);
        Ok(decks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{Grade, LearningState, Sm2State, REVIEW_ACTION};
    use chrono::{Duration, Utc};

    fn write(card_id: i32, interval: i32) -> (ProgressWrite, NewStudyLog) {
        let now = Utc::now();
        (
            ProgressWrite {
                user_id: 1,
                card_id,
                state: Sm2State {
                    learning_state: LearningState::Reviewing,
                    interval,
                    ease_factor: 2.5,
                    repetitions: 1,
                },
                next_review: now + Duration::days(interval as i64),
                reviewed_at: now,
            },
            NewStudyLog {
                user_id: 1,
                card_id,
                grade: Grade::Good,
                action: REVIEW_ACTION,
                time_taken_ms: None,
                reviewed_at: now,
            },
        )
    }

    #[test]
    fn version_check_matches_sqlite_store() {
        let store = InMemoryReviewStore::new();
        let (w, l) = write(5, 1);

        let first = store.save_review(&w, None, &l).unwrap();
        assert_eq!(first.version, 1);
        assert!(matches!(
            store.save_review(&w, None, &l),
            Err(StoreError::VersionConflict)
        ));
        assert!(matches!(
            store.save_review(&w, Some(3), &l),
            Err(StoreError::VersionConflict)
        ));

        let second = store.save_review(&w, Some(1), &l).unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.id, first.id);
        assert_eq!(store.study_logs(1, 5).unwrap().len(), 2);
    }

    #[test]
    fn list_orders_by_next_review() {
        let store = InMemoryReviewStore::new();
        for (card, interval) in [(1, 10), (2, 1), (3, 5)] {
            let (w, l) = write(card, interval);
            store.save_review(&w, None, &l).unwrap();
        }
        let order: Vec<i32> = store.list_for_user(1).unwrap().iter().map(|p| p.card_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert!(store.list_for_user(2).unwrap().is_empty());
    }

    #[test]
    fn other_mode_rows_cannot_be_read_or_written() {
        let store = InMemoryReviewStore::new();
        store.hold_in_other_mode(1, 7, StoredLearningState::LearningTyping);

        assert!(matches!(
            store.get(1, 7),
            Err(StoreError::UnsupportedState(label)) if label == "LEARNING_TYPING"
        ));
        let (w, l) = write(7, 1);
        assert!(matches!(
            store.save_review(&w, None, &l),
            Err(StoreError::VersionConflict)
        ));
        assert!(store.list_for_user(1).unwrap().is_empty());
        assert_eq!(store.cards_in_other_modes(1).unwrap(), HashSet::from([7]));
        assert!(store.cards_in_other_modes(2).unwrap().is_empty());
    }

    #[test]
    fn catalog_tracks_deletion() {
        let catalog = InMemoryCardCatalog::new()
            .with_deck(1, 9, "Kanji")
            .with_card(10, 1, "水", "water");

        assert_eq!(catalog.cards_for_user(9, None).unwrap().len(), 1);
        catalog.delete_deck(1);
        assert!(catalog.verify(9, 10).unwrap().deleted);
        assert!(catalog.card(10).unwrap().is_none());
        assert!(catalog.cards_for_user(9, None).unwrap().is_empty());
    }
}
