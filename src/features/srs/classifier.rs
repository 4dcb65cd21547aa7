//! Read-side queries: what is due, what is new, how well is it known.
//!
//! Nothing here writes. Counts may mix pre- and post-review state of cards
//! reviewed concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::data::models::{
    Card, CardProgress, CardRef, CardStatus, DeckDue, DueCard, DueSummary, LearningState,
    MasteryBreakdown, ReviewStats, StoreError,
};
use crate::data::repositories::{CardLookup, ReviewStore};

use super::clock::Clock;

pub const ALMOST_DONE_MIN_INTERVAL: i32 = 3;
pub const MASTERED_MIN_INTERVAL: i32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    New,
    StillLearning,
    AlmostDone,
    Mastered,
}

/// Mastery from the two fields that decide it.
pub fn classify(state: LearningState, interval: i32) -> MasteryLevel {
    match state {
        LearningState::New => MasteryLevel::New,
        LearningState::Relearning => MasteryLevel::StillLearning,
        LearningState::Reviewing if interval < ALMOST_DONE_MIN_INTERVAL => {
            MasteryLevel::StillLearning
        }
        LearningState::Reviewing if interval < MASTERED_MIN_INTERVAL => MasteryLevel::AlmostDone,
        LearningState::Reviewing => MasteryLevel::Mastered,
    }
}

pub fn mastery_of(status: &CardStatus) -> MasteryLevel {
    match status {
        CardStatus::Unseen => MasteryLevel::New,
        CardStatus::Seen(p) => classify(p.learning_state, p.interval),
    }
}

#[derive(Clone)]
pub struct DueSetClassifier {
    store: Arc<dyn ReviewStore>,
    cards: Arc<dyn CardLookup>,
    clock: Arc<dyn Clock>,
}

impl DueSetClassifier {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        cards: Arc<dyn CardLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cards,
            clock,
        }
    }

    /// Every live card in scope paired with the user's status for it.
    /// Cards held by another study mode are left out.
    fn scoped(
        &self,
        user_id: i32,
        deck_id: Option<i32>,
    ) -> Result<Vec<(CardRef, CardStatus)>, StoreError> {
        let held = self.store.cards_in_other_modes(user_id)?;
        let scope = self.cards.cards_for_user(user_id, deck_id)?;
        let mut progress: HashMap<i32, CardProgress> = self
            .store
            .list_for_user(user_id)?
            .into_iter()
            .map(|p| (p.card_id, p))
            .collect();

        Ok(scope
            .into_iter()
            .filter(|card| !held.contains(&card.card_id))
            .map(|card| {
                let status = CardStatus::from(progress.remove(&card.card_id));
                (card, status)
            })
            .collect())
    }

    pub fn stats(&self, user_id: i32, deck_id: Option<i32>) -> Result<ReviewStats, StoreError> {
        let now = self.clock.now();
        let mut stats = ReviewStats::default();
        for (_, status) in self.scoped(user_id, deck_id)? {
            if status.is_due(now) {
                stats.due_count += 1;
            }
            match status {
                CardStatus::Unseen => stats.new_count += 1,
                CardStatus::Seen(p) if p.learning_state == LearningState::Reviewing => {
                    stats.reviewing_count += 1
                }
                CardStatus::Seen(_) => {}
            }
        }
        Ok(stats)
    }

    /// Due progress rows, most overdue first, each with its card.
    ///
    /// A card that cannot be loaded is replaced by a placeholder rather than
    /// failing the listing.
    pub fn due_cards(&self, user_id: i32, deck_id: Option<i32>) -> Result<Vec<DueCard>, StoreError> {
        let now = self.clock.now();
        let in_deck: Option<HashSet<i32>> = match deck_id {
            Some(deck) => Some(
                self.cards
                    .cards_for_user(user_id, Some(deck))?
                    .into_iter()
                    .map(|c| c.card_id)
                    .collect(),
            ),
            None => None,
        };

        Ok(self
            .store
            .list_for_user(user_id)?
            .into_iter()
            .filter(|p| p.is_due(now))
            .filter(|p| in_deck.as_ref().is_none_or(|ids| ids.contains(&p.card_id)))
            .map(|progress| {
                let card = self.load_card(progress.card_id);
                DueCard { progress, card }
            })
            .collect())
    }

    fn load_card(&self, card_id: i32) -> Card {
        match self.cards.card(card_id) {
            Ok(Some(card)) => card,
            Ok(None) => {
                log::warn!("Due card {} no longer exists", card_id);
                Card::placeholder(card_id)
            }
            Err(e) => {
                log::warn!("Failed to load due card {}: {}", card_id, e);
                Card::placeholder(card_id)
            }
        }
    }

    /// Due cards per deck, busiest deck first. Decks with nothing due are
    /// left out.
    pub fn due_summary(&self, user_id: i32) -> Result<DueSummary, StoreError> {
        let now = self.clock.now();
        let mut due_by_deck: HashMap<i32, usize> = HashMap::new();
        for (card, status) in self.scoped(user_id, None)? {
            if status.is_due(now) {
                *due_by_deck.entry(card.deck_id).or_default() += 1;
            }
        }

        let mut decks_due: Vec<DeckDue> = self
            .cards
            .decks_for_user(user_id)?
            .into_iter()
            .filter_map(|deck| {
                let due_count = due_by_deck.get(&deck.deck_id).copied().unwrap_or(0);
                (due_count > 0).then_some(DeckDue {
                    deck_id: deck.deck_id,
                    deck_title: deck.title,
                    due_count,
                })
            })
            .collect();
        decks_due.sort_by(|a, b| b.due_count.cmp(&a.due_count));

        Ok(DueSummary {
            total_due_cards: decks_due.iter().map(|d| d.due_count).sum(),
            decks_due,
        })
    }

    pub fn mastery_breakdown(
        &self,
        user_id: i32,
        deck_id: Option<i32>,
    ) -> Result<MasteryBreakdown, StoreError> {
        let mut breakdown = MasteryBreakdown::default();
        for (_, status) in self.scoped(user_id, deck_id)? {
            match mastery_of(&status) {
                MasteryLevel::New => breakdown.new += 1,
                MasteryLevel::StillLearning => breakdown.still_learning += 1,
                MasteryLevel::AlmostDone => breakdown.almost_done += 1,
                MasteryLevel::Mastered => breakdown.mastered += 1,
            }
        }
        Ok(breakdown)
    }
}
