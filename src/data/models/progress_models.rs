use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

use crate::schema::card_progress;

use super::StoreError;

/// Scheduling state of a card as seen by the SM-2 scheduler.
///
/// `New` is never stored: a card without a progress row is new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningState {
    New,
    Reviewing,
    Relearning,
}

impl LearningState {
    pub fn as_str(self) -> &'static str {
        StoredLearningState::from(self).as_str()
    }
}

impl fmt::Display for LearningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every label the `learning_state` column may hold.
///
/// The MCQ and typing labels belong to other study modes sharing the table.
/// They never leave the storage layer: converting them into a
/// [`LearningState`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredLearningState {
    New,
    LearningMcq,
    LearningTyping,
    Reviewing,
    Relearning,
}

impl StoredLearningState {
    pub fn as_str(self) -> &'static str {
        match self {
            StoredLearningState::New => "NEW",
            StoredLearningState::LearningMcq => "LEARNING_MCQ",
            StoredLearningState::LearningTyping => "LEARNING_TYPING",
            StoredLearningState::Reviewing => "REVIEWING",
            StoredLearningState::Relearning => "RELEARNING",
        }
    }
}

impl FromStr for StoredLearningState {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(StoredLearningState::New),
            "LEARNING_MCQ" => Ok(StoredLearningState::LearningMcq),
            "LEARNING_TYPING" => Ok(StoredLearningState::LearningTyping),
            "REVIEWING" => Ok(StoredLearningState::Reviewing),
            "RELEARNING" => Ok(StoredLearningState::Relearning),
            other => Err(StoreError::UnsupportedState(other.to_string())),
        }
    }
}

impl From<LearningState> for StoredLearningState {
    fn from(state: LearningState) -> Self {
        match state {
            LearningState::New => StoredLearningState::New,
            LearningState::Reviewing => StoredLearningState::Reviewing,
            LearningState::Relearning => StoredLearningState::Relearning,
        }
    }
}

impl TryFrom<StoredLearningState> for LearningState {
    type Error = StoreError;

    fn try_from(state: StoredLearningState) -> Result<Self, Self::Error> {
        match state {
            StoredLearningState::New => Ok(LearningState::New),
            StoredLearningState::Reviewing => Ok(LearningState::Reviewing),
            StoredLearningState::Relearning => Ok(LearningState::Relearning),
            StoredLearningState::LearningMcq => {
                Err(StoreError::UnsupportedState("LEARNING_MCQ".into()))
            }
            StoredLearningState::LearningTyping => {
                Err(StoreError::UnsupportedState("LEARNING_TYPING".into()))
            }
        }
    }
}

/// The numeric part of a card's schedule, free of identity and timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sm2State {
    pub learning_state: LearningState,
    pub interval: i32,
    pub ease_factor: f64,
    pub repetitions: i32,
}

impl Sm2State {
    pub const INITIAL_EASE: f64 = 2.5;

    /// State of a card nobody has reviewed yet.
    pub fn seed() -> Self {
        Sm2State {
            learning_state: LearningState::New,
            interval: 0,
            ease_factor: Self::INITIAL_EASE,
            repetitions: 0,
        }
    }
}

/// Everything the store needs to persist one scheduling step.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressWrite {
    pub user_id: i32,
    pub card_id: i32,
    pub state: Sm2State,
    pub next_review: DateTime<Utc>,
    pub reviewed_at: DateTime<Utc>,
}

/// Persisted per-(user, card) scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProgress {
    pub id: i32,
    pub user_id: i32,
    pub card_id: i32,
    pub learning_state: LearningState,
    pub next_review: DateTime<Utc>,
    pub interval: i32,
    pub ease_factor: f64,
    pub repetitions: i32,
    #[serde(skip)]
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CardProgress {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    pub fn sm2_state(&self) -> Sm2State {
        Sm2State {
            learning_state: self.learning_state,
            interval: self.interval,
            ease_factor: self.ease_factor,
            repetitions: self.repetitions,
        }
    }
}

/// Whether a user has ever reviewed a card.
#[derive(Debug, Clone, PartialEq)]
pub enum CardStatus {
    Unseen,
    Seen(CardProgress),
}

impl CardStatus {
    pub fn progress(&self) -> Option<&CardProgress> {
        match self {
            CardStatus::Unseen => None,
            CardStatus::Seen(progress) => Some(progress),
        }
    }

    /// Version the next write must compare against. `None` means the row
    /// must not exist yet.
    pub fn expected_version(&self) -> Option<i32> {
        self.progress().map(|p| p.version)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self {
            CardStatus::Unseen => true,
            CardStatus::Seen(progress) => progress.is_due(now),
        }
    }

    /// Scheduler input: the stored state, or the seed for unseen cards.
    pub fn sm2_state(&self) -> Sm2State {
        match self {
            CardStatus::Unseen => Sm2State::seed(),
            CardStatus::Seen(progress) => progress.sm2_state(),
        }
    }
}

impl From<Option<CardProgress>> for CardStatus {
    fn from(progress: Option<CardProgress>) -> Self {
        match progress {
            Some(p) => CardStatus::Seen(p),
            None => CardStatus::Unseen,
        }
    }
}

/// Database row for `card_progress`. Timestamps are stored as naive UTC.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = card_progress)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CardProgressRow {
    pub id: i32,
    pub user_id: i32,
    pub card_id: i32,
    pub learning_state: String,
    pub review_interval: i32,
    pub ease_factor: f64,
    pub repetitions: i32,
    pub next_review: NaiveDateTime,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<CardProgressRow> for CardProgress {
    type Error = StoreError;

    fn try_from(row: CardProgressRow) -> Result<Self, Self::Error> {
        let stored: StoredLearningState = row.learning_state.parse()?;
        Ok(CardProgress {
            id: row.id,
            user_id: row.user_id,
            card_id: row.card_id,
            learning_state: LearningState::try_from(stored)?,
            next_review: row.next_review.and_utc(),
            interval: row.review_interval,
            ease_factor: row.ease_factor,
            repetitions: row.repetitions,
            version: row.version,
            created_at: row.created_at.and_utc(),
            updated_at: row.updated_at.and_utc(),
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = card_progress)]
pub struct NewCardProgressRow<'a> {
    pub user_id: i32,
    pub card_id: i32,
    pub learning_state: &'a str,
    pub review_interval: i32,
    pub ease_factor: f64,
    pub repetitions: i32,
    pub next_review: NaiveDateTime,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
