use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Card, CardProgress, ReviewError};

/// Recall quality reported by the user after seeing a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Again => "AGAIN",
            Grade::Hard => "HARD",
            Grade::Good => "GOOD",
            Grade::Easy => "EASY",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AGAIN" => Ok(Grade::Again),
            "HARD" => Ok(Grade::Hard),
            "GOOD" => Ok(Grade::Good),
            "EASY" => Ok(Grade::Easy),
            other => Err(ReviewError::InvalidGrade(other.to_string())),
        }
    }
}

/// Body of `POST /cards/{card_id}/review`.
///
/// The grade stays a string here so an unknown value maps to a 400 with
/// our own error body instead of an extractor rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub grade: String,
    pub time_taken_ms: Option<i64>,
}

/// Optional deck scope for the read-side endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckScope {
    pub deck_id: Option<i32>,
}

/// A due progress row with its card attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCard {
    #[serde(flatten)]
    pub progress: CardProgress,
    pub card: Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub due_count: usize,
    pub new_count: usize,
    pub reviewing_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckDue {
    pub deck_id: i32,
    pub deck_title: String,
    pub due_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueSummary {
    pub total_due_cards: usize,
    pub decks_due: Vec<DeckDue>,
}

/// Number of cards at each mastery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryBreakdown {
    pub new: usize,
    pub still_learning: usize,
    pub almost_done: usize,
    pub mastered: usize,
}
