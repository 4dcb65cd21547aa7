use diesel::{Queryable, Selectable};
use serde::Serialize;

use crate::schema::{cards, decks};

/// Result of asking the card catalog about a (user, card) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardCheck {
    pub exists: bool,
    pub deleted: bool,
    pub deck_id: Option<i32>,
    pub deck_owner_id: Option<i32>,
}

impl CardCheck {
    pub fn missing() -> Self {
        CardCheck {
            exists: false,
            deleted: false,
            deck_id: None,
            deck_owner_id: None,
        }
    }
}

/// Card payload attached to due listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = cards)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[diesel(column_name = card_id)]
    pub id: i32,
    pub deck_id: i32,
    pub term: String,
    pub definition: String,
}

impl Card {
    /// Stand-in used when a due card can no longer be loaded. Deck ids start
    /// at 1, so deck 0 marks the card as unresolved.
    pub fn placeholder(card_id: i32) -> Self {
        Card {
            id: card_id,
            deck_id: 0,
            term: "Card not found".to_string(),
            definition: String::new(),
        }
    }
}

/// A live card in one of the user's decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardRef {
    pub card_id: i32,
    pub deck_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = decks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DeckRef {
    pub deck_id: i32,
    pub title: String,
}
