use diesel::prelude::*;

use crate::data::models::{Card, CardCheck, CardRef, DeckRef, StoreError};
use crate::db::DbPool;
use crate::schema::{cards, decks};

use super::CardLookup;

/// Read-only view of the site's `decks` and `cards` tables.
#[derive(Clone)]
pub struct SqliteCardCatalog {
    pool: DbPool,
}

impl SqliteCardCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CardLookup for SqliteCardCatalog {
    fn verify(&self, _user_id: i32, card_id: i32) -> Result<CardCheck, StoreError> {
        let mut conn = self.pool.get()?;
        let found = cards::table
            .inner_join(decks::table)
            .filter(cards::card_id.eq(card_id))
            .select((cards::deck_id, cards::deleted, decks::deleted, decks::user_id))
            .first::<(i32, bool, bool, i32)>(&mut conn)
            .optional()?;

        Ok(match found {
            None => CardCheck::missing(),
            Some((deck_id, card_deleted, deck_deleted, owner)) => CardCheck {
                exists: true,
                deleted: card_deleted || deck_deleted,
                deck_id: Some(deck_id),
                deck_owner_id: Some(owner),
            },
        })
    }

    fn card(&self, card_id: i32) -> Result<Option<Card>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(cards::table
            .inner_join(decks::table)
            .filter(cards::card_id.eq(card_id))
            .filter(cards::deleted.eq(false))
            .filter(decks::deleted.eq(false))
            .select(Card::as_select())
            .first::<Card>(&mut conn)
            .optional()?)
    }

    fn cards_for_user(
        &self,
        user_id: i32,
        deck_id: Option<i32>,
    ) -> Result<Vec<CardRef>, StoreError> {
        let mut conn = self.pool.get()?;
        let mut query = cards::table
            .inner_join(decks::table)
            .filter(decks::user_id.eq(user_id))
            .filter(decks::deleted.eq(false))
            .filter(cards::deleted.eq(false))
            .select((cards::card_id, cards::deck_id))
            .order_by(cards::card_id.asc())
            .into_boxed();

        if let Some(deck_id) = deck_id {
            query = query.filter(cards::deck_id.eq(deck_id));
        }

        Ok(query
            .load::<(i32, i32)>(&mut conn)?
            .into_iter()
            .map(|(card_id, deck_id)| CardRef { card_id, deck_id })
            .collect())
    }

    fn decks_for_user(&self, user_id: i32) -> Result<Vec<DeckRef>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(decks::table
            .filter(decks::user_id.eq(user_id))
            .filter(decks::deleted.eq(false))
            .order_by(decks::deck_id.asc())
            .select(DeckRef::as_select())
            .load::<DeckRef>(&mut conn)?)
    }
}
