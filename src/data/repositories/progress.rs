use std::collections::HashSet;

use diesel::prelude::*;

use crate::data::models::{
    CardProgress, CardProgressRow, NewCardProgressRow, NewStudyLog, NewStudyLogRow,
    ProgressWrite, StoreError, StoredLearningState, StudyLog, StudyLogRow,
};
use crate::db::DbPool;
use crate::schema::{card_progress, study_logs};

use super::ReviewStore;

/// Diesel-backed progress store.
///
/// Writes run inside `BEGIN IMMEDIATE` so the version check, the upsert and
/// the log insert commit or roll back together.
#[derive(Clone)]
pub struct SqliteReviewStore {
    pool: DbPool,
}

impl SqliteReviewStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn load(
        conn: &mut SqliteConnection,
        user_id: i32,
        card_id: i32,
    ) -> Result<Option<CardProgress>, StoreError> {
        card_progress::table
            .filter(card_progress::user_id.eq(user_id))
            .filter(card_progress::card_id.eq(card_id))
            .select(CardProgressRow::as_select())
            .first::<CardProgressRow>(conn)
            .optional()?
            .map(CardProgress::try_from)
            .transpose()
    }

    fn insert_first(conn: &mut SqliteConnection, write: &ProgressWrite) -> Result<usize, StoreError> {
        let at = write.reviewed_at.naive_utc();
        let row = NewCardProgressRow {
            user_id: write.user_id,
            card_id: write.card_id,
            learning_state: StoredLearningState::from(write.state.learning_state).as_str(),
            review_interval: write.state.interval,
            ease_factor: write.state.ease_factor,
            repetitions: write.state.repetitions,
            next_review: write.next_review.naive_utc(),
            version: 1,
            created_at: at,
            updated_at: at,
        };

        Ok(diesel::insert_into(card_progress::table)
            .values(&row)
            .on_conflict((card_progress::user_id, card_progress::card_id))
            .do_nothing()
            .execute(conn)?)
    }

    fn update_matching(
        conn: &mut SqliteConnection,
        write: &ProgressWrite,
        expected_version: i32,
    ) -> Result<usize, StoreError> {
        let target = card_progress::table
            .filter(card_progress::user_id.eq(write.user_id))
            .filter(card_progress::card_id.eq(write.card_id))
            .filter(card_progress::version.eq(expected_version));

        Ok(diesel::update(target)
            .set((
                card_progress::learning_state
                    .eq(StoredLearningState::from(write.state.learning_state).as_str()),
                card_progress::review_interval.eq(write.state.interval),
                card_progress::ease_factor.eq(write.state.ease_factor),
                card_progress::repetitions.eq(write.state.repetitions),
                card_progress::next_review.eq(write.next_review.naive_utc()),
                card_progress::version.eq(expected_version + 1),
                card_progress::updated_at.eq(write.reviewed_at.naive_utc()),
            ))
            .execute(conn)?)
    }
}

impl ReviewStore for SqliteReviewStore {
    fn get(&self, user_id: i32, card_id: i32) -> Result<Option<CardProgress>, StoreError> {
        let mut conn = self.pool.get()?;
        Self::load(&mut conn, user_id, card_id)
    }

    fn save_review(
        &self,
        write: &ProgressWrite,
        expected_version: Option<i32>,
        log: &NewStudyLog,
    ) -> Result<CardProgress, StoreError> {
        let mut conn = self.pool.get()?;
        conn.immediate_transaction(|conn| {
            let written = match expected_version {
                None => Self::insert_first(conn, write)?,
                Some(version) => Self::update_matching(conn, write, version)?,
            };
            if written == 0 {
                return Err(StoreError::VersionConflict);
            }

            diesel::insert_into(study_logs::table)
                .values(NewStudyLogRow::from(log))
                .execute(conn)?;

            Self::load(conn, write.user_id, write.card_id)?.ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "progress for user {} card {} vanished after write",
                    write.user_id, write.card_id
                ))
            })
        })
    }

    fn list_for_user(&self, user_id: i32) -> Result<Vec<CardProgress>, StoreError> {
        let mut conn = self.pool.get()?;
        let rows = card_progress::table
            .filter(card_progress::user_id.eq(user_id))
            .order_by((card_progress::next_review.asc(), card_progress::id.asc()))
            .select(CardProgressRow::as_select())
            .load::<CardProgressRow>(&mut conn)?;

        let mut progress = Vec::with_capacity(rows.len());
        for row in rows {
            let row_id = row.id;
            match CardProgress::try_from(row) {
                Ok(p) => progress.push(p),
                Err(StoreError::UnsupportedState(state)) => {
                    log::warn!("Skipping progress row {} in state {}", row_id, state);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(progress)
    }

    fn study_logs(&self, user_id: i32, card_id: i32) -> Result<Vec<StudyLog>, StoreError> {
        let mut conn = self.pool.get()?;
        study_logs::table
            .filter(study_logs::user_id.eq(user_id))
            .filter(study_logs::card_id.eq(card_id))
            .order_by((study_logs::reviewed_at.desc(), study_logs::log_id.desc()))
            .select(StudyLogRow::as_select())
            .load::<StudyLogRow>(&mut conn)?
            .into_iter()
            .map(StudyLog::try_from)
            .collect()
    }

    fn cards_in_other_modes(&self, user_id: i32) -> Result<HashSet<i32>, StoreError> {
        let mut conn = self.pool.get()?;
        let scheduled = [
            StoredLearningState::New.as_str(),
            StoredLearningState::Reviewing.as_str(),
            StoredLearningState::Relearning.as_str(),
        ];
        Ok(card_progress::table
            .filter(card_progress::user_id.eq(user_id))
            .filter(card_progress::learning_state.ne_all(scheduled))
            .select(card_progress::card_id)
            .load::<i32>(&mut conn)?
            .into_iter()
            .collect())
    }
}
