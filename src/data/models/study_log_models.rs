use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::schema::study_logs;

use super::{Grade, ReviewError, StoreError};

/// Tag stored with each study log entry.
pub const REVIEW_ACTION: &str = "REVIEW";

/// One graded attempt. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyLog {
    pub id: i32,
    pub user_id: i32,
    pub card_id: i32,
    pub grade: Grade,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_ms: Option<i64>,
    pub reviewed_at: DateTime<Utc>,
}

/// A study log entry that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudyLog {
    pub user_id: i32,
    pub card_id: i32,
    pub grade: Grade,
    pub action: &'static str,
    pub time_taken_ms: Option<i64>,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = study_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StudyLogRow {
    pub log_id: i32,
    pub user_id: i32,
    pub card_id: i32,
    pub grade: String,
    pub action: String,
    pub time_taken_ms: Option<i64>,
    pub reviewed_at: NaiveDateTime,
}

impl TryFrom<StudyLogRow> for StudyLog {
    type Error = StoreError;

    fn try_from(row: StudyLogRow) -> Result<Self, Self::Error> {
        let grade = row.grade.parse().map_err(|e: ReviewError| {
            StoreError::Corrupt(format!("study log {}: {}", row.log_id, e))
        })?;
        Ok(StudyLog {
            id: row.log_id,
            user_id: row.user_id,
            card_id: row.card_id,
            grade,
            action: row.action,
            time_taken_ms: row.time_taken_ms,
            reviewed_at: row.reviewed_at.and_utc(),
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = study_logs)]
pub struct NewStudyLogRow<'a> {
    pub user_id: i32,
    pub card_id: i32,
    pub grade: &'a str,
    pub action: &'a str,
    pub time_taken_ms: Option<i64>,
    pub reviewed_at: NaiveDateTime,
}

impl<'a> From<&'a NewStudyLog> for NewStudyLogRow<'a> {
    fn from(log: &'a NewStudyLog) -> Self {
        NewStudyLogRow {
            user_id: log.user_id,
            card_id: log.card_id,
            grade: log.grade.as_str(),
            action: log.action,
            time_taken_ms: log.time_taken_ms,
            reviewed_at: log.reviewed_at.naive_utc(),
        }
    }
}
