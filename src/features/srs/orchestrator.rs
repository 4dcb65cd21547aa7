use std::sync::Arc;

use crate::data::models::{
    CardCheck, CardProgress, CardStatus, Grade, NewStudyLog, ProgressWrite, ReviewError,
    StoreError, StudyLog, REVIEW_ACTION,
};
use crate::data::repositories::{CardLookup, ReviewStore};

use super::clock::Clock;
use super::scheduler::schedule;

/// One first try plus one retry after losing a version race.
const MAX_ATTEMPTS: u32 = 2;

/// Applies graded reviews to stored progress.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    cards: Arc<dyn CardLookup>,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
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

    /// Checks with the card catalog that `card_id` exists, is live and sits
    /// in one of the user's decks.
    pub fn authorize(&self, user_id: i32, card_id: i32) -> Result<CardCheck, ReviewError> {
        let check = self.cards.verify(user_id, card_id)?;
        if !check.exists || check.deleted {
            return Err(ReviewError::NotFound(format!("Card {} not found", card_id)));
        }
        if check.deck_owner_id != Some(user_id) {
            return Err(ReviewError::Unauthorized(format!(
                "Card {} belongs to another user's deck",
                card_id
            )));
        }
        Ok(check)
    }

    /// Authorizes, then reviews.
    pub fn review_card(
        &self,
        user_id: i32,
        card_id: i32,
        grade: Grade,
        time_taken_ms: Option<i64>,
    ) -> Result<CardProgress, ReviewError> {
        self.authorize(user_id, card_id)?;
        self.review(user_id, card_id, grade, time_taken_ms)
    }

    /// Schedules one graded attempt and persists progress plus a study log
    /// entry. The caller must have authorized the pair.
    pub fn review(
        &self,
        user_id: i32,
        card_id: i32,
        grade: Grade,
        time_taken_ms: Option<i64>,
    ) -> Result<CardProgress, ReviewError> {
        if time_taken_ms.is_some_and(|ms| ms < 0) {
            return Err(ReviewError::InvalidArgument(
                "timeTakenMs must not be negative".into(),
            ));
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(user_id, card_id, grade, time_taken_ms) {
                Ok(progress) => {
                    log::info!(
                        "User {} graded card {} {}: interval {}d, ease {:.2}, reps {}",
                        user_id,
                        card_id,
                        grade,
                        progress.interval,
                        progress.ease_factor,
                        progress.repetitions
                    );
                    return Ok(progress);
                }
                Err(StoreError::VersionConflict) => {
                    log::warn!(
                        "Concurrent review of card {} by user {} (attempt {}/{})",
                        card_id,
                        user_id,
                        attempt,
                        MAX_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ReviewError::ConcurrencyConflict { user_id, card_id })
    }

    fn attempt(
        &self,
        user_id: i32,
        card_id: i32,
        grade: Grade,
        time_taken_ms: Option<i64>,
    ) -> Result<CardProgress, StoreError> {
        let status = CardStatus::from(self.store.get(user_id, card_id)?);
        let reviewed_at = self.clock.now();
        let scheduled = schedule(&status.sm2_state(), grade, reviewed_at);

        let write = ProgressWrite {
            user_id,
            card_id,
            state: scheduled.state,
            next_review: scheduled.next_review,
            reviewed_at,
        };
        let log = NewStudyLog {
            user_id,
            card_id,
            grade,
            action: REVIEW_ACTION,
            time_taken_ms,
            reviewed_at,
        };

        self.store
            .save_review(&write, status.expected_version(), &log)
    }

    /// Stored progress for a card the user owns.
    pub fn card_progress(&self, user_id: i32, card_id: i32) -> Result<CardProgress, ReviewError> {
        self.authorize(user_id, card_id)?;
        self.store.get(user_id, card_id)?.ok_or_else(|| {
            ReviewError::NotFound(format!("No progress for card {}", card_id))
        })
    }

    /// The user's log entries for a card they own, newest first.
    pub fn history(&self, user_id: i32, card_id: i32) -> Result<Vec<StudyLog>, ReviewError> {
        self.authorize(user_id, card_id)?;
        Ok(self.store.study_logs(user_id, card_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::LearningState;
    use crate::data::repositories::{InMemoryCardCatalog, InMemoryReviewStore};
    use crate::features::srs::clock::FixedClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    const EPS: f64 = 1e-9;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
    }

    fn catalog() -> InMemoryCardCatalog {
        InMemoryCardCatalog::new()
            .with_deck(1, 7, "Capitals")
            .with_deck(2, 8, "Not yours")
            .with_card(100, 1, "France", "Paris")
            .with_card(101, 1, "Peru", "Lima")
            .with_card(200, 2, "Chile", "Santiago")
    }

    fn service() -> (ReviewService, Arc<InMemoryReviewStore>, Arc<FixedClock>) {
        let store = Arc::new(InMemoryReviewStore::new());
        let clock = Arc::new(FixedClock::new(start()));
        let service = ReviewService::new(store.clone(), Arc::new(catalog()), clock.clone());
        (service, store, clock)
    }

    #[test]
    fn first_review_creates_progress_and_log() {
        let (service, store, _) = service();
        let progress = service.review_card(7, 100, Grade::Good, Some(1500)).unwrap();

        assert_eq!(progress.learning_state, LearningState::Reviewing);
        assert_eq!(progress.interval, 1);
        assert_eq!(progress.repetitions, 1);
        assert!((progress.ease_factor - 2.5).abs() < EPS);
        assert_eq!(progress.next_review, start() + Duration::days(1));

        let logs = store.study_logs(7, 100).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].reviewed_at, start());
        assert_eq!(logs[0].time_taken_ms, Some(1500));
        assert_eq!(logs[0].action, REVIEW_ACTION);
    }

    #[test]
    fn reviews_build_on_stored_state() {
        let (service, _, clock) = service();
        service.review(7, 100, Grade::Good, None).unwrap();
        clock.advance(Duration::days(1));
        let second = service.review(7, 100, Grade::Good, None).unwrap();
        assert_eq!(second.interval, 3);
        assert_eq!(second.repetitions, 2);
        assert_eq!(second.next_review, start() + Duration::days(4));

        let lapse = service.review(7, 100, Grade::Again, None).unwrap();
        assert_eq!(lapse.learning_state, LearningState::Relearning);
        assert_eq!(lapse.repetitions, 0);
        assert!((lapse.ease_factor - 2.3).abs() < EPS);
        assert_eq!(service.history(7, 100).unwrap().len(), 3);
    }

    #[test]
    fn users_do_not_share_progress() {
        let (service, _, _) = service();
        service.review(7, 100, Grade::Easy, None).unwrap();
        let other = service.review(9, 100, Grade::Good, None).unwrap();
        assert_eq!(other.repetitions, 1);
        assert_eq!(other.interval, 1);
    }

    #[test]
    fn authorization_is_checked_before_any_write() {
        let (service, store, _) = service();

        let err = service.review_card(7, 200, Grade::Good, None).unwrap_err();
        assert!(matches!(err, ReviewError::Unauthorized(_)));

        let err = service.review_card(7, 999, Grade::Good, None).unwrap_err();
        assert!(matches!(err, ReviewError::NotFound(_)));

        assert!(store.list_for_user(7).unwrap().is_empty());
        assert!(store.study_logs(7, 200).unwrap().is_empty());
        assert!(matches!(
            service.history(7, 200),
            Err(ReviewError::Unauthorized(_))
        ));
    }

    #[test]
    fn negative_time_is_rejected() {
        let (service, store, _) = service();
        let err = service.review(7, 100, Grade::Good, Some(-5)).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidArgument(_)));
        assert!(store.get(7, 100).unwrap().is_none());
    }

    #[test]
    fn missing_progress_is_not_found() {
        let (service, _, _) = service();
        assert!(matches!(
            service.card_progress(7, 100),
            Err(ReviewError::NotFound(_))
        ));
        service.review(7, 100, Grade::Hard, None).unwrap();
        assert_eq!(service.card_progress(7, 100).unwrap().repetitions, 1);
    }

    #[test]
    fn progress_of_deleted_card_is_not_found() {
        let store = Arc::new(InMemoryReviewStore::new());
        let cards = Arc::new(catalog());
        let service =
            ReviewService::new(store.clone(), cards.clone(), Arc::new(FixedClock::new(start())));
        service.review_card(7, 101, Grade::Good, None).unwrap();

        cards.delete_card(101);
        assert!(matches!(
            service.card_progress(7, 101),
            Err(ReviewError::NotFound(_))
        ));
        assert!(store.get(7, 101).unwrap().is_some());
        assert!(matches!(
            service.card_progress(7, 200),
            Err(ReviewError::Unauthorized(_))
        ));
    }

    /// Loses the version race a fixed number of times, then behaves.
    struct RacingStore {
        inner: InMemoryReviewStore,
        conflicts_left: AtomicU32,
    }

    impl ReviewStore for RacingStore {
        fn get(&self, user_id: i32, card_id: i32) -> Result<Option<CardProgress>, StoreError> {
            self.inner.get(user_id, card_id)
        }

        fn save_review(
            &self,
            write: &ProgressWrite,
            expected_version: Option<i32>,
            log: &NewStudyLog,
        ) -> Result<CardProgress, StoreError> {
            let left = self.conflicts_left.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts_left.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::VersionConflict);
            }
            self.inner.save_review(write, expected_version, log)
        }

        fn list_for_user(&self, user_id: i32) -> Result<Vec<CardProgress>, StoreError> {
            self.inner.list_for_user(user_id)
        }

        fn study_logs(&self, user_id: i32, card_id: i32) -> Result<Vec<StudyLog>, StoreError> {
            self.inner.study_logs(user_id, card_id)
        }

        fn cards_in_other_modes(&self, user_id: i32) -> Result<HashSet<i32>, StoreError> {
            self.inner.cards_in_other_modes(user_id)
        }
    }

    fn racing_service(conflicts: u32) -> (ReviewService, Arc<RacingStore>) {
        let store = Arc::new(RacingStore {
            inner: InMemoryReviewStore::new(),
            conflicts_left: AtomicU32::new(conflicts),
        });
        let service = ReviewService::new(
            store.clone(),
            Arc::new(catalog()),
            Arc::new(FixedClock::new(start())),
        );
        (service, store)
    }

    #[test]
    fn one_conflict_is_retried() {
        let (service, store) = racing_service(1);
        let progress = service.review(7, 100, Grade::Good, None).unwrap();
        assert_eq!(progress.repetitions, 1);
        assert_eq!(store.study_logs(7, 100).unwrap().len(), 1);
    }

    #[test]
    fn repeated_conflict_surfaces() {
        let (service, store) = racing_service(2);
        let err = service.review(7, 100, Grade::Good, None).unwrap_err();
        assert!(matches!(
            err,
            ReviewError::ConcurrencyConflict {
                user_id: 7,
                card_id: 100
            }
        ));
        assert!(store.get(7, 100).unwrap().is_none());
        assert!(store.study_logs(7, 100).unwrap().is_empty());
    }
}
