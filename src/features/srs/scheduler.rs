//! SM-2 variant used for flashcard reviews.
//!
//! | grade | repetitions | interval                       | ease          |
//! |-------|-------------|--------------------------------|---------------|
//! | AGAIN | 0           | 1                              | ef - 0.20     |
//! | HARD  | +1          | ceil(iv * 1.2)                 | ef - 0.15     |
//! | GOOD  | +1          | 1 if new, else ceil(iv * ef)   | unchanged     |
//! | EASY  | +1          | 2 if new, else ceil(iv*ef*1.3) | ef + 0.15     |
//!
//! Ease never drops below 1.3 and the interval never drops below one day.

use chrono::{DateTime, Duration, Utc};

use crate::data::models::{Grade, LearningState, Sm2State};

pub const MIN_EASE: f64 = 1.3;
pub const MIN_INTERVAL: i32 = 1;
/// Upper bound on the interval, in days.
pub const MAX_INTERVAL: i32 = 36_500;

const AGAIN_EASE_PENALTY: f64 = 0.20;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;
const HARD_INTERVAL_FACTOR: f64 = 1.2;
const EASY_INTERVAL_FACTOR: f64 = 1.3;

/// Result of one scheduling step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduled {
    pub state: Sm2State,
    pub next_review: DateTime<Utc>,
}

/// Applies `grade` to `current`. Pure: the same inputs always give the same
/// output.
pub fn schedule(current: &Sm2State, grade: Grade, now: DateTime<Utc>) -> Scheduled {
    let ef = current.ease_factor;
    let iv = current.interval;

    let state = match grade {
        Grade::Again => Sm2State {
            learning_state: LearningState::Relearning,
            interval: MIN_INTERVAL,
            ease_factor: (ef - AGAIN_EASE_PENALTY).max(MIN_EASE),
            repetitions: 0,
        },
        Grade::Hard => Sm2State {
            learning_state: LearningState::Reviewing,
            interval: grow(iv as f64 * HARD_INTERVAL_FACTOR),
            ease_factor: (ef - HARD_EASE_PENALTY).max(MIN_EASE),
            repetitions: current.repetitions + 1,
        },
        Grade::Good => Sm2State {
            learning_state: LearningState::Reviewing,
            interval: if iv == 0 {
                MIN_INTERVAL
            } else {
                grow(iv as f64 * ef)
            },
            ease_factor: ef,
            repetitions: current.repetitions + 1,
        },
        Grade::Easy => Sm2State {
            learning_state: LearningState::Reviewing,
            interval: if iv == 0 {
                2 * MIN_INTERVAL
            } else {
                grow(iv as f64 * ef * EASY_INTERVAL_FACTOR)
            },
            ease_factor: ef + EASY_EASE_BONUS,
            repetitions: current.repetitions + 1,
        },
    };

    Scheduled {
        state,
        next_review: now + Duration::days(state.interval as i64),
    }
}

fn grow(days: f64) -> i32 {
    let days = days.ceil();
    if days >= MAX_INTERVAL as f64 {
        MAX_INTERVAL
    } else {
        (days as i32).max(MIN_INTERVAL)
    }
}
