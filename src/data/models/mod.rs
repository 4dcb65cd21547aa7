pub mod card_models;
pub mod error_models;
pub mod progress_models;
pub mod review_models;
pub mod study_log_models;

pub use card_models::{Card, CardCheck, CardRef, DeckRef};
pub use error_models::{ReviewError, StoreError};
pub use progress_models::{
    CardProgress, CardProgressRow, CardStatus, LearningState, NewCardProgressRow, ProgressWrite,
    Sm2State, StoredLearningState,
};
pub use review_models::{
    DeckDue, DeckScope, DueCard, DueSummary, Grade, MasteryBreakdown, ReviewRequest, ReviewStats,
};
pub use study_log_models::{NewStudyLog, NewStudyLogRow, StudyLog, StudyLogRow, REVIEW_ACTION};
