pub mod classifier;
pub mod clock;
pub mod error_responses;
pub mod orchestrator;
pub mod scheduler;

pub use classifier::{classify, mastery_of, DueSetClassifier, MasteryLevel};
pub use clock::{Clock, FixedClock, SystemClock};
pub use orchestrator::ReviewService;
pub use scheduler::{schedule, Scheduled, MAX_INTERVAL, MIN_EASE, MIN_INTERVAL};
