pub mod due;
pub mod flashcard;
pub mod quality;
pub mod review_log;
pub mod schedule_state;
pub mod sm2;
pub mod study_session;

/// Row id of a card in the store.
pub type CardId = i64;

pub use due::{DueCounts, select_due};
pub use flashcard::Flashcard;
pub use quality::{Difficulty, Quality};
pub use review_log::{ReviewLog, ReviewSummary};
pub use schedule_state::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR, ScheduleState};
pub use sm2::{MAX_INTERVAL_DAYS, compute_next_schedule};
pub use study_session::{SessionRecord, SessionState, SessionStats, SessionType, StudySession};
