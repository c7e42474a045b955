pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{
    CardId, DueCounts, Quality, ReviewLog, ReviewSummary, ScheduleState, SessionStats,
    SessionType, StudySession, compute_next_schedule, select_due,
};
pub use service::{ReviewOutcome, ReviewService};
