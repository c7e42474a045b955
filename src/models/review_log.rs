//! Append-only record of evaluated reviews and the per-card summary built from them.
use super::quality::Quality;
use super::schedule_state::ScheduleState;
use super::CardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One evaluated attempt: the rating given and the schedule it produced.
///
/// Fields are read-only; a log entry is a historical fact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    id: Uuid,
    card_id: CardId,
    user_id: String,
    #[serde(rename = "review_date")]
    reviewed_at: DateTime<Utc>,
    quality: Quality,
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
}

impl ReviewLog {
    /// Snapshots `result`, the state the card moved to after this review.
    pub fn record(
        card_id: CardId,
        user_id: &str,
        quality: Quality,
        result: &ScheduleState,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id,
            user_id: user_id.to_string(),
            reviewed_at,
            quality,
            ease_factor: result.ease_factor,
            interval_days: result.interval_days,
            repetitions: result.repetitions,
        }
    }

    /// Rebuilds an entry read back from storage.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: Uuid,
        card_id: CardId,
        user_id: String,
        reviewed_at: DateTime<Utc>,
        quality: Quality,
        ease_factor: f64,
        interval_days: u32,
        repetitions: u32,
    ) -> Self {
        Self {
            id,
            card_id,
            user_id,
            reviewed_at,
            quality,
            ease_factor,
            interval_days,
            repetitions,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn reviewed_at(&self) -> DateTime<Utc> {
        self.reviewed_at
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn ease_factor(&self) -> f64 {
        self.ease_factor
    }

    pub fn interval_days(&self) -> u32 {
        self.interval_days
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }
}

/// Aggregate over a card's review history.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub card_id: CardId,
    pub total_reviews: usize,
    pub average_quality: f64,
    /// Correct reviews in a row, counting back from the latest one.
    pub current_streak: usize,
}

impl ReviewSummary {
    /// `logs` must be in chronological order.
    pub fn from_logs(card_id: CardId, logs: &[ReviewLog]) -> Self {
        let total_reviews = logs.len();
        let average_quality = if total_reviews == 0 {
            0.0
        } else {
            let sum: u32 = logs.iter().map(|l| u32::from(l.quality.value())).sum();
            f64::from(sum) / total_reviews as f64
        };
        let current_streak = logs
            .iter()
            .rev()
            .take_while(|l| l.quality.is_correct())
            .count();

        Self {
            card_id,
            total_reviews,
            average_quality,
            current_streak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn log_with(quality: i64, offset_days: i64) -> ReviewLog {
        let at = Utc.with_ymd_and_hms(2025, 11, 4, 12, 0, 0).unwrap() + Duration::days(offset_days);
        ReviewLog::record(
            7,
            "user-1",
            Quality::new(quality).unwrap(),
            &ScheduleState::default(),
            at,
        )
    }

    #[test]
    fn test_record_snapshots_result() {
        let result = ScheduleState {
            ease_factor: 2.6,
            interval_days: 6,
            repetitions: 2,
            next_review_at: None,
        };
        let at = Utc.with_ymd_and_hms(2025, 11, 4, 12, 0, 0).unwrap();
        let log = ReviewLog::record(3, "user-1", Quality::new(5).unwrap(), &result, at);

        assert_eq!(log.card_id(), 3);
        assert_eq!(log.user_id(), "user-1");
        assert_eq!(log.quality().value(), 5);
        assert_eq!(log.ease_factor(), 2.6);
        assert_eq!(log.interval_days(), 6);
        assert_eq!(log.repetitions(), 2);
        assert_eq!(log.reviewed_at(), at);
    }

    #[test]
    fn test_serializes_review_date() {
        let value = serde_json::to_value(log_with(4, 0)).unwrap();
        assert!(value.get("review_date").is_some());
        assert_eq!(value["quality"], 4);
    }

    #[test]
    fn test_summary_empty() {
        let summary = ReviewSummary::from_logs(7, &[]);
        assert_eq!(summary.total_reviews, 0);
        assert_eq!(summary.average_quality, 0.0);
        assert_eq!(summary.current_streak, 0);
    }

    #[test]
    fn test_summary_streak_counts_from_latest() {
        let logs = vec![
            log_with(5, 0),
            log_with(4, 1),
            log_with(1, 2),
            log_with(3, 3),
            log_with(5, 4),
        ];
        let summary = ReviewSummary::from_logs(7, &logs);
        assert_eq!(summary.total_reviews, 5);
        assert_eq!(summary.average_quality, 18.0 / 5.0);
        assert_eq!(summary.current_streak, 2);
    }
}
