//! Per-card SM-2 scheduling parameters.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest ease factor a card can reach.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor given to newly created cards.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Scheduling state of one card. Replaced wholesale by `sm2::next_state`,
/// never edited field by field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScheduleRecord", into = "ScheduleRecord")]
pub struct ScheduleState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    /// `None` until the card is reviewed for the first time.
    pub next_review_at: Option<DateTime<Utc>>,
}

impl ScheduleState {
    pub fn is_learning(&self) -> bool {
        self.repetitions == 0
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
            next_review_at: None,
        }
    }
}

/// Storage shape of [`ScheduleState`], with the derived `is_learning` flag.
#[derive(Serialize, Deserialize)]
struct ScheduleRecord {
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
    next_review_date: Option<DateTime<Utc>>,
    #[serde(default)]
    is_learning: bool,
}

impl From<ScheduleRecord> for ScheduleState {
    fn from(r: ScheduleRecord) -> Self {
        // is_learning is recomputed from repetitions
        Self {
            ease_factor: r.ease_factor.max(MIN_EASE_FACTOR),
            interval_days: r.interval_days,
            repetitions: r.repetitions,
            next_review_at: r.next_review_date,
        }
    }
}

impl From<ScheduleState> for ScheduleRecord {
    fn from(s: ScheduleState) -> Self {
        Self {
            is_learning: s.is_learning(),
            ease_factor: s.ease_factor,
            interval_days: s.interval_days,
            repetitions: s.repetitions,
            next_review_date: s.next_review_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = ScheduleState::default();
        assert_eq!(state.ease_factor, 2.5);
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.repetitions, 0);
        assert!(state.next_review_at.is_none());
        assert!(state.is_learning());
    }

    #[test]
    fn test_serializes_persisted_field_names() {
        let state = ScheduleState {
            ease_factor: 2.36,
            interval_days: 6,
            repetitions: 2,
            next_review_at: None,
        };

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["ease_factor"], 2.36);
        assert_eq!(value["interval_days"], 6);
        assert_eq!(value["repetitions"], 2);
        assert!(value["next_review_date"].is_null());
        assert_eq!(value["is_learning"], false);
    }

    #[test]
    fn test_deserialize_ignores_stale_is_learning() {
        let json = r#"{
            "ease_factor": 2.5,
            "interval_days": 1,
            "repetitions": 0,
            "next_review_date": null,
            "is_learning": false
        }"#;

        let state: ScheduleState = serde_json::from_str(json).unwrap();
        assert!(state.is_learning());
    }
}
