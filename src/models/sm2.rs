//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each card has an ease factor (EF) that adjusts after every review
//! - Quality grades 0-2: Reset repetitions, review again in 1 day
//! - Quality grades 3-5: Increase interval progressively (1 day → 6 days → EF multiplier)
//! - EF has a minimum value of 1.3
//! - Higher quality responses lead to longer intervals between reviews
//!
//! The geometric step is `floor(interval * EF)` on the unrounded EF, with a
//! 1e-9 guard so products like `6 * 2.6` land on 15 and not 15.6 - ulp.
//! Intervals are capped at [`MAX_INTERVAL_DAYS`].

use super::quality::Quality;
use super::schedule_state::{MIN_EASE_FACTOR, ScheduleState};
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

/// Longest interval the scheduler hands out, roughly a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const FLOOR_EPSILON: f64 = 1e-9;

/// Validating entry point: rejects ratings outside 0-5 before touching any state.
pub fn compute_next_schedule(
    quality: i64,
    prior: &ScheduleState,
    now: DateTime<Utc>,
) -> Result<ScheduleState> {
    let quality = Quality::new(quality)?;
    Ok(next_state(quality, prior, now))
}

/// Calculates the state a card moves to after being rated `quality` at `now`.
pub fn next_state(quality: Quality, prior: &ScheduleState, now: DateTime<Utc>) -> ScheduleState {
    let ease = next_ease(quality, prior.ease_factor);

    let (interval_days, repetitions) = if !quality.is_correct() {
        // Start from the beginning, see it again tomorrow
        (1, 0)
    } else {
        let reps = prior.repetitions.saturating_add(1);
        let interval = match reps {
            1 => 1,
            2 => 6,
            _ => grow_interval(prior.interval_days, ease),
        };
        (interval, reps)
    };

    let next = ScheduleState {
        ease_factor: ease,
        interval_days,
        repetitions,
        next_review_at: Some(next_review_date(interval_days, now)),
    };
    debug!(
        "sm2: q={} ef {:.2}->{:.2} interval {}->{} reps {}->{}",
        quality,
        prior.ease_factor,
        next.ease_factor,
        prior.interval_days,
        next.interval_days,
        prior.repetitions,
        next.repetitions
    );
    next
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), clamped at 1.3.
fn next_ease(quality: Quality, ease_factor: f64) -> f64 {
    let q = f64::from(quality.value());
    let ease = ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    ease.max(MIN_EASE_FACTOR)
}

/// floor(interval * ease), kept within 1..=MAX_INTERVAL_DAYS.
fn grow_interval(interval_days: u32, ease: f64) -> u32 {
    let grown = (f64::from(interval_days) * ease + FLOOR_EPSILON).floor();
    if grown < 1.0 {
        warn!("sm2: interval {interval_days} grew to 0 days, using 1");
        return 1;
    }
    if grown >= f64::from(MAX_INTERVAL_DAYS) {
        if interval_days < MAX_INTERVAL_DAYS {
            debug!("sm2: interval {grown} capped at {MAX_INTERVAL_DAYS} days");
        }
        return MAX_INTERVAL_DAYS;
    }
    grown as u32
}

/// `from` plus `interval_days` days, saturating at the latest representable instant.
pub fn next_review_date(interval_days: u32, from: DateTime<Utc>) -> DateTime<Utc> {
    from.checked_add_signed(Duration::days(i64::from(interval_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Never-reviewed cards are always due; otherwise due once the review time is reached.
pub fn is_due(next_review_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match next_review_at {
        None => true,
        Some(at) => at <= now,
    }
}

/// Interval in days each rating 0-5 would produce, indexed by rating.
pub fn preview_intervals(prior: &ScheduleState, now: DateTime<Utc>) -> [u32; 6] {
    let mut out = [0; 6];
    for q in Quality::all() {
        out[usize::from(q.value())] = next_state(q, prior, now).interval_days;
    }
    out
}
