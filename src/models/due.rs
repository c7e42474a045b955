//! Picks the cards that should be studied now.
use super::CardId;
use super::schedule_state::ScheduleState;
use super::sm2::is_due;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Returns the ids of due cards, most overdue first.
///
/// Cards that were never reviewed come after all scheduled cards, in the order
/// they were given (the store hands them out in creation order).
pub fn select_due<'a, I>(cards: I, reference: DateTime<Utc>) -> Vec<CardId>
where
    I: IntoIterator<Item = (CardId, &'a ScheduleState)>,
{
    let mut due: Vec<(CardId, Option<DateTime<Utc>>)> = cards
        .into_iter()
        .filter(|(_, state)| is_due(state.next_review_at, reference))
        .map(|(id, state)| (id, state.next_review_at))
        .collect();

    // Stable: equal keys keep input order
    due.sort_by_key(|&(_, at)| (at.is_none(), at));
    due.into_iter().map(|(id, _)| id).collect()
}

/// Card counts for one deck at a reference time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DueCounts {
    pub total_cards: usize,
    pub due_cards: usize,
    /// Never reviewed.
    pub new_cards: usize,
    /// Reviewed at least once but currently without a correct streak.
    pub learning_cards: usize,
}

impl DueCounts {
    pub fn tally<'a, I>(cards: I, reference: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a ScheduleState>,
    {
        cards.into_iter().fold(Self::default(), |mut c, state| {
            c.total_cards += 1;
            if is_due(state.next_review_at, reference) {
                c.due_cards += 1;
            }
            match state.next_review_at {
                None => c.new_cards += 1,
                Some(_) if state.is_learning() => c.learning_cards += 1,
                Some(_) => {}
            }
            c
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 4, 12, 0, 0).unwrap()
    }

    fn scheduled(at: DateTime<Utc>, repetitions: u32) -> ScheduleState {
        ScheduleState {
            repetitions,
            interval_days: 1,
            next_review_at: Some(at),
            ..ScheduleState::default()
        }
    }

    #[test]
    fn test_boundaries() {
        let cards = vec![
            (1, ScheduleState::default()),
            (2, scheduled(now(), 1)),
            (3, scheduled(now() + Duration::seconds(1), 1)),
        ];

        let due = select_due(cards.iter().map(|(id, s)| (*id, s)), now());
        assert_eq!(due, vec![2, 1]);
    }

    #[test]
    fn test_most_overdue_first_then_new_in_input_order() {
        let cards = vec![
            (10, ScheduleState::default()),
            (11, scheduled(now() - Duration::days(1), 2)),
            (12, ScheduleState::default()),
            (13, scheduled(now() - Duration::days(5), 3)),
            (14, scheduled(now() + Duration::days(2), 3)),
            (15, scheduled(now() - Duration::hours(1), 0)),
        ];

        let due = select_due(cards.iter().map(|(id, s)| (*id, s)), now());
        assert_eq!(due, vec![13, 11, 15, 10, 12]);
    }

    #[test]
    fn test_empty() {
        let due = select_due(std::iter::empty::<(CardId, &ScheduleState)>(), now());
        assert!(due.is_empty());
    }

    #[test]
    fn test_tally() {
        let cards = vec![
            ScheduleState::default(),
            ScheduleState::default(),
            scheduled(now() - Duration::days(1), 0),
            scheduled(now() - Duration::days(1), 2),
            scheduled(now() + Duration::days(3), 4),
        ];

        let counts = DueCounts::tally(&cards, now());
        assert_eq!(
            counts,
            DueCounts {
                total_cards: 5,
                due_cards: 4,
                new_cards: 2,
                learning_cards: 1,
            }
        );
    }
}
