//! Study session tracking.
//! A session is opened, counts the outcome of every review recorded in it,
//! and is closed exactly once, which fixes its end time and duration.

use super::quality::Quality;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Review,
    LearnNew,
    Cram,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::LearnNew => "learn_new",
            Self::Cram => "cram",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "review" => Ok(Self::Review),
            "learn_new" => Ok(Self::LearnNew),
            "cram" => Ok(Self::Cram),
            other => Err(Error::InvalidInput(format!(
                "session type must be review, learn_new or cram, got '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed {
        ended_at: DateTime<Utc>,
        duration_seconds: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "SessionRecord", try_from = "SessionRecord")]
pub struct StudySession {
    id: Uuid,
    user_id: String,
    deck_id: String,
    session_type: SessionType,
    started_at: DateTime<Utc>,
    cards_correct: u32,
    cards_incorrect: u32,
    state: SessionState,
}

impl StudySession {
    pub fn start(
        user_id: &str,
        deck_id: &str,
        session_type: SessionType,
        now: DateTime<Utc>,
    ) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            deck_id: deck_id.to_string(),
            session_type,
            started_at: now,
            cards_correct: 0,
            cards_incorrect: 0,
            state: SessionState::Open,
        };
        info!(
            "session {} started: user={} deck={} type={}",
            session.id, session.user_id, session.deck_id, session.session_type
        );
        session
    }

    /// Counts one review. Fails on a closed session.
    pub fn record_outcome(&mut self, quality: Quality) -> Result<()> {
        self.ensure_open("record a review in")?;
        if quality.is_correct() {
            self.cards_correct += 1;
        } else {
            self.cards_incorrect += 1;
        }
        Ok(())
    }

    /// Ends the session at `now`. A session can only be closed once.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_open("close")?;
        // A clock that stepped backwards must not produce a negative duration
        let ended_at = now.max(self.started_at);
        let duration_seconds = (ended_at - self.started_at).num_seconds().max(0) as u64;
        self.state = SessionState::Closed {
            ended_at,
            duration_seconds,
        };
        info!(
            "session {} closed after {}s: {} reviewed, {} correct, {} incorrect",
            self.id,
            duration_seconds,
            self.cards_reviewed(),
            self.cards_correct,
            self.cards_incorrect
        );
        Ok(())
    }

    fn ensure_open(&self, action: &str) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed { .. } => Err(Error::InvalidState(format!(
                "cannot {action} session {}: already closed",
                self.id
            ))),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn deck_id(&self) -> &str {
        &self.deck_id
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            SessionState::Open => None,
            SessionState::Closed { ended_at, .. } => Some(ended_at),
        }
    }

    pub fn duration_seconds(&self) -> Option<u64> {
        match self.state {
            SessionState::Open => None,
            SessionState::Closed {
                duration_seconds, ..
            } => Some(duration_seconds),
        }
    }

    pub fn cards_reviewed(&self) -> u32 {
        self.cards_correct + self.cards_incorrect
    }

    pub fn cards_correct(&self) -> u32 {
        self.cards_correct
    }

    pub fn cards_incorrect(&self) -> u32 {
        self.cards_incorrect
    }

    /// Percentage of reviews answered correctly, 0 when nothing was reviewed.
    pub fn accuracy(&self) -> f64 {
        let reviewed = self.cards_reviewed();
        if reviewed == 0 {
            0.0
        } else {
            f64::from(self.cards_correct) / f64::from(reviewed) * 100.0
        }
    }

    pub fn to_record(&self) -> SessionRecord {
        self.clone().into()
    }
}

/// Flat, persisted view of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub deck_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cards_reviewed: u32,
    pub cards_correct: u32,
    pub cards_incorrect: u32,
    pub total_duration_seconds: Option<u64>,
    pub session_type: SessionType,
}

impl From<StudySession> for SessionRecord {
    fn from(s: StudySession) -> Self {
        Self {
            ended_at: s.ended_at(),
            total_duration_seconds: s.duration_seconds(),
            cards_reviewed: s.cards_reviewed(),
            id: s.id,
            user_id: s.user_id,
            deck_id: s.deck_id,
            started_at: s.started_at,
            cards_correct: s.cards_correct,
            cards_incorrect: s.cards_incorrect,
            session_type: s.session_type,
        }
    }
}

impl TryFrom<SessionRecord> for StudySession {
    type Error = Error;

    fn try_from(r: SessionRecord) -> Result<Self> {
        if r.cards_reviewed != r.cards_correct + r.cards_incorrect {
            return Err(Error::InvalidState(format!(
                "session {}: {} reviewed but {} correct + {} incorrect",
                r.id, r.cards_reviewed, r.cards_correct, r.cards_incorrect
            )));
        }
        let state = match (r.ended_at, r.total_duration_seconds) {
            (None, None) => SessionState::Open,
            (Some(ended_at), Some(duration_seconds)) if ended_at >= r.started_at => {
                SessionState::Closed {
                    ended_at,
                    duration_seconds,
                }
            }
            _ => {
                return Err(Error::InvalidState(format!(
                    "session {}: inconsistent end time and duration",
                    r.id
                )));
            }
        };
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            deck_id: r.deck_id,
            session_type: r.session_type,
            started_at: r.started_at,
            cards_correct: r.cards_correct,
            cards_incorrect: r.cards_incorrect,
            state,
        })
    }
}

/// Session record with derived statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStats {
    pub session: SessionRecord,
    pub accuracy: f64,
    /// Cards of the session's deck still due.
    pub cards_remaining: usize,
}

impl SessionStats {
    pub fn new(session: &StudySession, cards_remaining: usize) -> Self {
        Self {
            session: session.to_record(),
            accuracy: session.accuracy(),
            cards_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 4, 12, 0, 0).unwrap()
    }

    fn q(value: i64) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn test_start() {
        let session = StudySession::start("user-1", "deck-1", SessionType::Review, t0());
        assert!(session.is_open());
        assert_eq!(session.started_at(), t0());
        assert_eq!(session.cards_reviewed(), 0);
        assert_eq!(session.cards_correct(), 0);
        assert_eq!(session.cards_incorrect(), 0);
        assert!(session.ended_at().is_none());
        assert!(session.duration_seconds().is_none());
    }

    #[test]
    fn test_counts_stay_consistent() {
        let mut session = StudySession::start("user-1", "deck-1", SessionType::Cram, t0());
        for quality in [0, 3, 5, 2, 4, 1, 3] {
            session.record_outcome(q(quality)).unwrap();
            assert_eq!(
                session.cards_reviewed(),
                session.cards_correct() + session.cards_incorrect()
            );
        }
        assert_eq!(session.cards_reviewed(), 7);
        assert_eq!(session.cards_correct(), 4);
        assert_eq!(session.cards_incorrect(), 3);
    }

    #[test]
    fn test_single_failed_review_scenario() {
        let mut session = StudySession::start("user-1", "deck-1", SessionType::Review, t0());
        session.record_outcome(q(0)).unwrap();
        session.close(t0() + Duration::seconds(42)).unwrap();

        assert!(!session.is_open());
        assert_eq!(session.duration_seconds(), Some(42));
        assert_eq!(session.ended_at(), Some(t0() + Duration::seconds(42)));
        assert_eq!(session.cards_reviewed(), 1);
        assert_eq!(session.cards_incorrect(), 1);
        assert_eq!(session.cards_correct(), 0);
    }

    #[test]
    fn test_close_twice_fails() {
        let mut session = StudySession::start("user-1", "deck-1", SessionType::Review, t0());
        session.close(t0() + Duration::seconds(10)).unwrap();

        let err = session.close(t0() + Duration::seconds(20)).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(session.duration_seconds(), Some(10));
    }

    #[test]
    fn test_record_after_close_fails() {
        let mut session = StudySession::start("user-1", "deck-1", SessionType::Review, t0());
        session.close(t0()).unwrap();

        let err = session.record_outcome(q(5)).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(session.cards_reviewed(), 0);
    }

    #[test]
    fn test_close_before_start_clamps() {
        let mut session = StudySession::start("user-1", "deck-1", SessionType::Review, t0());
        session.close(t0() - Duration::seconds(5)).unwrap();
        assert_eq!(session.ended_at(), Some(t0()));
        assert_eq!(session.duration_seconds(), Some(0));
    }

    #[test]
    fn test_accuracy() {
        let mut session = StudySession::start("user-1", "deck-1", SessionType::Review, t0());
        assert_eq!(session.accuracy(), 0.0);
        for quality in [5, 4, 3, 0] {
            session.record_outcome(q(quality)).unwrap();
        }
        assert_eq!(session.accuracy(), 75.0);
    }

    #[test]
    fn test_session_type_strings() {
        for t in [SessionType::Review, SessionType::LearnNew, SessionType::Cram] {
            assert_eq!(t.as_str().parse::<SessionType>().unwrap(), t);
        }
        assert!(matches!(
            "speed".parse::<SessionType>(),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(
            serde_json::to_value(SessionType::LearnNew).unwrap(),
            "learn_new"
        );
    }

    #[test]
    fn test_record_field_names() {
        let mut session = StudySession::start("user-1", "deck-1", SessionType::LearnNew, t0());
        session.record_outcome(q(4)).unwrap();
        let value = serde_json::to_value(&session).unwrap();

        assert_eq!(value["cards_reviewed"], 1);
        assert_eq!(value["cards_correct"], 1);
        assert_eq!(value["cards_incorrect"], 0);
        assert!(value["ended_at"].is_null());
        assert!(value["total_duration_seconds"].is_null());
        assert_eq!(value["session_type"], "learn_new");
    }

    #[test]
    fn test_restore_rejects_broken_counts() {
        let mut record =
            StudySession::start("user-1", "deck-1", SessionType::Review, t0()).to_record();
        record.cards_reviewed = 3;
        assert!(StudySession::try_from(record).is_err());
    }

    #[test]
    fn test_restore_closed() {
        let mut session = StudySession::start("user-1", "deck-1", SessionType::Review, t0());
        session.record_outcome(q(3)).unwrap();
        session.close(t0() + Duration::seconds(90)).unwrap();

        let restored = StudySession::try_from(session.to_record()).unwrap();
        assert_eq!(restored, session);
    }
}
