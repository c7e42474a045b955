//! Review workflow on top of the SQLite store.
//!
//! One mutex-guarded connection serialises every read-modify-write, so two
//! reviews of the same card (or the same session) can never interleave. The
//! writes caused by a single review (schedule, log entry, session counters)
//! commit together or not at all.

use crate::clock::Clock;
use crate::database::db;
use crate::error::{Error, Result};
use crate::models::sm2::{next_state, preview_intervals};
use crate::models::{
    CardId, DueCounts, Quality, ReviewLog, ReviewSummary, ScheduleState, SessionStats,
    SessionType, StudySession, select_due,
};
use log::debug;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Everything one recorded review produced.
#[derive(Clone, Debug, Serialize)]
pub struct ReviewOutcome {
    pub card_id: CardId,
    pub state: ScheduleState,
    pub log: ReviewLog,
    pub session: StudySession,
}

pub struct ReviewService<C: Clock> {
    conn: Arc<Mutex<Connection>>,
    clock: C,
}

impl<C: Clock> ReviewService<C> {
    pub fn new(conn: Connection, clock: C) -> Self {
        Self::with_shared(Arc::new(Mutex::new(conn)), clock)
    }

    pub fn with_shared(conn: Arc<Mutex<Connection>>, clock: C) -> Self {
        Self { conn, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Direct access to the store, for deck and card setup.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn start_session(
        &self,
        user_id: &str,
        deck_name: &str,
        session_type: SessionType,
    ) -> Result<StudySession> {
        let conn = self.connection();
        if !db::deck_exists(deck_name, &conn)? {
            return Err(Error::NotFound(format!("deck '{deck_name}'")));
        }
        let session = StudySession::start(user_id, deck_name, session_type, self.clock.now());
        db::insert_session(&session, &conn)?;
        Ok(session)
    }

    /// Due cards of a deck, most overdue first, never-reviewed cards last.
    pub fn due_cards(&self, deck_name: &str) -> Result<Vec<CardId>> {
        let conn = self.connection();
        let states = db::get_schedule_states_for_deck(deck_name, &conn)?;
        Ok(select_due(
            states.iter().map(|(id, state)| (*id, state)),
            self.clock.now(),
        ))
    }

    pub fn due_counts(&self, deck_name: &str) -> Result<DueCounts> {
        let conn = self.connection();
        let states = db::get_schedule_states_for_deck(deck_name, &conn)?;
        Ok(DueCounts::tally(
            states.iter().map(|(_, state)| state),
            self.clock.now(),
        ))
    }

    /// Records a rating for `card_id` inside an open session.
    ///
    /// Rejects bad ratings before reading anything. The card must belong to the
    /// session's deck.
    pub fn review_card(
        &self,
        session_id: Uuid,
        card_id: CardId,
        quality: i64,
    ) -> Result<ReviewOutcome> {
        let quality = Quality::new(quality)?;
        let now = self.clock.now();

        let mut conn = self.connection();
        let tx = conn.transaction()?;

        let mut session = db::get_session(session_id, &tx)?;
        session.record_outcome(quality)?;

        let card = db::get_flashcard(card_id, &tx)?;
        if card.deck_name != session.deck_id() {
            return Err(Error::InvalidInput(format!(
                "card {card_id} is in deck '{}', session {session_id} studies '{}'",
                card.deck_name,
                session.deck_id()
            )));
        }

        let prior = db::get_schedule_state(card_id, &tx)?;
        let state = next_state(quality, &prior, now);
        let log = ReviewLog::record(card_id, session.user_id(), quality, &state, now);

        db::update_schedule_state(card_id, &state, &tx)?;
        db::insert_review_log(&log, &tx)?;
        db::update_session(&session, &tx)?;
        tx.commit()?;

        debug!(
            "card {card_id} reviewed in session {session_id}: q={quality}, next in {} days",
            state.interval_days
        );
        Ok(ReviewOutcome {
            card_id,
            state,
            log,
            session,
        })
    }

    pub fn close_session(&self, session_id: Uuid) -> Result<StudySession> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        let mut session = db::get_session(session_id, &tx)?;
        session.close(self.clock.now())?;
        db::update_session(&session, &tx)?;
        tx.commit()?;
        Ok(session)
    }

    pub fn get_session(&self, session_id: Uuid) -> Result<StudySession> {
        db::get_session(session_id, &self.connection())
    }

    /// Session counters plus accuracy and how many cards of its deck are still due.
    pub fn session_stats(&self, session_id: Uuid) -> Result<SessionStats> {
        let session = self.get_session(session_id)?;
        let remaining = self.due_counts(session.deck_id())?.due_cards;
        Ok(SessionStats::new(&session, remaining))
    }

    pub fn card_history(&self, card_id: CardId) -> Result<(Vec<ReviewLog>, ReviewSummary)> {
        let conn = self.connection();
        db::get_flashcard(card_id, &conn)?;
        let logs = db::get_review_logs(card_id, &conn)?;
        let summary = ReviewSummary::from_logs(card_id, &logs);
        Ok((logs, summary))
    }

    /// Interval each rating 0-5 would give the card right now.
    pub fn preview(&self, card_id: CardId) -> Result<[u32; 6]> {
        let state = db::get_schedule_state(card_id, &self.connection())?;
        Ok(preview_intervals(&state, self.clock.now()))
    }
}
