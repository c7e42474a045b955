//! Database operations for the review scheduler
//!
//! Handles SQLite database initialization, card storage, schedule state,
//! the append-only review log and study session rows.
//! Timestamps are stored as unix nanoseconds so a reloaded instant equals the
//! one written. Ease factors are stored with two decimals.

use crate::error::{Error, Result};
use crate::models::{
    CardId, Flashcard, Quality, ReviewLog, ScheduleState, SessionRecord, SessionType, StudySession,
};
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use uuid::Uuid;

/// Opens (or creates) the database file and makes sure all tables exist.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Fresh in-memory database, used by tests and dry runs.
pub fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS decks (
            name TEXT PRIMARY KEY
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_name TEXT NOT NULL,
            term TEXT NOT NULL,
            definition TEXT NOT NULL,
            FOREIGN KEY (deck_name) REFERENCES decks(name),
            UNIQUE(deck_name, term)
        )",
        (),
    )?;

    // One row per card; next_review_date NULL means never reviewed
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedule_state (
            flashcard_id INTEGER PRIMARY KEY,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            next_review_date INTEGER,
            is_learning INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS card_reviews (
            id TEXT PRIMARY KEY,
            card_id INTEGER NOT NULL,
            user_id TEXT NOT NULL,
            review_date INTEGER NOT NULL,
            quality INTEGER NOT NULL CHECK (quality >= 0 AND quality <= 5),
            ease_factor REAL NOT NULL,
            interval_days INTEGER NOT NULL,
            repetitions INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (card_id) REFERENCES flashcards(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS study_sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            deck_id TEXT NOT NULL,
            started_at INTEGER NOT NULL,
            ended_at INTEGER,
            cards_reviewed INTEGER NOT NULL DEFAULT 0,
            cards_correct INTEGER NOT NULL DEFAULT 0,
            cards_incorrect INTEGER NOT NULL DEFAULT 0,
            total_duration_seconds INTEGER,
            session_type TEXT NOT NULL DEFAULT 'review'
                CHECK (session_type IN ('review', 'learn_new', 'cram')),
            FOREIGN KEY (deck_id) REFERENCES decks(name)
        )",
        (),
    )?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_card_reviews_card_user
             ON card_reviews (card_id, user_id);
         CREATE INDEX IF NOT EXISTS idx_card_reviews_user_date
             ON card_reviews (user_id, review_date);
         CREATE INDEX IF NOT EXISTS idx_study_sessions_user ON study_sessions (user_id);
         CREATE INDEX IF NOT EXISTS idx_study_sessions_deck ON study_sessions (deck_id);
         CREATE INDEX IF NOT EXISTS idx_schedule_next_review ON schedule_state (next_review_date);",
    )?;

    Ok(())
}

/// Instants outside 1677-2262 do not fit in i64 nanoseconds and are rejected.
fn to_timestamp(at: DateTime<Utc>) -> Result<i64> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| Error::InvalidInput(format!("timestamp {at} out of storable range")))
}

fn conversion_error<E>(column: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(err))
}

fn timestamp_column(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let nanos: i64 = row.get(column)?;
    Ok(DateTime::from_timestamp_nanos(nanos))
}

fn optional_timestamp_column(
    row: &Row<'_>,
    column: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let nanos: Option<i64> = row.get(column)?;
    Ok(nanos.map(DateTime::from_timestamp_nanos))
}

fn uuid_column(row: &Row<'_>, column: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(column, Type::Text, e))
}

fn round_ease(ease_factor: f64) -> f64 {
    (ease_factor * 100.0).round() / 100.0
}

/// Creates a new deck
pub fn new_deck(name: &str, conn: &Connection) -> Result<()> {
    conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
    info!("deck '{name}' created");
    Ok(())
}

pub fn deck_exists(name: &str, conn: &Connection) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM decks WHERE name = ?1", params![name], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Retrieves all deck names
pub fn get_all_decks(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM decks ORDER BY name")?;
    let decks = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(decks)
}

/// Adds a flashcard to a deck together with a default schedule state.
///
/// Returns the flashcard ID. Adding the same term to a deck twice returns the
/// existing card and leaves its schedule untouched.
pub fn add_flashcard(
    deck_name: &str,
    term: &str,
    definition: &str,
    conn: &Connection,
) -> Result<CardId> {
    conn.execute(
        "INSERT OR IGNORE INTO flashcards (deck_name, term, definition) VALUES (?1, ?2, ?3)",
        params![deck_name, term, definition],
    )?;

    let flashcard_id: CardId = conn.query_row(
        "SELECT id FROM flashcards WHERE deck_name = ?1 AND term = ?2",
        params![deck_name, term],
        |row| row.get(0),
    )?;

    let initial = ScheduleState::default();
    conn.execute(
        "INSERT OR IGNORE INTO schedule_state
            (flashcard_id, ease_factor, interval_days, repetitions, next_review_date, is_learning)
         VALUES (?1, ?2, ?3, ?4, NULL, ?5)",
        params![
            flashcard_id,
            initial.ease_factor,
            initial.interval_days,
            initial.repetitions,
            initial.is_learning()
        ],
    )?;

    Ok(flashcard_id)
}

pub fn get_flashcard(card_id: CardId, conn: &Connection) -> Result<Flashcard> {
    conn.query_row(
        "SELECT id, deck_name, term, definition FROM flashcards WHERE id = ?1",
        params![card_id],
        flashcard_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("card {card_id}")))
}

/// Retrieves all flashcards of a deck in creation order
pub fn get_flashcards_for_deck(deck_name: &str, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(
        "SELECT id, deck_name, term, definition FROM flashcards WHERE deck_name = ?1 ORDER BY id",
    )?;
    let cards = stmt
        .query_map(params![deck_name], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

fn flashcard_from_row(row: &Row<'_>) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        deck_name: row.get(1)?,
        term: row.get(2)?,
        definition: row.get(3)?,
    })
}

fn schedule_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<ScheduleState> {
    Ok(ScheduleState {
        ease_factor: row.get(first)?,
        interval_days: row.get(first + 1)?,
        repetitions: row.get(first + 2)?,
        next_review_at: optional_timestamp_column(row, first + 3)?,
    })
}

pub fn get_schedule_state(card_id: CardId, conn: &Connection) -> Result<ScheduleState> {
    conn.query_row(
        "SELECT ease_factor, interval_days, repetitions, next_review_date
         FROM schedule_state WHERE flashcard_id = ?1",
        params![card_id],
        |row| schedule_from_row(row, 0),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("schedule for card {card_id}")))
}

/// Overwrites a card's schedule with the output of the scheduler
pub fn update_schedule_state(
    card_id: CardId,
    state: &ScheduleState,
    conn: &Connection,
) -> Result<()> {
    let next_review_date = state.next_review_at.map(to_timestamp).transpose()?;
    let updated = conn.execute(
        "UPDATE schedule_state
         SET ease_factor = ?1, interval_days = ?2, repetitions = ?3,
             next_review_date = ?4, is_learning = ?5
         WHERE flashcard_id = ?6",
        params![
            round_ease(state.ease_factor),
            state.interval_days,
            state.repetitions,
            next_review_date,
            state.is_learning(),
            card_id
        ],
    )?;

    if updated == 0 {
        return Err(Error::NotFound(format!("schedule for card {card_id}")));
    }
    Ok(())
}

/// Schedule states of every card in a deck, in card creation order
pub fn get_schedule_states_for_deck(
    deck_name: &str,
    conn: &Connection,
) -> Result<Vec<(CardId, ScheduleState)>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, s.ease_factor, s.interval_days, s.repetitions, s.next_review_date
         FROM flashcards f
         JOIN schedule_state s ON f.id = s.flashcard_id
         WHERE f.deck_name = ?1
         ORDER BY f.id ASC",
    )?;

    let states = stmt
        .query_map(params![deck_name], |row| {
            Ok((row.get::<_, CardId>(0)?, schedule_from_row(row, 1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(states)
}

/// Appends a review log entry. Entries are never updated or deleted here.
pub fn insert_review_log(log: &ReviewLog, conn: &Connection) -> Result<()> {
    let review_date = to_timestamp(log.reviewed_at())?;
    conn.execute(
        "INSERT INTO card_reviews
            (id, card_id, user_id, review_date, quality, ease_factor, interval_days, repetitions)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            log.id().to_string(),
            log.card_id(),
            log.user_id(),
            review_date,
            log.quality().value(),
            round_ease(log.ease_factor()),
            log.interval_days(),
            log.repetitions()
        ],
    )?;
    Ok(())
}

/// Review history of a card, oldest first
pub fn get_review_logs(card_id: CardId, conn: &Connection) -> Result<Vec<ReviewLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, card_id, user_id, review_date, quality, ease_factor, interval_days, repetitions
         FROM card_reviews
         WHERE card_id = ?1
         ORDER BY review_date ASC, rowid ASC",
    )?;

    let logs = stmt
        .query_map(params![card_id], |row| {
            let quality: i64 = row.get(4)?;
            let quality =
                Quality::new(quality).map_err(|e| conversion_error(4, Type::Integer, e))?;
            Ok(ReviewLog::from_parts(
                uuid_column(row, 0)?,
                row.get(1)?,
                row.get(2)?,
                timestamp_column(row, 3)?,
                quality,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(logs)
}

pub fn insert_session(session: &StudySession, conn: &Connection) -> Result<()> {
    let r = session.to_record();
    let started_at = to_timestamp(r.started_at)?;
    let ended_at = r.ended_at.map(to_timestamp).transpose()?;
    conn.execute(
        "INSERT INTO study_sessions
            (id, user_id, deck_id, started_at, ended_at, cards_reviewed, cards_correct,
             cards_incorrect, total_duration_seconds, session_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            r.id.to_string(),
            r.user_id,
            r.deck_id,
            started_at,
            ended_at,
            r.cards_reviewed,
            r.cards_correct,
            r.cards_incorrect,
            r.total_duration_seconds,
            r.session_type.as_str()
        ],
    )?;
    Ok(())
}

pub fn get_session(session_id: Uuid, conn: &Connection) -> Result<StudySession> {
    let record = conn
        .query_row(
            "SELECT id, user_id, deck_id, started_at, ended_at, cards_reviewed, cards_correct,
                    cards_incorrect, total_duration_seconds, session_type
             FROM study_sessions WHERE id = ?1",
            params![session_id.to_string()],
            |row| {
                let session_type: String = row.get(9)?;
                let session_type = session_type
                    .parse::<SessionType>()
                    .map_err(|e| conversion_error(9, Type::Text, e))?;
                Ok(SessionRecord {
                    id: uuid_column(row, 0)?,
                    user_id: row.get(1)?,
                    deck_id: row.get(2)?,
                    started_at: timestamp_column(row, 3)?,
                    ended_at: optional_timestamp_column(row, 4)?,
                    cards_reviewed: row.get(5)?,
                    cards_correct: row.get(6)?,
                    cards_incorrect: row.get(7)?,
                    total_duration_seconds: row.get(8)?,
                    session_type,
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("session {session_id}")))?;

    StudySession::try_from(record)
}

/// Writes the counters and end boundary of an existing session
pub fn update_session(session: &StudySession, conn: &Connection) -> Result<()> {
    let r = session.to_record();
    let ended_at = r.ended_at.map(to_timestamp).transpose()?;
    let updated = conn.execute(
        "UPDATE study_sessions
         SET ended_at = ?1, cards_reviewed = ?2, cards_correct = ?3, cards_incorrect = ?4,
             total_duration_seconds = ?5
         WHERE id = ?6",
        params![
            ended_at,
            r.cards_reviewed,
            r.cards_correct,
            r.cards_incorrect,
            r.total_duration_seconds,
            r.id.to_string()
        ],
    )?;

    if updated == 0 {
        return Err(Error::NotFound(format!("session {}", r.id)));
    }
    Ok(())
}
