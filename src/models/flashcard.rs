//! Flashcard is a pair <term, definition> stored in a named deck.
//! Its scheduling lives separately in `ScheduleState`.
use super::CardId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: CardId,
    pub deck_name: String,
    pub term: String,
    pub definition: String,
}
