//! Recall quality ratings.
//!
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but the answer felt familiar once shown
//! - 2: Incorrect, but the answer was easy to remember once shown
//! - 3: Correct with serious difficulty
//! - 4: Correct after hesitation
//! - 5: Perfect, immediate recall
//!
//! 3-5 count as correct, 0-2 as incorrect.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A quality rating known to be within 0-5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidInput(format!(
                "quality must be between 0 and 5, got {value}"
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_correct(self) -> bool {
        self.0 >= 3
    }

    /// Maps a plain right/wrong answer to a rating, for callers that do not
    /// ask the learner for a 0-5 grade.
    pub fn from_answer(correct: bool, difficulty: Difficulty) -> Self {
        if !correct {
            return Self(0);
        }
        match difficulty {
            Difficulty::Easy => Self(5),
            Difficulty::Normal => Self(4),
            Difficulty::Hard => Self(3),
        }
    }

    /// All ratings, lowest first.
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=Self::MAX).map(Self)
    }
}

impl TryFrom<i64> for Quality {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Perceived difficulty of a correct answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Case-insensitive parse; anything unrecognised is `Normal`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            other => Err(Error::InvalidInput(format!("unknown difficulty '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(Quality::new(6), Err(Error::InvalidInput(_))));
        assert!(matches!(Quality::new(-1), Err(Error::InvalidInput(_))));
        assert_eq!(Quality::new(0).unwrap().value(), 0);
        assert_eq!(Quality::new(5).unwrap().value(), 5);
    }

    #[test]
    fn test_correctness_boundary() {
        assert!(!Quality::new(2).unwrap().is_correct());
        assert!(Quality::new(3).unwrap().is_correct());
    }

    #[test]
    fn test_from_answer() {
        assert_eq!(Quality::from_answer(true, Difficulty::Easy).value(), 5);
        assert_eq!(Quality::from_answer(true, Difficulty::Normal).value(), 4);
        assert_eq!(Quality::from_answer(true, Difficulty::Hard).value(), 3);
        for d in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert_eq!(Quality::from_answer(false, d).value(), 0);
        }
    }

    #[test]
    fn test_difficulty_parse_lenient() {
        assert_eq!(Difficulty::parse_lenient("EASY"), Difficulty::Easy);
        assert_eq!(Difficulty::parse_lenient("hard"), Difficulty::Hard);
        assert_eq!(Difficulty::parse_lenient("unknown"), Difficulty::Normal);
        assert_eq!(
            Quality::from_answer(true, Difficulty::default()).value(),
            4
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let q: Quality = serde_json::from_str("4").unwrap();
        assert_eq!(q.value(), 4);
        assert!(serde_json::from_str::<Quality>("9").is_err());
    }
}
