use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameResultError {
    #[error("correct answers ({correct}) exceed questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

/// Outcome of one finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GameResultRecord")]
pub struct GameResult {
    correct: u32,
    total: u32,
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct GameResultRecord {
    correct: u32,
    total: u32,
    date: DateTime<Utc>,
}

impl TryFrom<GameResultRecord> for GameResult {
    type Error = GameResultError;

    fn try_from(record: GameResultRecord) -> Result<Self, Self::Error> {
        Self::new(record.correct, record.total, record.date)
    }
}

impl GameResult {
    /// # Errors
    ///
    /// Returns `GameResultError::CorrectExceedsTotal` if `correct > total`.
    pub fn new(correct: u32, total: u32, date: DateTime<Utc>) -> Result<Self, GameResultError> {
        if correct > total {
            return Err(GameResultError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self {
            correct,
            total,
            date,
        })
    }

    /// The `0/0` placeholder reported before any round was recorded.
    #[must_use]
    pub fn zero(date: DateTime<Utc>) -> Self {
        Self {
            correct: 0,
            total: 0,
            date,
        }
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// More correct answers wins; on a tie the more recent result wins.
    #[must_use]
    pub fn is_better_than(&self, other: &GameResult) -> bool {
        self.correct > other.correct || (self.correct == other.correct && self.date > other.date)
    }
}
