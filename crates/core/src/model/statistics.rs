use chrono::{DateTime, Utc};

use super::game_result::{GameResult, GameResultError};

/// Lifetime totals across every recorded round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatisticsAggregate {
    pub correct_total: u64,
    pub question_total: u64,
    pub games_played: u64,
    /// `None` until the first round is recorded.
    pub best_game: Option<GameResult>,
}

impl StatisticsAggregate {
    /// Percentage of correct answers, `0.0` when nothing was asked yet.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_accuracy(&self) -> f64 {
        if self.question_total == 0 {
            return 0.0;
        }
        self.correct_total as f64 / self.question_total as f64 * 100.0
    }

    /// Fold one finished round into the totals.
    ///
    /// # Errors
    ///
    /// Returns `GameResultError` if `correct > total`; the aggregate is left untouched.
    pub fn record(
        &mut self,
        correct: u32,
        total: u32,
        at: DateTime<Utc>,
    ) -> Result<GameResult, GameResultError> {
        let result = GameResult::new(correct, total, at)?;

        self.games_played = self.games_played.saturating_add(1);
        self.correct_total = self.correct_total.saturating_add(u64::from(correct));
        self.question_total = self.question_total.saturating_add(u64::from(total));

        let replace = self
            .best_game
            .as_ref()
            .is_none_or(|best| result.is_better_than(best));
        if replace {
            self.best_game = Some(result);
        }

        Ok(result)
    }
}
