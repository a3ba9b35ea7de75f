use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{GameResult, StatisticsAggregate};
use serde::Serialize;
use storage::repository::{KeyValueStore, StorageError};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::error::StatisticsError;

mod keys {
    pub const CORRECT_ANSWERS: &str = "correctAnswers";
    pub const TOTAL_QUESTIONS: &str = "totalQuestions";
    pub const GAMES_COUNT: &str = "gamesCount";
    pub const BEST_GAME: &str = "bestGame";
}

/// Outcome of [`StatisticsService::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedRound {
    /// The round just played, stamped with the service clock.
    pub result: GameResult,
    pub totals: StatisticsAggregate,
}

/// Persisted lifetime statistics: answer totals, games played and the best game.
pub struct StatisticsService {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
    record_lock: Mutex<()>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            store,
            record_lock: Mutex::new(()),
        }
    }

    /// Add one finished round and return it along with the updated totals.
    ///
    /// Calls are serialized, so concurrent rounds never lose each other's counts.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` if stored values are corrupt, `correct > total`, or
    /// persistence fails. Nothing is written in that case.
    #[instrument(skip(self))]
    pub async fn record(
        &self,
        correct: u32,
        total: u32,
    ) -> Result<RecordedRound, StatisticsError> {
        let _guard = self.record_lock.lock().await;

        let mut stats = self.snapshot().await?;
        let result = stats.record(correct, total, self.clock.now())?;

        let mut entries = vec![
            (keys::CORRECT_ANSWERS, stats.correct_total.to_string()),
            (keys::TOTAL_QUESTIONS, stats.question_total.to_string()),
            (keys::GAMES_COUNT, stats.games_played.to_string()),
        ];
        if let Some(best) = stats.best_game {
            entries.push((keys::BEST_GAME, encode(&best)?));
        }
        self.store.set_many(&entries).await?;

        info!(
            correct = result.correct(),
            total = result.total(),
            games_played = stats.games_played,
            new_best = stats.best_game == Some(result),
            "round recorded"
        );
        Ok(RecordedRound {
            result,
            totals: stats,
        })
    }

    /// Read every persisted field at once.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` for storage failures or corrupt values.
    pub async fn snapshot(&self) -> Result<StatisticsAggregate, StatisticsError> {
        Ok(StatisticsAggregate {
            correct_total: self.counter(keys::CORRECT_ANSWERS).await?,
            question_total: self.counter(keys::TOTAL_QUESTIONS).await?,
            games_played: self.counter(keys::GAMES_COUNT).await?,
            best_game: self.recorded_best_game().await?,
        })
    }

    /// # Errors
    ///
    /// Returns `StatisticsError` for storage failures or a corrupt counter.
    pub async fn games_played(&self) -> Result<u64, StatisticsError> {
        self.counter(keys::GAMES_COUNT).await
    }

    /// Best recorded game, or the `0/0` placeholder stamped "now" if none exists yet.
    ///
    /// Use [`StatisticsService::recorded_best_game`] to tell the two apart.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` for storage failures or a corrupt blob.
    pub async fn best_game(&self) -> Result<GameResult, StatisticsError> {
        let best = self.recorded_best_game().await?;
        Ok(best.unwrap_or_else(|| GameResult::zero(self.clock.now())))
    }

    /// # Errors
    ///
    /// Returns `StatisticsError` for storage failures or a corrupt blob.
    pub async fn recorded_best_game(&self) -> Result<Option<GameResult>, StatisticsError> {
        let Some(raw) = self.store.get(keys::BEST_GAME).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<GameResult>(&raw) {
            Ok(best) => Ok(Some(best)),
            Err(_) => Err(StatisticsError::Corrupt {
                key: keys::BEST_GAME,
                value: raw,
            }),
        }
    }

    /// Lifetime percentage of correct answers.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` for storage failures or corrupt counters.
    pub async fn total_accuracy(&self) -> Result<f64, StatisticsError> {
        Ok(self.snapshot().await?.total_accuracy())
    }

    async fn counter(&self, key: &'static str) -> Result<u64, StatisticsError> {
        match self.store.get(key).await? {
            None => Ok(0),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(value) => Ok(value),
                Err(_) => Err(StatisticsError::Corrupt { key, value: raw }),
            },
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, StatisticsError> {
    serde_json::to_string(value)
        .map_err(|err| StatisticsError::Storage(StorageError::Serialization(err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryKeyValueStore;

    fn service(store: &InMemoryKeyValueStore, clock: Clock) -> StatisticsService {
        StatisticsService::new(clock, Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn fresh_store_reports_zero_sentinel() {
        let store = InMemoryKeyValueStore::new();
        let stats = service(&store, fixed_clock());

        assert_eq!(stats.games_played().await.unwrap(), 0);
        assert_eq!(stats.total_accuracy().await.unwrap(), 0.0);
        assert_eq!(stats.recorded_best_game().await.unwrap(), None);
        assert_eq!(stats.best_game().await.unwrap(), GameResult::zero(fixed_now()));
    }

    #[tokio::test]
    async fn reads_do_not_write() {
        let store = InMemoryKeyValueStore::new();
        let stats = service(&store, fixed_clock());

        let _ = stats.total_accuracy().await.unwrap();
        let _ = stats.best_game().await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn record_accumulates_totals() {
        let store = InMemoryKeyValueStore::new();
        let stats = service(&store, fixed_clock());

        stats.record(3, 3).await.unwrap();
        assert_eq!(stats.total_accuracy().await.unwrap(), 100.0);

        let recorded = stats.record(1, 5).await.unwrap();
        assert_eq!(recorded.result.correct(), 1);
        assert_eq!(recorded.result.date(), fixed_now());
        let snapshot = recorded.totals;
        assert_eq!(snapshot.games_played, 2);
        assert_eq!(snapshot.correct_total, 4);
        assert_eq!(snapshot.question_total, 8);
        assert!((stats.total_accuracy().await.unwrap() - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn tie_on_correct_prefers_latest_game() {
        let store = InMemoryKeyValueStore::new();
        let clock = fixed_clock();
        let stats = service(&store, clock.clone());

        stats.record(5, 10).await.unwrap();
        clock.advance(Duration::minutes(1));
        stats.record(5, 10).await.unwrap();

        let best = stats.best_game().await.unwrap();
        assert_eq!(best.correct(), 5);
        assert_eq!(best.date(), fixed_now() + Duration::minutes(1));
    }

    #[tokio::test]
    async fn worse_game_keeps_best() {
        let store = InMemoryKeyValueStore::new();
        let clock = fixed_clock();
        let stats = service(&store, clock.clone());

        stats.record(9, 10).await.unwrap();
        clock.advance(Duration::minutes(1));
        stats.record(2, 10).await.unwrap();

        let best = stats.best_game().await.unwrap();
        assert_eq!(best.correct(), 9);
        assert_eq!(best.date(), fixed_now());
    }

    #[tokio::test]
    async fn totals_survive_a_new_service_instance() {
        let store = InMemoryKeyValueStore::new();
        service(&store, fixed_clock()).record(7, 10).await.unwrap();

        let restarted = service(&store, fixed_clock());

        let snapshot = restarted.snapshot().await.unwrap();
        assert_eq!(snapshot.games_played, 1);
        assert_eq!(snapshot.correct_total, 7);
        assert_eq!(snapshot.best_game.unwrap().correct(), 7);
    }

    #[tokio::test]
    async fn invalid_round_writes_nothing() {
        let store = InMemoryKeyValueStore::new();
        let stats = service(&store, fixed_clock());

        let err = stats.record(4, 3).await.unwrap_err();

        assert!(matches!(err, StatisticsError::InvalidResult(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn unencodable_value_is_a_serialization_error() {
        let mut by_pair = std::collections::HashMap::new();
        by_pair.insert((1_u8, 2_u8), 3_u8);

        let err = encode(&by_pair).unwrap_err();

        assert!(matches!(
            err,
            StatisticsError::Storage(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_counter_is_reported() {
        let store = InMemoryKeyValueStore::new();
        store.set(keys::GAMES_COUNT, "lots").await.unwrap();
        let stats = service(&store, fixed_clock());

        let err = stats.games_played().await.unwrap_err();

        assert!(matches!(
            err,
            StatisticsError::Corrupt { key: keys::GAMES_COUNT, .. }
        ));
    }

    #[tokio::test]
    async fn concurrent_records_are_not_lost() {
        let store = InMemoryKeyValueStore::new();
        let stats = Arc::new(service(&store, fixed_clock()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                tokio::spawn(async move { stats.record(1, 2).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snapshot = stats.snapshot().await.unwrap();
        assert_eq!(snapshot.games_played, 8);
        assert_eq!(snapshot.correct_total, 8);
        assert_eq!(snapshot.question_total, 16);
    }
}
