use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog::{CatalogConfig, HttpMoviesLoader, MoviesLoading};
use crate::error::AppServicesError;
use crate::images::{HttpImageLoader, ImageLoading};
use crate::question_source::QuestionSource;
use crate::session::{DEFAULT_ADVANCE_DELAY, GameSession, PresentationSink};
use crate::statistics_service::StatisticsService;

/// Assembles the question source and statistics store behind one value.
#[derive(Clone)]
pub struct AppServices {
    question_source: Arc<QuestionSource>,
    statistics: Arc<StatisticsService>,
    advance_delay: Duration,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP movie catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: CatalogConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let movies: Arc<dyn MoviesLoading> = Arc::new(HttpMoviesLoader::new(catalog));
        let images: Arc<dyn ImageLoading> = Arc::new(HttpImageLoader::default());
        Ok(Self::from_parts(&storage, clock, movies, images))
    }

    /// Build services from already constructed collaborators.
    #[must_use]
    pub fn from_parts(
        storage: &Storage,
        clock: Clock,
        movies: Arc<dyn MoviesLoading>,
        images: Arc<dyn ImageLoading>,
    ) -> Self {
        Self {
            question_source: Arc::new(QuestionSource::new(movies, images)),
            statistics: Arc::new(StatisticsService::new(
                clock,
                Arc::clone(&storage.statistics),
            )),
            advance_delay: DEFAULT_ADVANCE_DELAY,
        }
    }

    #[must_use]
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    #[must_use]
    pub fn question_source(&self) -> Arc<QuestionSource> {
        Arc::clone(&self.question_source)
    }

    #[must_use]
    pub fn statistics(&self) -> Arc<StatisticsService> {
        Arc::clone(&self.statistics)
    }

    /// Create a game session reporting to `sink`.
    #[must_use]
    pub fn new_session(&self, sink: Arc<dyn PresentationSink>) -> GameSession {
        GameSession::new(self.question_source(), self.statistics(), sink)
            .with_advance_delay(self.advance_delay)
    }
}
