use std::sync::{Arc, Mutex, PoisonError, RwLock};

use quiz_core::model::{Movie, Question, round_length};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::catalog::MoviesLoading;
use crate::error::{CatalogLoadError, QuestionError};
use crate::images::ImageLoading;

/// Turns the loaded movie catalog into randomized rating questions.
///
/// Movies are drawn uniformly with replacement, so a round can repeat a movie.
pub struct QuestionSource {
    movies: Arc<dyn MoviesLoading>,
    images: Arc<dyn ImageLoading>,
    pool: RwLock<Vec<Movie>>,
    rng: Mutex<StdRng>,
}

impl QuestionSource {
    #[must_use]
    pub fn new(movies: Arc<dyn MoviesLoading>, images: Arc<dyn ImageLoading>) -> Self {
        Self {
            movies,
            images,
            pool: RwLock::new(Vec::new()),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Use a seeded generator so question order is reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Fetch the movie list and replace the in-memory pool.
    ///
    /// Returns the new pool size. On failure the previous pool is kept as is.
    ///
    /// # Errors
    ///
    /// Returns `CatalogLoadError` when the loader fails or yields no movies.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<usize, CatalogLoadError> {
        let movies = self.movies.load_movies().await.inspect_err(|err| {
            warn!(error = %err, "movie list load failed");
        })?;
        if movies.is_empty() {
            return Err(CatalogLoadError::Empty);
        }

        let size = movies.len();
        *self.pool.write().unwrap_or_else(PoisonError::into_inner) = movies;
        info!(size, "movie list loaded");
        Ok(size)
    }

    /// Pick a random movie and build a question from its poster.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::CatalogNotLoaded` before a successful `load_catalog`, and
    /// `QuestionError::ImagesUnavailable` when the poster cannot be fetched.
    #[instrument(skip(self))]
    pub async fn request_question(&self) -> Result<Question, QuestionError> {
        let movie = self.pick_movie().ok_or(QuestionError::CatalogNotLoaded)?;
        debug!(id = movie.id(), rating = movie.rating(), "picked movie");

        let image = self
            .images
            .fetch_bytes(movie.image())
            .await
            .inspect_err(|err| warn!(id = movie.id(), error = %err, "poster fetch failed"))?;

        Ok(Question::about_rating(&movie, image))
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Questions per round for the current pool: `min(pool_size, 10)`.
    #[must_use]
    pub fn questions_amount(&self) -> usize {
        round_length(self.pool_size())
    }

    /// Same value as [`QuestionSource::questions_amount`].
    #[must_use]
    pub fn questions_count(&self) -> usize {
        self.questions_amount()
    }

    fn pick_movie(&self) -> Option<Movie> {
        let pool = self.pool.read().unwrap_or_else(PoisonError::into_inner);
        if pool.is_empty() {
            return None;
        }
        let index = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(0..pool.len());
        pool.get(index).cloned()
    }
}

impl std::fmt::Debug for QuestionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionSource")
            .field("pool_size", &self.pool_size())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageFetchError;
    use crate::test_support::{FixedImages, ScriptedMovies, movie};

    fn source(movies: ScriptedMovies, images: FixedImages) -> QuestionSource {
        QuestionSource::new(Arc::new(movies), Arc::new(images)).with_seed(7)
    }

    #[tokio::test]
    async fn request_before_load_is_rejected() {
        let source = source(ScriptedMovies::ok(vec![movie("a", "8.0")]), FixedImages::ok());
        let err = source.request_question().await.unwrap_err();
        assert!(matches!(err, QuestionError::CatalogNotLoaded));
    }

    #[tokio::test]
    async fn questions_amount_is_capped_at_ten() {
        for size in [1_usize, 3, 10, 11, 250] {
            let movies = (0..size).map(|i| movie(&i.to_string(), "8.0")).collect();
            let source = source(ScriptedMovies::ok(movies), FixedImages::ok());
            source.load_catalog().await.unwrap();
            assert_eq!(source.questions_amount(), size.min(10));
            assert_eq!(source.questions_count(), source.questions_amount());
        }
    }

    #[tokio::test]
    async fn reloading_replaces_the_pool() {
        let movies = vec![movie("a", "8.0"), movie("b", "5.0")];
        let source = source(ScriptedMovies::ok(movies), FixedImages::ok());

        source.load_catalog().await.unwrap();
        source.load_catalog().await.unwrap();

        assert_eq!(source.pool_size(), 2);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_pool() {
        let scripted = ScriptedMovies::ok(vec![movie("a", "8.0")]);
        let source = QuestionSource::new(Arc::new(scripted.clone()), Arc::new(FixedImages::ok()));
        source.load_catalog().await.unwrap();

        scripted.fail_with("offline");
        assert!(source.load_catalog().await.is_err());

        assert_eq!(source.pool_size(), 1);
    }

    #[tokio::test]
    async fn empty_catalog_is_an_error() {
        let source = source(ScriptedMovies::ok(Vec::new()), FixedImages::ok());
        let err = source.load_catalog().await.unwrap_err();
        assert!(matches!(err, CatalogLoadError::Empty));
        assert_eq!(source.questions_amount(), 0);
    }

    #[tokio::test]
    async fn question_answer_follows_rating() {
        let source = source(ScriptedMovies::ok(vec![movie("a", "7.5")]), FixedImages::ok());
        source.load_catalog().await.unwrap();

        let question = source.request_question().await.unwrap();

        assert!(question.correct_answer());
        assert_eq!(question.image(), FixedImages::BYTES);
    }

    #[tokio::test]
    async fn poster_failure_is_images_unavailable() {
        let source = source(ScriptedMovies::ok(vec![movie("a", "9.0")]), FixedImages::failing());
        source.load_catalog().await.unwrap();

        let err = source.request_question().await.unwrap_err();

        assert!(matches!(
            err,
            QuestionError::ImagesUnavailable(ImageFetchError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn same_seed_gives_same_picks() {
        let movies: Vec<_> = (0..50).map(|i| movie(&i.to_string(), "8.0")).collect();
        let a = source(ScriptedMovies::ok(movies.clone()), FixedImages::ok());
        let b = source(ScriptedMovies::ok(movies), FixedImages::ok());
        a.load_catalog().await.unwrap();
        b.load_catalog().await.unwrap();

        let picks_a: Vec<_> = (0..10).filter_map(|_| a.pick_movie()).collect();
        let picks_b: Vec<_> = (0..10).filter_map(|_| b.pick_movie()).collect();

        assert_eq!(picks_a, picks_b);
    }
}
