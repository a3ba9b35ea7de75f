//! In-memory collaborators shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::model::{ImageLocator, Movie};

use crate::catalog::MoviesLoading;
use crate::error::{CatalogLoadError, ImageFetchError};
use crate::images::ImageLoading;
use crate::session::{
    AcknowledgeAction, PresentationSink, RetryAction, RoundSummary, RoundViewModel,
};

pub fn movie(id: &str, rating: &str) -> Movie {
    Movie::new(
        id,
        format!("Movie {id}"),
        rating,
        ImageLocator::new(format!("https://example.com/{id}.jpg")).unwrap(),
    )
}

/// Movie loader returning a scripted list, or failing once told to.
#[derive(Clone)]
pub struct ScriptedMovies {
    outcome: Arc<Mutex<Result<Vec<Movie>, String>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedMovies {
    pub fn ok(movies: Vec<Movie>) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(Ok(movies))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        let scripted = Self::ok(Vec::new());
        scripted.fail_with(message);
        scripted
    }

    pub fn fail_with(&self, message: &str) {
        *self.outcome.lock().unwrap() = Err(message.to_owned());
    }

    pub fn succeed_with(&self, movies: Vec<Movie>) {
        *self.outcome.lock().unwrap() = Ok(movies);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MoviesLoading for ScriptedMovies {
    async fn load_movies(&self) -> Result<Vec<Movie>, CatalogLoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .map_err(CatalogLoadError::Transport)
    }
}

/// Image loader that fails a configurable number of times, then serves PNG bytes.
#[derive(Clone)]
pub struct FixedImages {
    failures_left: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl FixedImages {
    pub const BYTES: &'static [u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    pub fn ok() -> Self {
        Self::failing_times(0)
    }

    pub fn failing() -> Self {
        Self::failing_times(usize::MAX)
    }

    pub fn failing_times(times: usize) -> Self {
        Self {
            failures_left: Arc::new(AtomicUsize::new(times)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageLoading for FixedImages {
    async fn fetch_bytes(&self, _locator: &ImageLocator) -> Result<Vec<u8>, ImageFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                match left {
                    0 => None,
                    usize::MAX => Some(usize::MAX),
                    n => Some(n - 1),
                }
            })
            .is_ok();
        if failing {
            return Err(ImageFetchError::Transport("connection reset".into()));
        }
        Ok(Self::BYTES.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Loading,
    Question(RoundViewModel),
    AnswerResult(bool),
    Summary(RoundSummary),
    Error(String),
}

/// Presentation sink that records every call and keeps the continuations.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    retry: Mutex<Option<RetryAction>>,
    acknowledge: Mutex<Option<AcknowledgeAction>>,
}

impl RecordingSink {
    /// Recorded calls, without the loading notifications.
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call != SinkCall::Loading)
            .cloned()
            .collect()
    }

    pub fn loading_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == SinkCall::Loading)
            .count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn last_question(&self) -> Option<RoundViewModel> {
        self.calls().into_iter().rev().find_map(|call| match call {
            SinkCall::Question(view) => Some(view),
            _ => None,
        })
    }

    pub fn take_retry(&self) -> Option<RetryAction> {
        self.retry.lock().unwrap().take()
    }

    pub fn take_acknowledge(&self) -> Option<AcknowledgeAction> {
        self.acknowledge.lock().unwrap().take()
    }

    fn push(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PresentationSink for RecordingSink {
    fn show_loading(&self) {
        self.push(SinkCall::Loading);
    }

    fn show_question(&self, view: RoundViewModel) {
        self.push(SinkCall::Question(view));
    }

    fn show_answer_result(&self, is_correct: bool) {
        self.push(SinkCall::AnswerResult(is_correct));
    }

    fn show_round_summary(&self, summary: RoundSummary, on_acknowledge: AcknowledgeAction) {
        self.push(SinkCall::Summary(summary));
        *self.acknowledge.lock().unwrap() = Some(on_acknowledge);
    }

    fn show_recoverable_error(&self, message: String, on_retry: RetryAction) {
        self.push(SinkCall::Error(message));
        *self.retry.lock().unwrap() = Some(on_retry);
    }
}
