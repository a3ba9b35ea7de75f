use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{Question, round_length};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, instrument, warn};

use super::events::{AcknowledgeAction, RetryAction, SessionEvent, SessionHandle};
use super::sink::PresentationSink;
use super::view::{RoundSummary, RoundViewModel, position_label};
use crate::error::{CatalogLoadError, QuestionError};
use crate::question_source::QuestionSource;
use crate::statistics_service::StatisticsService;

/// Pause between showing an answer's result and moving on.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    AwaitingQuestion,
    QuestionShown,
    Scoring,
    RoundComplete,
}

/// Round state machine.
///
/// All mutation happens through `&mut self` on whichever task drives the session
/// (`run` or `step`). Catalog loads, question fetches and the advance timer run as
/// spawned tasks that post their completion back to the session's inbox.
pub struct GameSession {
    source: Arc<QuestionSource>,
    statistics: Arc<StatisticsService>,
    sink: Arc<dyn PresentationSink>,
    handle: SessionHandle,
    inbox: UnboundedReceiver<SessionEvent>,
    advance_delay: Duration,

    state: SessionState,
    current_index: usize,
    score: u32,
    current_question: Option<Question>,
    round_length: usize,

    catalog_in_flight: bool,
    question_in_flight: bool,
    finalize_failed: bool,
}

impl GameSession {
    #[must_use]
    pub fn new(
        source: Arc<QuestionSource>,
        statistics: Arc<StatisticsService>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        Self {
            source,
            statistics,
            sink,
            handle: SessionHandle::new(tx),
            inbox,
            advance_delay: DEFAULT_ADVANCE_DELAY,
            state: SessionState::Idle,
            current_index: 0,
            score: 0,
            current_question: None,
            round_length: 0,
            catalog_in_flight: false,
            question_in_flight: false,
            finalize_failed: false,
        }
    }

    #[must_use]
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    /// Questions in the current round; `0` until the catalog has loaded.
    #[must_use]
    pub fn round_length(&self) -> usize {
        self.round_length
    }

    #[must_use]
    pub fn position_label(&self) -> String {
        position_label(self.current_index, self.round_length)
    }

    /// Process events until `Shutdown`.
    pub async fn run(mut self) {
        info!("game session running");
        while let Some(event) = self.inbox.recv().await {
            if self.handle_event(event).await.is_break() {
                break;
            }
        }
        info!("game session stopped");
    }

    /// Wait for the next event and apply it.
    ///
    /// Returns `None` only if the inbox is closed, which cannot happen while the
    /// session holds its own handle.
    pub async fn step(&mut self) -> Option<ControlFlow<()>> {
        let event = self.inbox.recv().await?;
        Some(self.handle_event(event).await)
    }

    pub(crate) async fn handle_event(&mut self, event: SessionEvent) -> ControlFlow<()> {
        match event {
            SessionEvent::Start => self.start(),
            SessionEvent::Answer(given) => self.submit_answer(given),
            SessionEvent::Retry => self.retry().await,
            SessionEvent::Acknowledge => self.acknowledge(),
            SessionEvent::Shutdown => return ControlFlow::Break(()),
            SessionEvent::CatalogLoaded(result) => self.on_catalog_loaded(result),
            SessionEvent::QuestionResolved(result) => self.on_question_resolved(result),
            SessionEvent::Advance => self.advance().await,
        }
        ControlFlow::Continue(())
    }

    /// Begin a new round from `Idle`, `RoundComplete`, or a failed catalog load.
    pub fn start(&mut self) {
        let can_start = match self.state {
            SessionState::Idle | SessionState::RoundComplete => true,
            SessionState::Loading => !self.catalog_in_flight,
            _ => false,
        };
        if !can_start {
            warn!(state = ?self.state, "start ignored");
            return;
        }

        info!("starting round");
        self.reset();
        self.transition(SessionState::Loading);
        self.load_catalog();
    }

    /// Score an answer for the question on screen.
    ///
    /// Ignored unless a question is shown, so duplicate taps are harmless.
    pub fn submit_answer(&mut self, given: bool) {
        if self.state != SessionState::QuestionShown {
            debug!(state = ?self.state, "answer ignored");
            return;
        }
        let Some(question) = self.current_question.as_ref() else {
            debug!("answer ignored, no current question");
            return;
        };

        let is_correct = question.is_correct(given);
        if is_correct {
            self.score += 1;
        }
        debug!(index = self.current_index, given, is_correct, score = self.score, "answer scored");

        self.transition(SessionState::Scoring);
        self.sink.show_answer_result(is_correct);
        self.schedule_advance();
    }

    /// Show a freshly resolved question.
    pub fn question_ready(&mut self, question: Question) {
        let view = RoundViewModel::new(&question, self.current_index, self.round_length);
        self.current_question = Some(question);
        self.transition(SessionState::QuestionShown);
        self.sink.show_question(view);
    }

    fn on_catalog_loaded(&mut self, result: Result<usize, CatalogLoadError>) {
        self.catalog_in_flight = false;
        if self.state != SessionState::Loading {
            warn!(state = ?self.state, "stale catalog result dropped");
            return;
        }

        match result {
            Ok(pool_size) => {
                self.round_length = round_length(pool_size);
                info!(pool_size, round_length = self.round_length, "catalog ready");
                self.transition(SessionState::AwaitingQuestion);
                self.request_question();
            }
            Err(err) => {
                warn!(error = %err, "catalog load failed");
                self.sink
                    .show_recoverable_error(err.to_string(), RetryAction::new(self.handle()));
            }
        }
    }

    fn on_question_resolved(&mut self, result: Result<Question, QuestionError>) {
        self.question_in_flight = false;
        if self.state != SessionState::AwaitingQuestion {
            warn!(state = ?self.state, "stale question dropped");
            return;
        }

        match result {
            Ok(question) => self.question_ready(question),
            Err(err) => {
                warn!(index = self.current_index, error = %err, "question request failed");
                self.sink
                    .show_recoverable_error(err.to_string(), RetryAction::new(self.handle()));
            }
        }
    }

    async fn retry(&mut self) {
        match self.state {
            SessionState::Loading if !self.catalog_in_flight => self.load_catalog(),
            SessionState::AwaitingQuestion if !self.question_in_flight => self.request_question(),
            SessionState::Scoring if self.finalize_failed => self.advance().await,
            state => debug!(?state, "retry ignored"),
        }
    }

    fn acknowledge(&mut self) {
        if self.state != SessionState::RoundComplete {
            debug!(state = ?self.state, "acknowledge ignored");
            return;
        }
        self.reset();
        self.transition(SessionState::Idle);
    }

    #[instrument(skip(self), fields(index = self.current_index))]
    async fn advance(&mut self) {
        if self.state != SessionState::Scoring {
            warn!(state = ?self.state, "advance outside scoring dropped");
            return;
        }

        if self.current_index + 1 >= self.round_length {
            self.finish_round().await;
            return;
        }

        self.current_index += 1;
        self.current_question = None;
        self.transition(SessionState::AwaitingQuestion);
        self.request_question();
    }

    async fn finish_round(&mut self) {
        let total = u32::try_from(self.round_length).unwrap_or(u32::MAX);
        match self.statistics.record(self.score, total).await {
            Ok(recorded) => {
                self.finalize_failed = false;
                let summary = RoundSummary::new(&recorded.result, &recorded.totals);
                info!(score = self.score, total, "round complete");
                self.transition(SessionState::RoundComplete);
                self.sink
                    .show_round_summary(summary, AcknowledgeAction::new(self.handle()));
            }
            Err(err) => {
                warn!(error = %err, "failed to record round");
                self.finalize_failed = true;
                self.sink.show_recoverable_error(
                    format!("could not save the round result: {err}"),
                    RetryAction::new(self.handle()),
                );
            }
        }
    }

    fn load_catalog(&mut self) {
        self.catalog_in_flight = true;
        self.sink.show_loading();

        let source = Arc::clone(&self.source);
        let handle = self.handle();
        tokio::spawn(async move {
            let result = source.load_catalog().await;
            handle.send(SessionEvent::CatalogLoaded(result));
        });
    }

    /// Ask for the next question unless a request is already outstanding.
    fn request_question(&mut self) {
        if self.question_in_flight {
            debug!("question request already in flight");
            return;
        }
        self.question_in_flight = true;
        self.sink.show_loading();

        let source = Arc::clone(&self.source);
        let handle = self.handle();
        tokio::spawn(async move {
            let result = source.request_question().await;
            handle.send(SessionEvent::QuestionResolved(result));
        });
    }

    fn schedule_advance(&self) {
        let delay = self.advance_delay;
        let handle = self.handle();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.send(SessionEvent::Advance);
        });
    }

    fn reset(&mut self) {
        self.current_index = 0;
        self.score = 0;
        self.current_question = None;
        self.round_length = 0;
        self.finalize_failed = false;
    }

    fn transition(&mut self, to: SessionState) {
        debug!(from = ?self.state, ?to, "session transition");
        self.state = to;
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("state", &self.state)
            .field("current_index", &self.current_index)
            .field("score", &self.score)
            .field("round_length", &self.round_length)
            .field("has_question", &self.current_question.is_some())
            .field("catalog_in_flight", &self.catalog_in_flight)
            .field("question_in_flight", &self.question_in_flight)
            .finish_non_exhaustive()
    }
}
