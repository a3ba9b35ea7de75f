use quiz_core::model::Question;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::error::{CatalogLoadError, QuestionError};

/// Everything that can change a game session, in arrival order.
///
/// Completions are posted only by the session's own background tasks; outside
/// callers reach the session through the [`SessionHandle`] actions.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Start,
    Answer(bool),
    Retry,
    Acknowledge,
    Shutdown,
    /// Completion of a catalog load: the pool size or the failure.
    CatalogLoaded(Result<usize, CatalogLoadError>),
    QuestionResolved(Result<Question, QuestionError>),
    /// The post-answer delay elapsed.
    Advance,
}

/// Cloneable handle for the user-facing session actions.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(tx: UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    pub fn start(&self) {
        self.send(SessionEvent::Start);
    }

    pub fn answer(&self, given: bool) {
        self.send(SessionEvent::Answer(given));
    }

    pub fn retry(&self) {
        self.send(SessionEvent::Retry);
    }

    pub fn acknowledge(&self) {
        self.send(SessionEvent::Acknowledge);
    }

    pub fn shutdown(&self) {
        self.send(SessionEvent::Shutdown);
    }

    /// Returns `false` once the session has been dropped.
    pub(crate) fn send(&self, event: SessionEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!(event = ?err.0, "session closed, event dropped");
                false
            }
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Continuation passed along with a recoverable error.
#[derive(Debug, Clone)]
pub struct RetryAction {
    handle: SessionHandle,
}

impl RetryAction {
    pub(crate) fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    pub fn retry(self) {
        self.handle.retry();
    }
}

/// Continuation passed along with the round summary.
#[derive(Debug, Clone)]
pub struct AcknowledgeAction {
    handle: SessionHandle,
}

impl AcknowledgeAction {
    pub(crate) fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    pub fn acknowledge(self) {
        self.handle.acknowledge();
    }
}
