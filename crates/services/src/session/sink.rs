use super::events::{AcknowledgeAction, RetryAction};
use super::view::{RoundSummary, RoundViewModel};

/// Receives everything the game session wants shown.
///
/// Calls arrive on the session task; implementations should hand the data to their
/// UI and return quickly. Continuations may be triggered from any thread.
pub trait PresentationSink: Send + Sync {
    /// A catalog load or question request has started.
    fn show_loading(&self) {}

    fn show_question(&self, view: RoundViewModel);

    fn show_answer_result(&self, is_correct: bool);

    fn show_round_summary(&self, summary: RoundSummary, on_acknowledge: AcknowledgeAction);

    fn show_recoverable_error(&self, message: String, on_retry: RetryAction);
}
