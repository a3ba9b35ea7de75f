mod events;
mod machine;
mod sink;
mod view;

pub use events::{AcknowledgeAction, RetryAction, SessionHandle};
pub use machine::{DEFAULT_ADVANCE_DELAY, GameSession, SessionState};
pub use sink::PresentationSink;
pub use view::{
    PosterImage, RoundSummary, RoundViewModel, SUMMARY_BUTTON, SUMMARY_TITLE, position_label,
};
