use std::sync::{Mutex, PoisonError};

use services::session::{AcknowledgeAction, PosterImage, RetryAction};
use services::{PresentationSink, RoundSummary, RoundViewModel, SessionHandle};

/// What a bare Enter press should do next.
#[derive(Debug, Default)]
enum Pending {
    #[default]
    Nothing,
    Retry(RetryAction),
    Acknowledge(AcknowledgeAction),
}

/// Plain-text presentation on stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    pending: Mutex<Pending>,
}

impl ConsoleSink {
    fn set_pending(&self, pending: Pending) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = pending;
    }

    fn take_pending(&self) -> Pending {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Route one line of user input. Returns `false` when the user wants to quit.
    pub fn handle_input(&self, line: &str, session: &SessionHandle) -> bool {
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => session.answer(true),
            "n" | "no" => session.answer(false),
            "q" | "quit" => return false,
            "" => match self.take_pending() {
                Pending::Retry(action) => action.retry(),
                Pending::Acknowledge(action) => {
                    action.acknowledge();
                    session.start();
                }
                Pending::Nothing => {}
            },
            other => println!("Unknown input {other:?}. Answer y or n, or q to quit."),
        }
        true
    }
}

impl PresentationSink for ConsoleSink {
    fn show_loading(&self) {
        println!("Loading...");
    }

    fn show_question(&self, view: RoundViewModel) {
        let poster = match &view.image {
            PosterImage::Decodable(bytes) => format!("[poster, {} bytes]", bytes.len()),
            PosterImage::Placeholder => "[no poster]".to_owned(),
        };
        println!();
        println!("Question {}", view.position_label);
        println!("{poster}");
        println!("{} (y/n)", view.question);
    }

    fn show_answer_result(&self, is_correct: bool) {
        println!("{}", if is_correct { "Correct!" } else { "Wrong." });
    }

    fn show_round_summary(&self, summary: RoundSummary, on_acknowledge: AcknowledgeAction) {
        println!();
        println!("{}", summary.title);
        println!("{}", summary.message);
        println!("Press Enter to {}, or q to quit.", summary.button_text.to_lowercase());
        self.set_pending(Pending::Acknowledge(on_acknowledge));
    }

    fn show_recoverable_error(&self, message: String, on_retry: RetryAction) {
        println!();
        println!("Error: {message}");
        println!("Press Enter to try again, or q to quit.");
        self.set_pending(Pending::Retry(on_retry));
    }
}
