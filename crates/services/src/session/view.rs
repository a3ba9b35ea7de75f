use quiz_core::model::{GameResult, Question, StatisticsAggregate};

pub const SUMMARY_TITLE: &str = "This round is over!";
pub const SUMMARY_BUTTON: &str = "Play again";

/// Poster as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterImage {
    /// Bytes carrying a recognised image signature.
    Decodable(Vec<u8>),
    /// Nothing usable; the view should draw an empty frame.
    Placeholder,
}

impl PosterImage {
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if has_image_signature(bytes) {
            Self::Decodable(bytes.to_vec())
        } else {
            Self::Placeholder
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

fn has_image_signature(bytes: &[u8]) -> bool {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    bytes.starts_with(PNG)
        || bytes.starts_with(JPEG)
        || bytes.starts_with(b"GIF87a")
        || bytes.starts_with(b"GIF89a")
        || (bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP")
}

/// Everything the view needs to show one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundViewModel {
    pub image: PosterImage,
    pub question: String,
    pub position_label: String,
}

impl RoundViewModel {
    #[must_use]
    pub fn new(question: &Question, index: usize, round_length: usize) -> Self {
        Self {
            image: PosterImage::from_bytes(question.image()),
            question: question.text().to_owned(),
            position_label: position_label(index, round_length),
        }
    }
}

/// `"<index + 1>/<round_length>"`.
#[must_use]
pub fn position_label(index: usize, round_length: usize) -> String {
    format!("{}/{}", index + 1, round_length)
}

/// Result alert shown once a round is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub title: String,
    pub message: String,
    pub button_text: String,
}

impl RoundSummary {
    /// Build the summary from this round's result and the totals that include it.
    ///
    /// Totals without a best game fall back to this round.
    #[must_use]
    pub fn new(round: &GameResult, stats: &StatisticsAggregate) -> Self {
        let best = stats.best_game.unwrap_or(*round);
        let message = format!(
            "Your result: {score}/{round_length}\n\
             Games played: {games}\n\
             Record: {best_correct}/{best_total} ({best_date})\n\
             Average accuracy: {accuracy:.2}%",
            score = round.correct(),
            round_length = round.total(),
            games = stats.games_played,
            best_correct = best.correct(),
            best_total = best.total(),
            best_date = best.date().format("%d.%m.%y %H:%M"),
            accuracy = stats.total_accuracy(),
        );
        Self {
            title: SUMMARY_TITLE.into(),
            message,
            button_text: SUMMARY_BUTTON.into(),
        }
    }
}
