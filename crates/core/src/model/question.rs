use super::movie::Movie;

/// Upper bound on questions in one round.
pub const MAX_QUESTIONS_PER_ROUND: usize = 10;

/// Movies rated strictly above this count as "yes".
pub const RATING_THRESHOLD: f32 = 7.0;

pub const QUESTION_PROMPT: &str = "Is the rating of this movie greater than 7?";

/// Number of questions in a round for a catalog of `pool_size` movies.
#[must_use]
pub fn round_length(pool_size: usize) -> usize {
    pool_size.min(MAX_QUESTIONS_PER_ROUND)
}

/// A single yes/no question about one movie's poster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    image: Vec<u8>,
    text: String,
    correct_answer: bool,
}

impl Question {
    #[must_use]
    pub fn new(image: Vec<u8>, text: impl Into<String>, correct_answer: bool) -> Self {
        Self {
            image,
            text: text.into(),
            correct_answer,
        }
    }

    /// Build the rating question for `movie` with its already fetched poster bytes.
    #[must_use]
    pub fn about_rating(movie: &Movie, image: Vec<u8>) -> Self {
        Self::new(
            image,
            QUESTION_PROMPT,
            movie.rating_value() > RATING_THRESHOLD,
        )
    }

    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn correct_answer(&self) -> bool {
        self.correct_answer
    }

    #[must_use]
    pub fn is_correct(&self, given: bool) -> bool {
        given == self.correct_answer
    }
}
