mod game_result;
mod movie;
mod question;
mod statistics;

pub use game_result::{GameResult, GameResultError};
pub use movie::{ImageLocator, Movie, MovieError, parse_rating};
pub use question::{MAX_QUESTIONS_PER_ROUND, QUESTION_PROMPT, Question, RATING_THRESHOLD, round_length};
pub use statistics::StatisticsAggregate;
