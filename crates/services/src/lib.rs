#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod images;
pub mod question_source;
pub mod session;
pub mod statistics_service;

#[cfg(test)]
mod test_support;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use catalog::{CatalogConfig, HttpMoviesLoader, MoviesLoading, decode_catalog};
pub use error::{
    AppServicesError, CatalogLoadError, ImageFetchError, QuestionError, StatisticsError,
};
pub use images::{HttpImageLoader, ImageLoading};
pub use question_source::QuestionSource;
pub use session::{
    AcknowledgeAction, GameSession, PresentationSink, RetryAction, RoundSummary, RoundViewModel,
    SessionHandle, SessionState,
};
pub use statistics_service::{RecordedRound, StatisticsService};
