//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::GameResultError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while loading the movie catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("movie list request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("movie list request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("movie list could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("movie service reported an error: {0}")]
    Api(String),
    #[error("movie list is empty")]
    Empty,
    #[error("movie list is unavailable: {0}")]
    Transport(String),
}

/// Errors emitted while fetching a single poster.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImageFetchError {
    #[error("poster request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("poster request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid poster locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },
    #[error("poster is empty")]
    Empty,
    #[error("poster is unavailable: {0}")]
    Transport(String),
}

/// Errors emitted by `QuestionSource::request_question`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("the movie list has not been loaded")]
    CatalogNotLoaded,
    #[error("failed to load the movie poster, please try again ({0})")]
    ImagesUnavailable(#[from] ImageFetchError),
}

/// Errors emitted by `StatisticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatisticsError {
    #[error("stored value for {key} is corrupt: {value}")]
    Corrupt { key: &'static str, value: String },
    #[error(transparent)]
    InvalidResult(#[from] GameResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
