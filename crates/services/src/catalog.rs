use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{ImageLocator, Movie};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::CatalogLoadError;

const DEFAULT_CATALOG_URL: &str = "https://tv-api.com/en/API/Top250Movies/k_zcuw1ytf";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads the list of popular movies the quiz draws from.
#[async_trait]
pub trait MoviesLoading: Send + Sync {
    /// # Errors
    ///
    /// Returns `CatalogLoadError` when the list cannot be fetched or decoded.
    async fn load_movies(&self) -> Result<Vec<Movie>, CatalogLoadError>;
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CatalogConfig {
    /// Reads `MOVIE_QUIZ_CATALOG_URL`, falling back to the public top-250 endpoint.
    #[must_use]
    pub fn from_env() -> Self {
        let url = env::var("MOVIE_QUIZ_CATALOG_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.into());
        Self {
            url,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Fetches the catalog JSON over HTTP.
#[derive(Clone)]
pub struct HttpMoviesLoader {
    client: Client,
    config: CatalogConfig,
}

impl HttpMoviesLoader {
    #[must_use]
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(CatalogConfig::from_env())
    }
}

#[async_trait]
impl MoviesLoading for HttpMoviesLoader {
    async fn load_movies(&self) -> Result<Vec<Movie>, CatalogLoadError> {
        debug!(url = %self.config.url, "fetching movie list");
        let response = self
            .client
            .get(&self.config.url)
            .timeout(self.config.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogLoadError::HttpStatus(response.status()));
        }

        let body = response.bytes().await?;
        decode_catalog(&body)
    }
}

/// Decode the catalog response body.
///
/// Entries with a blank image locator are skipped.
///
/// # Errors
///
/// Returns `CatalogLoadError::Decode` for malformed JSON, `CatalogLoadError::Api` when the
/// service answered with an error message instead of movies, and `CatalogLoadError::Empty`
/// when no usable movie remains.
pub fn decode_catalog(body: &[u8]) -> Result<Vec<Movie>, CatalogLoadError> {
    let payload: MostPopularMovies = serde_json::from_slice(body)?;

    if payload.items.is_empty() {
        return match payload.error_message {
            Some(message) if !message.trim().is_empty() => Err(CatalogLoadError::Api(message)),
            _ => Err(CatalogLoadError::Empty),
        };
    }

    let total = payload.items.len();
    let movies: Vec<Movie> = payload
        .items
        .into_iter()
        .filter_map(|item| match ImageLocator::new(item.image) {
            Ok(image) => Some(Movie::new(item.id, item.title, item.rating, image)),
            Err(err) => {
                warn!(id = %item.id, error = %err, "skipping catalog entry");
                None
            }
        })
        .collect();

    if movies.is_empty() {
        return Err(CatalogLoadError::Empty);
    }

    debug!(total, usable = movies.len(), "decoded catalog");
    Ok(movies)
}

#[derive(Debug, Deserialize)]
struct MostPopularMovies {
    #[serde(default)]
    items: Vec<MovieItem>,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieItem {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "imdbRating", alias = "imDbRating", default)]
    rating: String,
    #[serde(default)]
    image: String,
}
