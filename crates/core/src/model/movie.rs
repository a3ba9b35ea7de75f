use std::fmt;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MovieError {
    #[error("image locator is empty")]
    EmptyImageLocator,
}

/// Where a movie poster can be fetched from.
///
/// Kept as the raw string from the catalog; it is only parsed as a URL when an
/// image loader actually needs it, so one bad entry never rejects the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageLocator(String);

impl ImageLocator {
    /// # Errors
    ///
    /// Returns `MovieError::EmptyImageLocator` for blank input.
    pub fn new(raw: impl Into<String>) -> Result<Self, MovieError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MovieError::EmptyImageLocator);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the locator as an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` when the locator is not a valid URL.
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.0)
    }
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the popular-movies catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    id: String,
    title: String,
    rating: String,
    image: ImageLocator,
}

impl Movie {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        rating: impl Into<String>,
        image: ImageLocator,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            rating: rating.into(),
            image,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Rating exactly as delivered by the catalog.
    #[must_use]
    pub fn rating(&self) -> &str {
        &self.rating
    }

    #[must_use]
    pub fn rating_value(&self) -> f32 {
        parse_rating(&self.rating)
    }

    #[must_use]
    pub fn image(&self) -> &ImageLocator {
        &self.image
    }
}

/// Parse a catalog rating. Anything unparseable counts as `0.0`.
#[must_use]
pub fn parse_rating(raw: &str) -> f32 {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}
