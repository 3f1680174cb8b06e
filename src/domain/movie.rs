//! Movie domain model.
//!
//! A [`Movie`] is one item of a search result page. Movies are immutable once
//! received; identity is `id`, but the same id may legitimately appear on more
//! than one page, so list rendering uses [`Movie::render_key`] instead.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single movie as returned by the search API.
///
/// `release_date` is kept as the raw ISO-8601 string the API sends. The API
/// sometimes omits it or sends an empty string, so it defaults to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl Movie {
    /// Creates a movie from its parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelsearch::Movie;
    ///
    /// let movie = Movie::new(603, "The Matrix", "1999-03-30", Some("/matrix.jpg"));
    /// assert_eq!(movie.release_year(), Some(1999));
    /// ```
    pub fn new(
        id: i64,
        title: impl Into<String>,
        release_date: impl Into<String>,
        poster_path: Option<&str>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            release_date: release_date.into(),
            poster_path: poster_path.map(String::from),
        }
    }

    /// Returns the release year, or `None` when the date is missing or not a
    /// valid `YYYY-MM-DD` date.
    #[must_use]
    pub fn release_year(&self) -> Option<i32> {
        NaiveDate::parse_from_str(self.release_date.trim(), "%Y-%m-%d")
            .ok()
            .map(|date| date.year())
    }

    /// Builds the full poster URL from the image base URL, or `None` when the
    /// movie has no poster and the view should show its placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelsearch::Movie;
    ///
    /// let movie = Movie::new(1, "Alien", "1979-05-25", Some("/alien.jpg"));
    /// assert_eq!(
    ///     movie.poster_url("https://image.tmdb.org/t/p/w185").as_deref(),
    ///     Some("https://image.tmdb.org/t/p/w185/alien.jpg")
    /// );
    /// ```
    #[must_use]
    pub fn poster_url(&self, image_base_url: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("{image_base_url}{path}"))
    }

    /// Key used by list renderers to tell rows apart.
    ///
    /// Combines the id with the row index and current page, since ids are not
    /// unique across accumulated pages.
    #[must_use]
    pub fn render_key(&self, index: usize, current_page: u32) -> String {
        format!("{}-{index}-{current_page}", self.id)
    }
}
