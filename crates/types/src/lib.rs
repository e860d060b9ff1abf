//! Value types shared by the synopsis crates.
//!
//! - [`ResearchQuery`]: a validated, trimmed search query
//! - [`PaperRecord`]: one bibliographic record returned by a paper source
//! - [`Synopsis`]: the generated synopsis sections, every field defaulting to empty

use serde::{Deserialize, Serialize};

/// Placeholder used by paper sources for fields they could not fill.
pub const MISSING_FIELD: &str = "N/A";

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("query cannot be empty")]
    Empty,
}

/// A search query that is guaranteed to contain non-whitespace text.
///
/// The input is trimmed during construction so that `" rust "` and `"rust"` address the same
/// cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResearchQuery(String);

impl ResearchQuery {
    /// Creates a new `ResearchQuery`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResearchQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ResearchQuery {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResearchQuery {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResearchQuery::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A single bibliographic record.
///
/// Field names serialize in the capitalised form used by the CSV export and the web frontend
/// (`Title`, `Abstract`, `Authors`, `Year`, `Venue`, `URL`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PaperRecord {
    pub title: String,
    #[serde(rename = "Abstract")]
    pub abstract_text: String,
    /// Author names joined with `", "`.
    pub authors: String,
    pub year: String,
    pub venue: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl PaperRecord {
    /// Returns the URL if it points somewhere, i.e. is neither empty nor the `N/A` placeholder.
    pub fn link(&self) -> Option<&str> {
        let url = self.url.trim();
        if url.is_empty() || url == MISSING_FIELD {
            None
        } else {
            Some(url)
        }
    }
}

/// Generated synopsis sections.
///
/// Every section defaults to an empty string, so partially generated or partially cached
/// synopses still deserialize and render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Synopsis {
    pub title: String,
    pub introduction: String,
    pub rationale: String,
    pub objectives: String,
    pub literature_review: String,
    pub methodology: String,
    pub feasibility: String,
    pub facilities: String,
    pub outcomes: String,
}
