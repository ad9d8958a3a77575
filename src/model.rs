//! Data structures for scraped episode ratings.
//!
//! The serde names mirror the JSON the HTTP interface returns:
//! `[{"Season": 1, "Episodes": [{"Title": "Pilot", "Rating": 8.1}]}]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque id naming one series on the scraped site (e.g. `tt0903747`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wraps a raw id. Returns `None` for empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The id as it appears in URLs
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single episode with its user rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// The episode title as listed on the season page
    #[serde(rename = "Title")]
    pub title: String,
    /// Rating on the site's 0.0 - 10.0 scale
    #[serde(rename = "Rating")]
    pub rating: f64,
}

/// All rated episodes of one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Season number, starting at 1
    #[serde(rename = "Season")]
    pub season: u32,
    /// Episodes in page order
    #[serde(rename = "Episodes")]
    pub episodes: Vec<Episode>,
}

/// Scraping result: seasons in ascending order
pub type Ratings = Vec<Season>;
