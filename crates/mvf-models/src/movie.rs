//! Movie metadata records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A movie as described by a metadata dataset.
///
/// Identity key is `id`. Datasets with other raw identifier spaces must
/// be normalized to this integer space before entity resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MovieRecord {
    /// Normalized integer movie id
    pub id: u32,

    /// Display title
    pub title: String,

    /// Genre labels attached to the movie
    pub genres: BTreeSet<String>,

    /// Release year
    pub release_year: i32,
}

impl MovieRecord {
    /// Whether the movie carries the given genre (case-insensitive).
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MovieRecord {
        MovieRecord {
            id: 6,
            title: "Heat".to_string(),
            genres: ["Action", "Crime", "Thriller"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            release_year: 1995,
        }
    }

    #[test]
    fn test_has_genre_case_insensitive() {
        let movie = record();
        assert!(movie.has_genre("Action"));
        assert!(movie.has_genre("action"));
        assert!(!movie.has_genre("Romance"));
    }
}
