//! JSON metadata catalogs.
//!
//! A catalog is the parsed form of a visual dataset's metadata file: a
//! sequence of movie records with id, title, genres, and release year.
//! It backs the count/lookup/filter operations the entity resolver and
//! dataset reports depend on.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::info;

use mvf_models::MovieRecord;

use crate::error::{DatasetError, DatasetResult};

/// Wire form of one metadata record. All fields are required; a record
/// missing any of them fails the whole load.
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: u32,
    title: String,
    genres: Vec<String>,
    release_year: i32,
}

/// An in-memory metadata catalog for one dataset.
#[derive(Debug, Clone)]
pub struct MetadataCatalog {
    dataset_name: String,
    movies: Vec<MovieRecord>,
}

impl MetadataCatalog {
    /// Parse a catalog from a JSON array of records.
    pub fn from_json_str(dataset_name: &str, json: &str) -> DatasetResult<Self> {
        let raw: Vec<RawRecord> = serde_json::from_str(json)
            .map_err(|e| DatasetError::schema(dataset_name, e.to_string()))?;

        let mut movies = Vec::with_capacity(raw.len());
        let mut seen: HashSet<u32> = HashSet::with_capacity(raw.len());
        for record in raw {
            if record.id == 0 {
                return Err(DatasetError::schema(
                    dataset_name,
                    "movie id must be a positive integer",
                ));
            }
            if !seen.insert(record.id) {
                return Err(DatasetError::DuplicateKey {
                    dataset: dataset_name.to_string(),
                    movie_id: record.id,
                });
            }
            movies.push(MovieRecord {
                id: record.id,
                title: record.title,
                genres: record.genres.into_iter().collect(),
                release_year: record.release_year,
            });
        }

        info!(
            dataset = dataset_name,
            movies = movies.len(),
            "Loaded metadata catalog"
        );

        Ok(Self {
            dataset_name: dataset_name.to_string(),
            movies,
        })
    }

    /// Load a catalog from a local JSON file.
    pub fn load_file(dataset_name: &str, path: impl AsRef<Path>) -> DatasetResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(dataset_name, &json)
    }

    /// Fetch a catalog from a URL.
    pub async fn fetch_url(dataset_name: &str, url: &str) -> DatasetResult<Self> {
        let response = reqwest::get(url).await.map_err(|e| DatasetError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(DatasetError::Http {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| DatasetError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(dataset_name, &body)
    }

    /// Name of the dataset this catalog came from.
    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// All records, in file order.
    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    /// Number of movies in the catalog.
    pub fn count_movies(&self) -> usize {
        self.movies.len()
    }

    /// Look up a movie by id. An unknown id is an empty result, not an
    /// error.
    pub fn movie_by_id(&self, id: u32) -> Option<&MovieRecord> {
        self.movies.iter().find(|m| m.id == id)
    }

    /// Pick a uniformly random movie.
    pub fn random_movie(&self) -> Option<&MovieRecord> {
        self.movies.choose(&mut rand::thread_rng())
    }

    /// All movies carrying the given genre.
    pub fn movies_by_genre(&self, genre: &str) -> Vec<&MovieRecord> {
        self.movies.iter().filter(|m| m.has_genre(genre)).collect()
    }

    /// Count movies per release year.
    pub fn classify_years_by_count(&self) -> BTreeMap<i32, usize> {
        let mut counts = BTreeMap::new();
        for movie in &self.movies {
            *counts.entry(movie.release_year).or_insert(0) += 1;
        }
        counts
    }

    /// Count movies per genre label.
    pub fn classify_movies_by_genre(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for movie in &self.movies {
            for genre in &movie.genres {
                *counts.entry(genre.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Average number of genre labels per movie.
    pub fn average_genres_per_movie(&self) -> f64 {
        if self.movies.is_empty() {
            return 0.0;
        }
        let total: usize = self.movies.iter().map(|m| m.genres.len()).sum();
        total as f64 / self.movies.len() as f64
    }

    /// The catalog's id set, for entity resolution.
    pub fn ids(&self) -> HashSet<u32> {
        self.movies.iter().map(|m| m.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"id": 1, "title": "Toy Story", "genres": ["Animation", "Comedy"], "release_year": 1995},
        {"id": 6, "title": "Heat", "genres": ["Action", "Crime", "Thriller"], "release_year": 1995},
        {"id": 11, "title": "The American President", "genres": ["Comedy", "Romance"], "release_year": 1995},
        {"id": 32, "title": "Twelve Monkeys", "genres": ["Sci-Fi"], "release_year": 1996}
    ]"#;

    fn catalog() -> MetadataCatalog {
        MetadataCatalog::from_json_str("scenesense", SAMPLE).unwrap()
    }

    #[test]
    fn test_count_and_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.count_movies(), 4);
        assert_eq!(catalog.movie_by_id(6).unwrap().title, "Heat");
        assert!(catalog.movie_by_id(99).is_none());
    }

    #[test]
    fn test_random_movie_comes_from_catalog() {
        let catalog = catalog();
        let movie = catalog.random_movie().unwrap();
        assert!(catalog.movie_by_id(movie.id).is_some());
    }

    #[test]
    fn test_movies_by_genre() {
        let catalog = catalog();
        let comedies = catalog.movies_by_genre("Comedy");
        assert_eq!(comedies.len(), 2);
        assert!(catalog.movies_by_genre("Western").is_empty());
    }

    #[test]
    fn test_year_and_genre_classification() {
        let catalog = catalog();
        let years = catalog.classify_years_by_count();
        assert_eq!(years[&1995], 3);
        assert_eq!(years[&1996], 1);

        let genres = catalog.classify_movies_by_genre();
        assert_eq!(genres["Comedy"], 2);
        assert_eq!(genres["Sci-Fi"], 1);
    }

    #[test]
    fn test_average_genres_per_movie() {
        let catalog = catalog();
        // 2 + 3 + 2 + 1 labels over 4 movies.
        assert!((catalog.average_genres_per_movie() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_field_aborts_load() {
        let missing_year = r#"[{"id": 1, "title": "X", "genres": []}]"#;
        let err = MetadataCatalog::from_json_str("broken", missing_year).unwrap_err();
        assert!(matches!(err, DatasetError::Schema { .. }));
    }

    #[test]
    fn test_zero_id_aborts_load() {
        let zero = r#"[{"id": 0, "title": "X", "genres": [], "release_year": 2000}]"#;
        assert!(MetadataCatalog::from_json_str("broken", zero).is_err());
    }

    #[test]
    fn test_duplicate_id_aborts_load() {
        let dup = r#"[
            {"id": 5, "title": "A", "genres": [], "release_year": 2000},
            {"id": 5, "title": "B", "genres": [], "release_year": 2001}
        ]"#;
        let err = MetadataCatalog::from_json_str("broken", dup).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateKey { movie_id: 5, .. }));
    }
}
