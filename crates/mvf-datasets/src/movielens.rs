//! MovieLens-shape tabular datasets.
//!
//! Movies come as `{movieId, title, genres}` with genres in one
//! `A|B|C` delimited string; ratings as `{userId, movieId, rating,
//! timestamp}`. The join of the two is an explicit hash-join over the
//! movie id key: duplicate ids on the movies (build) side are rejected
//! at load, ratings referencing unknown movies are dropped and
//! counted.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{DatasetError, DatasetResult};

/// Placeholder MovieLens uses for an empty genre list.
const NO_GENRES: &str = "(no genres listed)";

/// One row of the movies table.
#[derive(Debug, Clone)]
pub struct MovieRow {
    pub movie_id: u32,
    pub title: String,
    pub genres: Vec<String>,
}

impl MovieRow {
    /// Whether the row carries the given genre (case-insensitive).
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

/// Wire form of a movies CSV row.
#[derive(Debug, Deserialize)]
struct RawMovieRow {
    #[serde(rename = "movieId")]
    movie_id: u32,
    title: String,
    genres: String,
}

/// One row of the ratings table.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingRow {
    #[serde(rename = "userId")]
    pub user_id: u32,
    #[serde(rename = "movieId")]
    pub movie_id: u32,
    pub rating: f32,
    pub timestamp: i64,
}

/// The movies table, indexed by movie id.
#[derive(Debug, Clone)]
pub struct MoviesTable {
    dataset_name: String,
    rows: Vec<MovieRow>,
    by_id: HashMap<u32, usize>,
}

impl MoviesTable {
    /// Load from a CSV reader with a `movieId,title,genres` header.
    pub fn from_reader<R: Read>(dataset_name: &str, reader: R) -> DatasetResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let mut rows = Vec::new();
        let mut by_id: HashMap<u32, usize> = HashMap::new();

        for record in csv_reader.deserialize::<RawMovieRow>() {
            let raw = record.map_err(|e| DatasetError::schema(dataset_name, e.to_string()))?;
            if raw.movie_id == 0 {
                return Err(DatasetError::schema(
                    dataset_name,
                    "movie id must be a positive integer",
                ));
            }

            let row = MovieRow {
                movie_id: raw.movie_id,
                title: raw.title,
                genres: split_genres(&raw.genres),
            };

            if by_id.insert(row.movie_id, rows.len()).is_some() {
                return Err(DatasetError::DuplicateKey {
                    dataset: dataset_name.to_string(),
                    movie_id: row.movie_id,
                });
            }
            rows.push(row);
        }

        info!(dataset = dataset_name, movies = rows.len(), "Loaded movies table");

        Ok(Self {
            dataset_name: dataset_name.to_string(),
            rows,
            by_id,
        })
    }

    /// Load from a CSV file.
    pub fn load_file(dataset_name: &str, path: impl AsRef<Path>) -> DatasetResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(dataset_name, file)
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn rows(&self) -> &[MovieRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a movie by id.
    pub fn movie_by_id(&self, movie_id: u32) -> Option<&MovieRow> {
        self.by_id.get(&movie_id).map(|&idx| &self.rows[idx])
    }

    /// Every distinct genre label in the table, sorted.
    pub fn all_unique_genres(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|row| row.genres.iter().cloned())
            .collect()
    }

    /// All rows carrying the given genre.
    pub fn movies_by_genre(&self, genre: &str) -> Vec<&MovieRow> {
        self.rows.iter().filter(|row| row.has_genre(genre)).collect()
    }

    /// Keep only movies carrying at least one of the given genres.
    ///
    /// The genre list is an explicit argument, not ambient state, so
    /// different configurations can filter the same table concurrently.
    pub fn filter_by_genres(&self, genres: &[String]) -> MoviesTable {
        let rows: Vec<MovieRow> = self
            .rows
            .iter()
            .filter(|row| genres.iter().any(|g| row.has_genre(g)))
            .cloned()
            .collect();

        let by_id = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.movie_id, idx))
            .collect();

        MoviesTable {
            dataset_name: self.dataset_name.clone(),
            rows,
            by_id,
        }
    }

    /// Binarize each movie's genres against the table's full genre set.
    ///
    /// The genre order is fixed (sorted) so the produced vectors are
    /// comparable across movies; they double as a simple textual
    /// feature vector.
    pub fn binarized_genres(&self) -> BinarizedGenres {
        let genre_order: Vec<String> = self.all_unique_genres().into_iter().collect();
        let positions: HashMap<&str, usize> = genre_order
            .iter()
            .enumerate()
            .map(|(idx, g)| (g.as_str(), idx))
            .collect();

        let vectors = self
            .rows
            .iter()
            .map(|row| {
                let mut vector = vec![0.0f32; genre_order.len()];
                for genre in &row.genres {
                    if let Some(&idx) = positions.get(genre.as_str()) {
                        vector[idx] = 1.0;
                    }
                }
                (row.movie_id, vector)
            })
            .collect();

        BinarizedGenres {
            genre_order,
            vectors,
        }
    }

    /// Hash-join ratings against this table on the movie id key.
    ///
    /// The table is the build side (unique ids guaranteed at load);
    /// ratings probe it. A rating whose movie id is absent is dropped
    /// from the join and counted in `unmatched_ratings`.
    pub fn join_ratings(&self, ratings: &[RatingRow]) -> JoinOutcome {
        let mut rows = Vec::with_capacity(ratings.len());
        let mut unmatched = 0usize;

        for rating in ratings {
            match self.movie_by_id(rating.movie_id) {
                Some(movie) => rows.push(JoinedRating {
                    user_id: rating.user_id,
                    movie_id: rating.movie_id,
                    title: movie.title.clone(),
                    rating: rating.rating,
                    timestamp: rating.timestamp,
                }),
                None => unmatched += 1,
            }
        }

        debug!(
            dataset = %self.dataset_name,
            joined = rows.len(),
            unmatched,
            "Joined ratings against movies"
        );

        JoinOutcome {
            rows,
            unmatched_ratings: unmatched,
        }
    }

    /// The table's id set, for entity resolution.
    pub fn ids(&self) -> std::collections::HashSet<u32> {
        self.by_id.keys().copied().collect()
    }
}

/// The ratings table.
#[derive(Debug, Clone)]
pub struct RatingsTable {
    rows: Vec<RatingRow>,
}

impl RatingsTable {
    /// Load from a CSV reader with a `userId,movieId,rating,timestamp`
    /// header.
    pub fn from_reader<R: Read>(dataset_name: &str, reader: R) -> DatasetResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.deserialize::<RatingRow>() {
            let row = record.map_err(|e| DatasetError::schema(dataset_name, e.to_string()))?;
            rows.push(row);
        }

        info!(dataset = dataset_name, ratings = rows.len(), "Loaded ratings table");
        Ok(Self { rows })
    }

    /// Load from a CSV file.
    pub fn load_file(dataset_name: &str, path: impl AsRef<Path>) -> DatasetResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(dataset_name, file)
    }

    pub fn rows(&self) -> &[RatingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fixed-order binary genre vectors for a movies table.
#[derive(Debug, Clone)]
pub struct BinarizedGenres {
    /// Sorted genre labels defining the vector dimensions
    pub genre_order: Vec<String>,
    /// One binary vector per movie id
    pub vectors: HashMap<u32, Vec<f32>>,
}

impl BinarizedGenres {
    /// Dimension of the binarized vectors.
    pub fn dimension(&self) -> usize {
        self.genre_order.len()
    }

    /// Vector for one movie, if present.
    pub fn vector_for(&self, movie_id: u32) -> Option<&Vec<f32>> {
        self.vectors.get(&movie_id)
    }
}

/// One joined movies-ratings row.
#[derive(Debug, Clone)]
pub struct JoinedRating {
    pub user_id: u32,
    pub movie_id: u32,
    pub title: String,
    pub rating: f32,
    pub timestamp: i64,
}

/// Result of joining ratings against the movies table.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Ratings that matched a movie, with the movie's title attached
    pub rows: Vec<JoinedRating>,
    /// Ratings dropped because their movie id was not in the table
    pub unmatched_ratings: usize,
}

/// Split a MovieLens `A|B|C` genre string.
fn split_genres(raw: &str) -> Vec<String> {
    if raw.is_empty() || raw == NO_GENRES {
        return Vec::new();
    }
    raw.split('|').map(|g| g.trim().to_string()).collect()
}
