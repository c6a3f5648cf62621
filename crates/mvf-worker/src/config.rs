//! Worker configuration.
//!
//! All knobs come from environment variables. A missing variable
//! falls back to its default; a present but unrecognized value is a
//! configuration error — mode strings never fall through to a default
//! branch.

use std::str::FromStr;

use mvf_models::{
    DistanceMetric, FeatureModel, FusionPolicy, MissingModalityPolicy, PoolingStrategy,
    SourceType,
};

use crate::error::{WorkerError, WorkerResult};

/// Pipeline-mode sub-tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineTask {
    /// Segment fetched feature streams into shots
    ShotFromFeatures,
    /// Pool each movie's frame stream into one vector, no segmentation
    AggFeatures,
    /// Full frame → shot → movie derivation
    ShotAgg,
}

impl FromStr for PipelineTask {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shot_from_features" => Ok(PipelineTask::ShotFromFeatures),
            "agg_features" => Ok(PipelineTask::AggFeatures),
            "shot_agg" => Ok(PipelineTask::ShotAgg),
            _ => Err(WorkerError::config(format!("Unknown pipeline task: {s}"))),
        }
    }
}

/// Dataset-mode sub-tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetTask {
    /// Metadata catalog report (counts, lookups, classifications)
    Metadata,
    /// Tabular movies/ratings report (genres, filtering, join)
    Movielens,
}

impl FromStr for DatasetTask {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metadata" => Ok(DatasetTask::Metadata),
            "movielens" => Ok(DatasetTask::Movielens),
            _ => Err(WorkerError::config(format!("Unknown dataset task: {s}"))),
        }
    }
}

/// Recsys-mode sub-tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecsysTask {
    /// Cross-dataset overlap report
    Overlap,
    /// Textual + visual fusion for the resolved movie set
    Fusion,
}

impl FromStr for RecsysTask {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overlap" => Ok(RecsysTask::Overlap),
            "fusion" => Ok(RecsysTask::Fusion),
            _ => Err(WorkerError::config(format!("Unknown recsys task: {s}"))),
        }
    }
}

/// Validated top-level run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Pipeline(PipelineTask),
    Datasets(DatasetTask),
    Recsys(RecsysTask),
}

impl RunMode {
    /// Build a run mode from the mode string and its sub-task string.
    pub fn parse(mode: &str, sub_task: &str) -> WorkerResult<Self> {
        match mode.to_lowercase().as_str() {
            "pipeline" => Ok(RunMode::Pipeline(sub_task.parse()?)),
            "datasets" => Ok(RunMode::Datasets(sub_task.parse()?)),
            "recsys" => Ok(RunMode::Recsys(sub_task.parse()?)),
            _ => Err(WorkerError::config(format!("Unknown mode: {mode}"))),
        }
    }
}

/// What to do when one movie's packet fetch faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Log the movie and continue with the rest
    Skip,
    /// Re-run the movie once, then skip it
    Retry,
    /// Fail the whole run
    Abort,
}

impl FromStr for FaultPolicy {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(FaultPolicy::Skip),
            "retry" => Ok(FaultPolicy::Retry),
            "abort" => Ok(FaultPolicy::Abort),
            _ => Err(WorkerError::config(format!("Unknown fault policy: {s}"))),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// What to run
    pub run_mode: RunMode,
    /// Movies to process in pipeline and fusion runs
    pub movie_ids: Vec<u32>,
    /// Feature stream source
    pub source: SourceType,
    /// Feature stream model
    pub model: FeatureModel,
    /// Distance metric for shot boundaries
    pub metric: DistanceMetric,
    /// Shot boundary threshold
    pub threshold: f64,
    /// Minimum shot length after merging
    pub min_shot_len: usize,
    /// Pooling for shot representatives
    pub shot_pooling: PoolingStrategy,
    /// Pooling for movie-level vectors
    pub movie_pooling: PoolingStrategy,
    /// Fusion policy for present modalities
    pub fusion_policy: FusionPolicy,
    /// Policy for a missing modality
    pub missing_modality: MissingModalityPolicy,
    /// Weight pair for weighted-sum fusion (textual, visual)
    pub fusion_weights: (f64, f64),
    /// Max movies processed concurrently
    pub max_parallel_movies: usize,
    /// Per-movie fetch fault handling
    pub on_fetch_fault: FaultPolicy,
    /// Visual dataset name and metadata path
    pub visual_dataset: (String, String),
    /// Enriched dataset name and metadata path
    pub enriched_dataset: (String, String),
    /// Textual dataset name and movies CSV path
    pub textual_dataset: (String, String),
    /// Ratings CSV path
    pub ratings_csv: String,
    /// Main genre list for tabular filtering
    pub main_genres: Vec<String>,
    /// Directory artifacts are written to
    pub output_dir: String,
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let mode = env_or("MVF_MODE", "pipeline");
        let sub_task = match mode.to_lowercase().as_str() {
            "pipeline" => env_or("MVF_PIPELINE_TASK", "shot_agg"),
            "datasets" => env_or("MVF_DATASET_TASK", "metadata"),
            "recsys" => env_or("MVF_RECSYS_TASK", "overlap"),
            _ => String::new(),
        };
        let run_mode = RunMode::parse(&mode, &sub_task)?;

        Ok(Self {
            run_mode,
            movie_ids: parse_id_list(&env_or("MVF_MOVIE_IDS", ""))?,
            source: parse_env("MVF_SOURCE", SourceType::FullMovies)?,
            model: parse_env("MVF_MODEL", FeatureModel::Incp3)?,
            metric: parse_env("MVF_DISTANCE_METRIC", DistanceMetric::Cosine)?,
            threshold: parse_env("MVF_SHOT_THRESHOLD", 0.5)?,
            min_shot_len: parse_env("MVF_MIN_SHOT_LEN", 1usize)?,
            shot_pooling: parse_env("MVF_SHOT_POOLING", PoolingStrategy::Mean)?,
            movie_pooling: parse_env("MVF_MOVIE_POOLING", PoolingStrategy::Mean)?,
            fusion_policy: parse_env("MVF_FUSION_POLICY", FusionPolicy::Concat)?,
            missing_modality: parse_env("MVF_MISSING_MODALITY", MissingModalityPolicy::ZeroFill)?,
            fusion_weights: (
                parse_env("MVF_TEXTUAL_WEIGHT", 0.5)?,
                parse_env("MVF_VISUAL_WEIGHT", 0.5)?,
            ),
            max_parallel_movies: parse_env("MVF_MAX_PARALLEL_MOVIES", 4usize)?,
            on_fetch_fault: parse_env("MVF_ON_FETCH_FAULT", FaultPolicy::Skip)?,
            visual_dataset: (
                env_or("MVF_VISUAL_DATASET_NAME", "scenesense"),
                env_or("MVF_VISUAL_METADATA_PATH", "data/scenesense_metadata.json"),
            ),
            enriched_dataset: (
                env_or("MVF_ENRICHED_DATASET_NAME", "mmtf"),
                env_or("MVF_ENRICHED_METADATA_PATH", "data/mmtf_metadata.json"),
            ),
            textual_dataset: (
                env_or("MVF_TEXTUAL_DATASET_NAME", "movielens"),
                env_or("MVF_MOVIES_CSV", "data/ml-25m/movies.csv"),
            ),
            ratings_csv: env_or("MVF_RATINGS_CSV", "data/ml-25m/ratings.csv"),
            main_genres: parse_genre_list(&env_or(
                "MVF_MAIN_GENRES",
                "Action,Comedy,Drama,Horror,Romance,Sci-Fi,Thriller",
            )),
            output_dir: env_or("MVF_OUTPUT_DIR", "out"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an enum-valued variable; absent means default, invalid is an
/// error.
fn parse_env<T>(key: &str, default: T) -> WorkerResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| WorkerError::config(format!("{key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated list of positive movie ids.
fn parse_id_list(raw: &str) -> WorkerResult<Vec<u32>> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: u32 = part
            .parse()
            .map_err(|_| WorkerError::config(format!("Invalid movie id: {part}")))?;
        if id == 0 {
            return Err(WorkerError::config("Movie id must be a positive integer"));
        }
        ids.push(id);
    }
    Ok(ids)
}

fn parse_genre_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_parse() {
        assert_eq!(
            RunMode::parse("pipeline", "shot_agg").unwrap(),
            RunMode::Pipeline(PipelineTask::ShotAgg)
        );
        assert_eq!(
            RunMode::parse("recsys", "fusion").unwrap(),
            RunMode::Recsys(RecsysTask::Fusion)
        );
    }

    #[test]
    fn test_unknown_mode_is_config_error() {
        assert!(RunMode::parse("training", "x").is_err());
        assert!(RunMode::parse("pipeline", "dl_trailers").is_err());
    }

    #[test]
    fn test_fault_policy_parse() {
        assert_eq!("skip".parse::<FaultPolicy>().unwrap(), FaultPolicy::Skip);
        assert_eq!("retry".parse::<FaultPolicy>().unwrap(), FaultPolicy::Retry);
        assert_eq!("abort".parse::<FaultPolicy>().unwrap(), FaultPolicy::Abort);
        assert!("ignore".parse::<FaultPolicy>().is_err());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("1, 6,32").unwrap(), vec![1, 6, 32]);
        assert!(parse_id_list("").unwrap().is_empty());
        assert!(parse_id_list("1,zero").is_err());
        assert!(parse_id_list("0").is_err());
    }

    #[test]
    fn test_parse_genre_list() {
        assert_eq!(
            parse_genre_list("Action, Drama,"),
            vec!["Action".to_string(), "Drama".to_string()]
        );
    }
}
