//! Run executor.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use mvf_datasets::{MetadataCatalog, MoviesTable, RatingsTable};
use mvf_fetch::{FetcherConfig, PacketFetcher};
use mvf_fusion::{resolve, Dataset, Fuser};
use mvf_pipeline::{MoviePipeline, PartialAggregate, ShotSegmenter};

use crate::config::{DatasetTask, FaultPolicy, PipelineTask, RecsysTask, RunMode, WorkerConfig};
use crate::error::{WorkerError, WorkerResult};

/// Executes one configured run.
///
/// Dispatch is pure: the mode picks which components run. Movie-level
/// work runs under a semaphore with per-movie fault isolation; one
/// movie's fetch fault never blocks the others, and what happens to
/// the faulted movie is the configured [`FaultPolicy`]'s call.
pub struct RunExecutor {
    config: WorkerConfig,
    fetcher: PacketFetcher,
    run_id: String,
}

impl RunExecutor {
    /// Create a new executor.
    pub fn new(config: WorkerConfig) -> WorkerResult<Self> {
        let fetcher_config = FetcherConfig {
            max_parallel_movies: config.max_parallel_movies,
            ..FetcherConfig::from_env()
        };
        let fetcher = PacketFetcher::new(fetcher_config)?;
        let run_id = format!("run-{}", Uuid::new_v4());

        Ok(Self {
            config,
            fetcher,
            run_id,
        })
    }

    /// Execute the configured run mode.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(run_id = %self.run_id, mode = ?self.config.run_mode, "Starting run");

        match self.config.run_mode {
            RunMode::Pipeline(task) => self.run_pipeline(task).await?,
            RunMode::Datasets(task) => self.run_datasets(task).await?,
            RunMode::Recsys(task) => self.run_recsys(task).await?,
        }

        info!(run_id = %self.run_id, "Run finished");
        Ok(())
    }

    fn segmenter(&self) -> ShotSegmenter {
        ShotSegmenter::new()
            .with_metric(self.config.metric)
            .with_threshold(self.config.threshold)
            .with_min_shot_len(self.config.min_shot_len)
            .with_representative_pooling(self.config.shot_pooling)
    }

    fn pipeline(&self) -> MoviePipeline {
        MoviePipeline::new()
            .with_segmenter(self.segmenter())
            .with_movie_pooling(self.config.movie_pooling)
    }

    // ------------------------------------------------------------------
    // Pipeline mode
    // ------------------------------------------------------------------

    async fn run_pipeline(&self, task: PipelineTask) -> WorkerResult<()> {
        if self.config.movie_ids.is_empty() {
            return Err(WorkerError::config(
                "MVF_MOVIE_IDS must list at least one movie for pipeline runs",
            ));
        }

        let artifacts = self.process_movies(task).await?;
        let produced = artifacts.len();

        let name = match task {
            PipelineTask::ShotFromFeatures => "shots.json",
            PipelineTask::AggFeatures => "movie_vectors.json",
            PipelineTask::ShotAgg => "movie_features.json",
        };
        self.write_artifact(name, &json!({ "movies": artifacts })).await?;

        info!(
            requested = self.config.movie_ids.len(),
            produced,
            "Pipeline run complete"
        );
        Ok(())
    }

    /// Drive every configured movie through the task with bounded
    /// parallelism, applying the fault policy per movie.
    async fn process_movies(&self, task: PipelineTask) -> WorkerResult<Vec<serde_json::Value>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_movies.max(1)));

        let futures: Vec<_> = self
            .config
            .movie_ids
            .iter()
            .map(|&movie_id| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore.acquire().await.expect("semaphore closed");
                    let mut result = self.process_one(task, movie_id).await;
                    if result.is_err() && self.config.on_fetch_fault == FaultPolicy::Retry {
                        warn!(movie_id, "Retrying movie after fault");
                        result = self.process_one(task, movie_id).await;
                    }
                    (movie_id, result)
                }
            })
            .collect();

        let mut artifacts = Vec::with_capacity(self.config.movie_ids.len());
        for (movie_id, result) in join_all(futures).await {
            match result {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) if self.config.on_fetch_fault == FaultPolicy::Abort => {
                    return Err(WorkerError::Aborted {
                        movie_id,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(movie_id, error = %e, "Skipping movie after fault");
                }
            }
        }
        Ok(artifacts)
    }

    async fn process_one(
        &self,
        task: PipelineTask,
        movie_id: u32,
    ) -> WorkerResult<serde_json::Value> {
        match task {
            PipelineTask::ShotFromFeatures => {
                let frames = self.collect_frames(movie_id).await?;
                let shots = self.segmenter().segment(movie_id, &frames)?;
                Ok(json!({
                    "movie_id": movie_id,
                    "frame_count": frames.len(),
                    "shots": shots,
                }))
            }
            PipelineTask::AggFeatures => {
                let vector = self.pool_movie_stream(movie_id).await?;
                Ok(json!({
                    "movie_id": movie_id,
                    "pooling": self.config.movie_pooling,
                    "vector": vector,
                }))
            }
            PipelineTask::ShotAgg => {
                let frames = self.collect_frames(movie_id).await?;
                let features = self.pipeline().run_on_frames(movie_id, &frames)?;
                Ok(json!({
                    "movie_id": movie_id,
                    "frame_count": features.frame_count,
                    "shots": features.shots,
                    "movie_vector": features.movie_vector,
                }))
            }
        }
    }

    /// Flatten one movie's packet stream into its ordered frames.
    async fn collect_frames(&self, movie_id: u32) -> WorkerResult<Vec<Vec<f32>>> {
        let mut stream =
            self.fetcher
                .stream(self.config.source, self.config.model, movie_id)?;
        let mut frames = Vec::new();
        while let Some(packet) = stream.next().await? {
            frames.extend(packet.vectors);
        }
        Ok(frames)
    }

    /// Pool a movie's whole stream without segmentation.
    ///
    /// Each packet is reduced to a partial aggregate and the partials
    /// are merged, so the result matches a one-shot reduction while
    /// only ever holding one packet's frames.
    async fn pool_movie_stream(&self, movie_id: u32) -> WorkerResult<Vec<f32>> {
        let mut stream =
            self.fetcher
                .stream(self.config.source, self.config.model, movie_id)?;

        let mut total: Option<PartialAggregate> = None;
        while let Some(packet) = stream.next().await? {
            let Some(first) = packet.vectors.first() else {
                continue;
            };
            let mut chunk = PartialAggregate::new(self.config.movie_pooling, first.len());
            for frame in &packet.vectors {
                chunk.push(frame)?;
            }
            match total.as_mut() {
                Some(total) => total.merge(&chunk)?,
                None => total = Some(chunk),
            }
        }

        let total = total.ok_or(mvf_pipeline::PipelineError::EmptyInput)?;
        Ok(total.finish()?)
    }

    // ------------------------------------------------------------------
    // Datasets mode
    // ------------------------------------------------------------------

    async fn run_datasets(&self, task: DatasetTask) -> WorkerResult<()> {
        match task {
            DatasetTask::Metadata => {
                let (name, path) = &self.config.visual_dataset;
                let catalog = MetadataCatalog::load_file(name, path)?;

                let sample_id = self.config.movie_ids.first().copied().unwrap_or(6);
                let by_id = catalog.movie_by_id(sample_id);
                let random = catalog.random_movie();
                info!(
                    dataset = %name,
                    movies = catalog.count_movies(),
                    sample_id,
                    sample_found = by_id.is_some(),
                    random_pick = ?random.map(|m| m.id),
                    "Metadata catalog loaded"
                );

                self.write_artifact(
                    "metadata_report.json",
                    &json!({
                        "dataset": name,
                        "movie_count": catalog.count_movies(),
                        "movie_by_id": by_id,
                        "years_by_count": catalog.classify_years_by_count(),
                        "movies_by_genre": catalog.classify_movies_by_genre(),
                        "average_genres_per_movie": catalog.average_genres_per_movie(),
                    }),
                )
                .await?;
            }
            DatasetTask::Movielens => {
                let (name, movies_csv) = &self.config.textual_dataset;
                let movies = MoviesTable::load_file(name, movies_csv)?;
                let ratings = RatingsTable::load_file(name, &self.config.ratings_csv)?;

                let genres = movies.all_unique_genres();
                let main_genre_movies = movies.filter_by_genres(&self.config.main_genres);
                let binarized = movies.binarized_genres();
                let joined = main_genre_movies.join_ratings(ratings.rows());

                info!(
                    dataset = %name,
                    movies = movies.len(),
                    ratings = ratings.len(),
                    genres = genres.len(),
                    main_genre_movies = main_genre_movies.len(),
                    joined = joined.rows.len(),
                    unmatched_ratings = joined.unmatched_ratings,
                    "Tabular dataset processed"
                );

                self.write_artifact(
                    "movielens_report.json",
                    &json!({
                        "dataset": name,
                        "movie_count": movies.len(),
                        "rating_count": ratings.len(),
                        "unique_genres": genres,
                        "main_genres": self.config.main_genres,
                        "main_genre_movie_count": main_genre_movies.len(),
                        "binarized_dimension": binarized.dimension(),
                        "joined_rating_count": joined.rows.len(),
                        "unmatched_rating_count": joined.unmatched_ratings,
                    }),
                )
                .await?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Recsys mode
    // ------------------------------------------------------------------

    async fn run_recsys(&self, task: RecsysTask) -> WorkerResult<()> {
        match task {
            RecsysTask::Overlap => {
                let report = self.resolve_overlap()?;
                info!(
                    matched = report.matched_count,
                    datasets = ?report.dataset_names,
                    "Overlap resolved"
                );
                self.write_artifact("overlap_report.json", &serde_json::to_value(&report)?)
                    .await?;
            }
            RecsysTask::Fusion => {
                let fused = self.fuse_resolved_movies().await?;
                info!(fused = fused.len(), "Fusion complete");
                self.write_artifact("fused_vectors.json", &json!({ "movies": fused }))
                    .await?;
            }
        }
        Ok(())
    }

    /// Load the three configured datasets and resolve their overlap.
    fn resolve_overlap(&self) -> WorkerResult<mvf_models::OverlapReport> {
        let (visual_name, visual_path) = &self.config.visual_dataset;
        let (enriched_name, enriched_path) = &self.config.enriched_dataset;
        let (textual_name, movies_csv) = &self.config.textual_dataset;

        let visual = MetadataCatalog::load_file(visual_name, visual_path)?;
        let enriched = MetadataCatalog::load_file(enriched_name, enriched_path)?;
        let movies = MoviesTable::load_file(textual_name, movies_csv)?;

        Ok(resolve(
            &Dataset::new(visual_name.clone(), visual.ids()),
            &Dataset::new(enriched_name.clone(), enriched.ids()),
            &Dataset::new(textual_name.clone(), movies.ids()),
        ))
    }

    /// Fuse textual and visual vectors for the resolved movie set.
    ///
    /// Candidates are the visual catalog's movies (optionally narrowed
    /// by `MVF_MOVIE_IDS`); the textual side is each movie's binarized
    /// genre vector, looked up per candidate, with absence handled by
    /// the configured missing-modality policy.
    async fn fuse_resolved_movies(&self) -> WorkerResult<Vec<mvf_models::FusedVector>> {
        let (visual_name, visual_path) = &self.config.visual_dataset;
        let (textual_name, movies_csv) = &self.config.textual_dataset;

        let catalog = MetadataCatalog::load_file(visual_name, visual_path)?;
        let movies = MoviesTable::load_file(textual_name, movies_csv)?;
        let binarized = movies.binarized_genres();

        let candidates: Vec<u32> = if self.config.movie_ids.is_empty() {
            let mut ids: Vec<u32> = catalog.ids().into_iter().collect();
            ids.sort_unstable();
            ids
        } else {
            self.config.movie_ids.clone()
        };

        let fuser = Fuser::new(
            self.config.fusion_policy,
            self.config.missing_modality,
            binarized.dimension(),
            self.config.model.dimension(),
        )?
        .with_weights(self.config.fusion_weights.0, self.config.fusion_weights.1);

        // Visual vectors come out of the full frame → shot → movie
        // pipeline, bounded-parallel across movies.
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_movies.max(1)));
        let futures: Vec<_> = candidates
            .iter()
            .map(|&movie_id| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore.acquire().await.expect("semaphore closed");
                    let mut result = self.derive_visual_vector(movie_id).await;
                    if result.is_err() && self.config.on_fetch_fault == FaultPolicy::Retry {
                        warn!(movie_id, "Retrying visual derivation after fault");
                        result = self.derive_visual_vector(movie_id).await;
                    }
                    (movie_id, result)
                }
            })
            .collect();

        let mut fused = Vec::new();
        for (movie_id, result) in join_all(futures).await {
            let visual = match result {
                Ok(visual) => visual,
                Err(e) if self.config.on_fetch_fault == FaultPolicy::Abort => {
                    return Err(WorkerError::Aborted {
                        movie_id,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(movie_id, error = %e, "Skipping movie after fault");
                    continue;
                }
            };

            let textual = binarized.vector_for(movie_id);
            if let Some(vector) =
                fuser.fuse(movie_id, textual.map(|v| v.as_slice()), visual.as_deref())?
            {
                fused.push(vector);
            }
        }

        Ok(fused)
    }

    /// Derive one movie's visual vector; a movie with no packets has
    /// no visual modality.
    async fn derive_visual_vector(&self, movie_id: u32) -> WorkerResult<Option<Vec<f32>>> {
        let frames = self.collect_frames(movie_id).await?;
        if frames.is_empty() {
            return Ok(None);
        }
        let features = self.pipeline().run_on_frames(movie_id, &frames)?;
        Ok(Some(features.movie_vector.vector))
    }

    // ------------------------------------------------------------------
    // Artifacts
    // ------------------------------------------------------------------

    async fn write_artifact(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> WorkerResult<PathBuf> {
        let dir = PathBuf::from(&self.config.output_dir);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(name);
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&path, bytes).await?;

        info!(path = %path.display(), "Wrote artifact");
        Ok(path)
    }
}
