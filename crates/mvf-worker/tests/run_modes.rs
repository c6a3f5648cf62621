//! End-to-end run mode tests against a mock packet store and
//! temporary dataset files.

use std::path::Path;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mvf_models::{
    DistanceMetric, FeatureModel, FusionPolicy, MissingModalityPolicy, PoolingStrategy,
    SourceType,
};
use mvf_worker::{FaultPolicy, PipelineTask, RecsysTask, RunExecutor, RunMode, WorkerConfig};

fn base_config(run_mode: RunMode, output_dir: &Path) -> WorkerConfig {
    WorkerConfig {
        run_mode,
        movie_ids: vec![],
        source: SourceType::MovieTrailers,
        model: FeatureModel::Incp3,
        metric: DistanceMetric::Cosine,
        threshold: 0.5,
        min_shot_len: 1,
        shot_pooling: PoolingStrategy::Mean,
        movie_pooling: PoolingStrategy::Mean,
        fusion_policy: FusionPolicy::Concat,
        missing_modality: MissingModalityPolicy::ZeroFill,
        fusion_weights: (0.5, 0.5),
        max_parallel_movies: 2,
        on_fetch_fault: FaultPolicy::Skip,
        visual_dataset: ("scenesense".to_string(), String::new()),
        enriched_dataset: ("mmtf".to_string(), String::new()),
        textual_dataset: ("movielens".to_string(), String::new()),
        ratings_csv: String::new(),
        main_genres: vec!["Action".to_string(), "Comedy".to_string()],
        output_dir: output_dir.to_string_lossy().into_owned(),
    }
}

fn basis_vector(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; 2048];
    v[axis] = 1.0;
    v
}

async fn mount_packet(server: &MockServer, movie_id: u32, index: u32, frames: Vec<Vec<f32>>) {
    let body = serde_json::json!({
        "movie_id": movie_id,
        "source": "movie_trailers",
        "model": "incp3",
        "sequence_index": index,
        "vectors": frames,
    });
    Mock::given(method("GET"))
        .and(path(format!("/movie_trailers/incp3/{}/packet{}.json", movie_id, index)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn read_artifact(dir: &Path, name: &str) -> serde_json::Value {
    let bytes = tokio::fs::read(dir.join(name)).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn pipeline_run_skips_faulted_movie() {
    let server = MockServer::start().await;

    // Movie 1 has a clean two-shot stream; movie 2 faults on packet 0.
    mount_packet(&server, 1, 0, vec![basis_vector(0), basis_vector(0), basis_vector(1)]).await;
    Mock::given(method("GET"))
        .and(path("/movie_trailers/incp3/2/packet0.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    std::env::set_var("MVF_PACKET_BASE_URL", server.uri());
    std::env::set_var("MVF_FETCH_RETRIES", "0");

    let out = tempfile::tempdir().unwrap();
    let mut config = base_config(
        RunMode::Pipeline(PipelineTask::ShotAgg),
        out.path(),
    );
    config.movie_ids = vec![1, 2];

    let executor = RunExecutor::new(config).unwrap();
    executor.run().await.unwrap();

    let artifact = read_artifact(out.path(), "movie_features.json").await;
    let movies = artifact["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 1, "faulted movie must be skipped, not fatal");
    assert_eq!(movies[0]["movie_id"], 1);
    assert_eq!(movies[0]["frame_count"], 3);
    assert_eq!(movies[0]["shots"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn overlap_run_writes_report() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let visual_path = data.path().join("scenesense.json");
    tokio::fs::write(
        &visual_path,
        r#"[
            {"id": 1, "title": "A", "genres": ["Action"], "release_year": 2000},
            {"id": 2, "title": "B", "genres": ["Comedy"], "release_year": 2001},
            {"id": 3, "title": "C", "genres": ["Drama"], "release_year": 2002}
        ]"#,
    )
    .await
    .unwrap();

    let enriched_path = data.path().join("mmtf.json");
    tokio::fs::write(
        &enriched_path,
        r#"[
            {"id": 2, "title": "B", "genres": ["Comedy"], "release_year": 2001},
            {"id": 3, "title": "C", "genres": ["Drama"], "release_year": 2002},
            {"id": 4, "title": "D", "genres": ["Horror"], "release_year": 2003}
        ]"#,
    )
    .await
    .unwrap();

    let movies_path = data.path().join("movies.csv");
    tokio::fs::write(
        &movies_path,
        "movieId,title,genres\n3,C,Drama\n4,D,Horror\n5,E,Action\n",
    )
    .await
    .unwrap();

    let mut config = base_config(RunMode::Recsys(RecsysTask::Overlap), out.path());
    config.visual_dataset = ("scenesense".to_string(), visual_path.to_string_lossy().into_owned());
    config.enriched_dataset = ("mmtf".to_string(), enriched_path.to_string_lossy().into_owned());
    config.textual_dataset = ("movielens".to_string(), movies_path.to_string_lossy().into_owned());

    let executor = RunExecutor::new(config).unwrap();
    executor.run().await.unwrap();

    let report = read_artifact(out.path(), "overlap_report.json").await;
    assert_eq!(report["matched_count"], 1);
    assert_eq!(report["matched_ids"].as_array().unwrap(), &vec![serde_json::json!(3)]);
    assert_eq!(report["per_dataset_counts"]["scenesense"], 3);

    // Pairwise sets are part of the report for partial-modality use.
    let pairwise = report["pairwise"].as_array().unwrap();
    assert_eq!(pairwise.len(), 3);
}

#[tokio::test]
async fn movielens_run_reports_join_stats() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let movies_path = data.path().join("movies.csv");
    tokio::fs::write(
        &movies_path,
        "movieId,title,genres\n1,Toy Story,Comedy\n6,Heat,Action|Crime\n7,Quiet,Documentary\n",
    )
    .await
    .unwrap();

    let ratings_path = data.path().join("ratings.csv");
    tokio::fs::write(
        &ratings_path,
        "userId,movieId,rating,timestamp\n1,1,4.0,100\n1,6,5.0,101\n2,7,3.0,102\n2,99,1.0,103\n",
    )
    .await
    .unwrap();

    let mut config = base_config(
        RunMode::Datasets(mvf_worker::DatasetTask::Movielens),
        out.path(),
    );
    config.textual_dataset = ("movielens".to_string(), movies_path.to_string_lossy().into_owned());
    config.ratings_csv = ratings_path.to_string_lossy().into_owned();

    let executor = RunExecutor::new(config).unwrap();
    executor.run().await.unwrap();

    let report = read_artifact(out.path(), "movielens_report.json").await;
    assert_eq!(report["movie_count"], 3);
    assert_eq!(report["rating_count"], 4);
    // Main genres are Action and Comedy: movies 1 and 6 survive the
    // filter, so the join matches their two ratings only.
    assert_eq!(report["main_genre_movie_count"], 2);
    assert_eq!(report["joined_rating_count"], 2);
    assert_eq!(report["unmatched_rating_count"], 2);
}
