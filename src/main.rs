mod badge;
mod notify;
mod prediction;
mod schedule;
mod scoring;
mod shared;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use badge::{HistoryBadgeEvaluator, InMemoryBadgeLedger};
use notify::TracingNotificationDispatcher;
use prediction::repository::InMemoryPredictionRepository;
// use prediction::repository::PostgresPredictionRepository; // For production
use prediction::{PredictionRepository, PredictionService};
use schedule::{InMemoryScheduleSource, LockConfig};
use scoring::{
    start_scoring_poll_task, InMemoryResultsSource, InMemoryScoringJobStore, JobEventBus,
    PollConfig, ScoringJobRunner, ScoringJobStore,
};
use shared::AppState;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridcast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gridcast scoring engine");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let prediction_repository: Arc<dyn PredictionRepository> =
        Arc::new(InMemoryPredictionRepository::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let prediction_repository: Arc<dyn PredictionRepository> =
    //     Arc::new(PostgresPredictionRepository::new(pool));

    let schedule_source = Arc::new(InMemoryScheduleSource::new());
    let results_source = Arc::new(InMemoryResultsSource::new());
    let job_store: Arc<dyn ScoringJobStore> = Arc::new(InMemoryScoringJobStore::new());
    let badge_ledger = Arc::new(InMemoryBadgeLedger::new());

    let prediction_service = Arc::new(PredictionService::new(
        prediction_repository.clone(),
        schedule_source,
        LockConfig::default(),
    ));

    let job_runner = Arc::new(
        ScoringJobRunner::builder(
            results_source,
            prediction_repository.clone(),
            job_store.clone(),
            Arc::new(HistoryBadgeEvaluator::new(
                prediction_repository,
                badge_ledger,
            )),
            Arc::new(TracingNotificationDispatcher::new()),
        )
        .with_events(JobEventBus::new())
        .build(),
    );

    // Periodic discovery of newly completed sessions; re-entrant, so the
    // on-demand trigger below can run alongside it safely.
    tokio::spawn(start_scoring_poll_task(
        job_runner.clone(),
        PollConfig::default(),
    ));

    let app_state = AppState::new(prediction_service, job_runner, job_store);

    let app = Router::new()
        .route(
            "/races/:race_id/prediction",
            put(prediction::handlers::upsert_prediction)
                .get(prediction::handlers::get_prediction)
                .delete(prediction::handlers::delete_prediction),
        )
        .route("/scoring/run", post(scoring::handlers::run_scoring))
        .route("/scoring/rescore", post(scoring::handlers::rescore_session))
        .route("/scoring/jobs", get(scoring::handlers::list_jobs))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
