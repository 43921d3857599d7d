use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use stayrec::{init_tracing, AppState, Config, EngineError};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct ItemQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    limit: Option<usize>,
    content_weight: Option<f64>,
    collab_weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EvaluationQuery {
    k: Option<usize>,
    retrain: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

fn error_response<T>(error: EngineError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match &error {
        EngineError::InvalidEvent { .. } | EngineError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::Untrained | EngineError::NoData => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(error.to_string())))
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, String>>> {
    let status = state.recommendation_service.status();
    let mut health = HashMap::new();
    health.insert("status".to_string(), "healthy".to_string());
    health.insert("service".to_string(), "stayrec".to_string());
    health.insert(
        "collaborative_trained".to_string(),
        status.collaborative_trained.to_string(),
    );
    health.insert(
        "content_trained".to_string(),
        status.content_trained.to_string(),
    );

    Json(ApiResponse::success(health))
}

async fn record_event(
    State(state): State<AppState>,
    Json(payload): Json<stayrec::EventPayload>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ApiResponse<String>>)> {
    match state.recommendation_service.record_event(payload).await {
        Ok(()) => Ok(Json(ApiResponse::success("Event recorded".to_string()))),
        Err(error) => Err(error_response(error)),
    }
}

async fn similar_items(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Query(params): Query<ItemQuery>,
) -> Result<Json<ApiResponse<stayrec::Recommendations>>, (StatusCode, Json<ApiResponse<stayrec::Recommendations>>)>
{
    let limit = params
        .limit
        .unwrap_or(state.config.recommendation.limit);

    match state
        .recommendation_service
        .similar_items(item_id, limit)
        .await
    {
        Ok(recommendations) => Ok(Json(ApiResponse::success(recommendations))),
        Err(error) => Err(error_response(error)),
    }
}

async fn recommendations_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<UserQuery>,
) -> Result<Json<ApiResponse<stayrec::Recommendations>>, (StatusCode, Json<ApiResponse<stayrec::Recommendations>>)>
{
    let rec = &state.config.recommendation;
    let limit = params.limit.unwrap_or(rec.limit);
    let content_weight = params.content_weight.unwrap_or(rec.content_weight);
    let collab_weight = params.collab_weight.unwrap_or(rec.collab_weight);

    match state
        .recommendation_service
        .recommend_for_user(user_id, limit, content_weight, collab_weight)
        .await
    {
        Ok(recommendations) => Ok(Json(ApiResponse::success(recommendations))),
        Err(error) => Err(error_response(error)),
    }
}

async fn retrain_model(
    State(state): State<AppState>,
) -> Json<ApiResponse<stayrec::RetrainReport>> {
    let report = state.recommendation_service.retrain().await;
    Json(ApiResponse::success(report))
}

async fn model_status(State(state): State<AppState>) -> Json<ApiResponse<stayrec::ModelStatus>> {
    Json(ApiResponse::success(state.recommendation_service.status()))
}

async fn model_evaluation(
    State(state): State<AppState>,
    Query(params): Query<EvaluationQuery>,
) -> Result<Json<ApiResponse<stayrec::EvaluationReport>>, (StatusCode, Json<ApiResponse<stayrec::EvaluationReport>>)>
{
    let k = params.k.unwrap_or(state.config.evaluation.k);
    let retrain = params.retrain.unwrap_or(false);

    match state.recommendation_service.evaluate(k, retrain).await {
        Ok(report) => Ok(Json(ApiResponse::success(report))),
        Err(error) => Err(error_response(error)),
    }
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(record_event))
        .route("/recommendations/items/:item_id", get(similar_items))
        .route(
            "/recommendations/users/:user_id",
            get(recommendations_for_user),
        )
        .route("/model/retrain", post(retrain_model))
        .route("/model/status", get(model_status))
        .route("/model/evaluation", get(model_evaluation))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("config file not found, using default configuration");
        Config::default()
    };
    info!("starting stayrec server with config: {:?}", config.server);

    let state = AppState::new(config.clone())?;

    // init-on-first-use: build once at startup if any data is present;
    // serving starts either way and a retrain can be triggered later
    let report = state.recommendation_service.retrain().await;
    info!(
        collaborative = report.collaborative,
        content = report.content,
        "initial model build"
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()).await?;
    info!("server listening on {}", config.server.socket_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
