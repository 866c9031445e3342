use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use std::{sync::Arc, time::Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    engine::PhishingEngine,
    error::{validation_error, AppError},
    metrics::Metrics,
    render,
    types::{HealthResponse, PredictRequest, PredictResponse, Prediction},
};

pub const MAX_URL_LEN: usize = 2048;

pub struct AppContext {
    pub engine: PhishingEngine,
    pub metrics: Metrics,
}

pub type AppState = Arc<AppContext>;

impl AppContext {
    pub fn new(engine: PhishingEngine) -> AppState {
        Arc::new(Self {
            engine,
            metrics: Metrics::new(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_api))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn validate_url(url: &str) -> Result<&str, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(validation_error("URL must not be empty"));
    }
    if url.chars().count() > MAX_URL_LEN {
        return Err(validation_error("URL too long"));
    }
    Ok(url)
}

fn run_prediction(state: &AppContext, url: &str) -> Result<Prediction, AppError> {
    let start = Instant::now();
    let url = match validate_url(url) {
        Ok(url) => url,
        Err(e) => {
            warn!("Rejected prediction request: {}", e);
            state.metrics.observe_rejected();
            return Err(e);
        }
    };

    let prediction = state.engine.predict(url)?;
    state.metrics.observe_prediction(prediction.label, start.elapsed());
    info!(
        "Prediction for {}: {} ({})",
        url,
        prediction.label,
        prediction.confidence_percent()
    );
    Ok(prediction)
}

async fn index() -> Html<String> {
    Html(render::index_page())
}

async fn predict_form(
    State(state): State<AppState>,
    Form(request): Form<PredictRequest>,
) -> Response {
    match run_prediction(&state, &request.url) {
        Ok(prediction) => Html(render::result_page(request.url.trim(), &prediction)).into_response(),
        Err(AppError::InvalidInput(message)) => (
            StatusCode::BAD_REQUEST,
            Html(render::error_page(&request.url, &message)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn predict_api(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let prediction = run_prediction(&state, &request.url)?;
    let model = state.engine.model();

    Ok(Json(PredictResponse {
        prediction_id: Uuid::new_v4(),
        url: request.url.trim().to_string(),
        label: prediction.label,
        confidence: prediction.confidence,
        probability_of_legitimate: prediction.probability_of_legitimate,
        threshold: state.engine.threshold().value(),
        model_version: model.version().to_string(),
        features: prediction.features,
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.engine.model();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model_kind: model.kind(),
        model_version: model.version().to_string(),
        model_sha256: model.digest().to_string(),
        threshold: state.engine.threshold().value(),
        feature_set: state.engine.schema().as_str(),
        timestamp: chrono::Utc::now(),
    })
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.format()
}
