//! HTTP API: the prediction form, a JSON endpoint and health/metrics probes

use crate::page::{self, FormValues, Outcome};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use pollutant_lib::{
    health::{ComponentStatus, HealthRegistry},
    models::{InputBounds, Pollutant, RawInput},
    predictor::{Prediction, PredictionService},
    PredictorError,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub health_registry: HealthRegistry,
    pub bounds: InputBounds,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>, health_registry: HealthRegistry) -> Self {
        Self {
            service,
            health_registry,
            bounds: InputBounds::default(),
        }
    }

    /// Validate, align and predict, folding the outcome into the health registry
    async fn predict(&self, input: &RawInput) -> Result<Prediction, PredictorError> {
        self.bounds.validate(input)?;
        let outcome = self.service.predict(input);
        self.health_registry
            .record_outcome(outcome.as_ref().map(|_| ()))
            .await;
        outcome
    }
}

/// Raw form fields; parsed by hand so bad values re-render the page
#[derive(Debug, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub station_id: String,
}

impl FormInput {
    fn parse(&self) -> Result<RawInput, String> {
        let year = parse_field(&self.year, "year")?;
        let month = parse_field(&self.month, "month")?;
        let station_id = parse_field(&self.station_id, "station id")?;
        Ok(RawInput::new(year, month, station_id))
    }

    fn values(&self) -> FormValues {
        FormValues {
            year: self.year.clone(),
            month: self.month.clone(),
            station_id: self.station_id.clone(),
        }
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Please enter a whole number for {}", name))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollutantValue {
    pub pollutant: Pollutant,
    pub value: f64,
}

/// JSON body returned by `/api/v1/predict`
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub input: RawInput,
    pub pollutants: Vec<PollutantValue>,
    pub model_version: String,
    pub generated_at: i64,
    pub unknown_station: bool,
}

impl From<&Prediction> for PredictResponse {
    fn from(prediction: &Prediction) -> Self {
        Self {
            input: prediction.input,
            pollutants: prediction
                .result
                .pairs()
                .map(|(pollutant, value)| PollutantValue { pollutant, value })
                .collect(),
            model_version: prediction.result.model_version.clone(),
            generated_at: prediction.result.generated_at,
            unknown_station: prediction.report.unknown_station,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_status(error: &PredictorError) -> StatusCode {
    match error {
        PredictorError::InvalidInput(_) | PredictorError::UnknownStation { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PredictorError::ModelInvocation(_)
        | PredictorError::SchemaMismatch { .. }
        | PredictorError::ArtifactLoad { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The form, pre-filled with the default values
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let values = FormValues::from(&state.bounds.default_input());
    Html(page::render(&state.bounds, &values, None))
}

/// Form submission: re-render the page with the result or the error
async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FormInput>,
) -> Response {
    let values = form.values();

    let input = match form.parse() {
        Ok(input) => input,
        Err(message) => {
            let html = page::render(&state.bounds, &values, Some(Outcome::Error(&message)));
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response();
        }
    };

    match state.predict(&input).await {
        Ok(prediction) => {
            let html = page::render(
                &state.bounds,
                &values,
                Some(Outcome::Prediction(&prediction)),
            );
            Html(html).into_response()
        }
        Err(e) => {
            let message = e.to_string();
            let html = page::render(&state.bounds, &values, Some(Outcome::Error(&message)));
            (error_status(&e), Html(html)).into_response()
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// JSON prediction endpoint
async fn predict_json(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RawInput>, JsonRejection>,
) -> Response {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    match state.predict(&input).await {
        Ok(prediction) => Json(PredictResponse::from(&prediction)).into_response(),
        Err(e) => error_response(error_status(&e), e.to_string()),
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/v1/predict", post(predict_json))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting prediction form server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
