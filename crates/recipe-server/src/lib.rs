use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::{Method, StatusCode};
use recipe_ai::{DesignOrchestrator, PipelineError};
use recipe_core::{Annotation, Geometry, GeometryOutput, Recipe, Validation};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const ADDR_VAR: &str = "RECIPE_SERVER_ADDR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let raw = lookup(ADDR_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw
            .parse()
            .with_context(|| format!("{ADDR_VAR} is not a socket address: '{raw}'"))?;
        Ok(Self { addr })
    }
}

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<DesignOrchestrator>,
}

pub fn app(orchestrator: DesignOrchestrator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/design/generate", post(generate))
        .route("/api/design/update", post(update))
        .layer(cors_layer())
        .with_state(AppState {
            orchestrator: Arc::new(orchestrator),
        })
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct DesignResponse {
    success: bool,
    data: DesignData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DesignData {
    design_id: String,
    recipe: Recipe,
    geometry: Geometry,
    validation: Validation,
    annotations: Vec<Annotation>,
}

impl From<GeometryOutput> for DesignResponse {
    fn from(output: GeometryOutput) -> Self {
        Self {
            success: true,
            data: DesignData {
                design_id: design_id(),
                recipe: output.recipe.recipe,
                geometry: output.geometry,
                validation: output.recipe.validation,
                annotations: output.annotations.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid request",
            message: message.into(),
        }
    }

    fn missing_prompt() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Prompt is required",
            message: "`prompt` must be a non-empty string".to_string(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Internal server error",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.error,
                message: self.message,
            }),
        )
            .into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DesignResponse>, ApiError> {
    let request = parse_json(&body)?;
    let prompt = required_prompt(&request)?;
    info!(prompt = %prompt, "Generating design");

    let output = run_pipeline(state, move |orchestrator| orchestrator.generate(&prompt)).await?;
    Ok(Json(output.into()))
}

async fn update(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DesignResponse>, ApiError> {
    let request = parse_json(&body)?;
    let prompt = required_prompt(&request)?;
    let recipe = request.get("recipe").cloned().unwrap_or(Value::Null);
    info!(prompt = %prompt, "Updating design");

    let output = run_pipeline(state, move |orchestrator| {
        orchestrator.update(&recipe, &prompt)
    })
    .await?;
    Ok(Json(output.into()))
}

/// Runs a pipeline call off the async runtime; every stage blocks.
async fn run_pipeline<F>(state: AppState, job: F) -> Result<GeometryOutput, ApiError>
where
    F: FnOnce(&DesignOrchestrator) -> Result<GeometryOutput, PipelineError> + Send + 'static,
{
    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::task::spawn_blocking(move || job(&orchestrator))
        .await
        .map_err(|err| {
            error!(error = %err, "Pipeline task did not complete");
            ApiError::internal(format!("pipeline task did not complete: {err}"))
        })?
        .map_err(|err| {
            error!(error = %err, "Pipeline failed");
            ApiError::internal(err.to_string())
        })
}

fn parse_json(body: &Bytes) -> Result<Value, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body is required"));
    }

    serde_json::from_slice(body)
        .map_err(|err| ApiError::bad_request(format!("invalid JSON body: {err}")))
}

fn required_prompt(request: &Value) -> Result<String, ApiError> {
    request
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|prompt| !prompt.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(ApiError::missing_prompt)
}

fn design_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("design-{millis}")
}
