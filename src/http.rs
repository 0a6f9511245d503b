//! HTTP transport for the casegen service
//!
//! Axum router exposing the generation endpoints, the instruction store,
//! and backend health/model probes. Streamed runs go out as Server-Sent
//! Events; batch runs return one aggregate JSON body.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::multipart::MultipartError,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::Stream;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

use crate::client::OllamaClient;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::CasegenError;
use crate::prompts;
use crate::schemas::{BatchOutcome, BatchSummary, Requirement, StreamEvent};
use crate::upload;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<Engine>,
    pub client: Arc<OllamaClient>,
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        json!({ "error": message }).to_string(),
    )
        .into_response()
}

fn status_for(err: &CasegenError) -> StatusCode {
    match err {
        CasegenError::Validation { .. } => StatusCode::BAD_REQUEST,
        CasegenError::FileFormat { message } if message.starts_with("File too large") => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        CasegenError::FileFormat { .. } => StatusCode::BAD_REQUEST,
        CasegenError::BackendTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        CasegenError::BackendUnreachable { .. } | CasegenError::BackendProtocol { .. } => {
            StatusCode::BAD_GATEWAY
        }
        CasegenError::Config { .. } | CasegenError::Io { .. } | CasegenError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &CasegenError) -> Response {
    error_body(status_for(err), &err.to_string())
}

/// Health check: probes the generation backend's tag endpoint
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    if state.client.ping().await {
        (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "ollama": "connected",
                "timestamp": timestamp
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "ollama": "disconnected",
                "timestamp": timestamp
            })),
        )
    }
}

/// List models available on the backend
async fn models_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.client.list_models().await {
        Ok(models) => (
            StatusCode::OK,
            Json(json!({
                "models": models,
                "default_model": state.client.default_model()
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": e.to_string(),
                "default_model": state.client.default_model()
            })),
        ),
    }
}

/// Route index
async fn home_handler() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the Test Case API",
        "available_routes": [
            { "route": "/health", "method": "GET" },
            { "route": "/models", "method": "GET" },
            { "route": "/generate", "method": "POST" },
            { "route": "/generate/batch", "method": "POST" },
            { "route": "/generate/stream", "method": "POST" },
            { "route": "/generate/file", "method": "POST" },
            { "route": "/generate/file/stream", "method": "POST" },
            { "route": "/instructions", "method": "GET|POST" },
        ],
    }))
}

/// Pull the optional `model` key out of a JSON object body
fn take_model(object: &mut serde_json::Map<String, Value>) -> Option<String> {
    object
        .remove("model")
        .and_then(|v| v.as_str().map(|s| s.to_string()))
}

/// Extract the `requirements` array plus optional model from a batch body
fn batch_payload(body: Value) -> Result<(Vec<Requirement>, Option<String>), CasegenError> {
    let mut object = match body {
        Value::Object(object) => object,
        _ => {
            return Err(CasegenError::Validation {
                message: "No JSON body provided".to_string(),
            });
        }
    };
    let model = take_model(&mut object);

    let requirements = match object.remove("requirements") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(CasegenError::Validation {
                message: "'requirements' must be an array".to_string(),
            });
        }
        None => {
            return Err(CasegenError::Validation {
                message: "No 'requirements' array in JSON body".to_string(),
            });
        }
    };

    if requirements.is_empty() {
        return Err(CasegenError::Validation {
            message: "requirements array is empty".to_string(),
        });
    }

    requirements
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Requirement(fields)),
            _ => Err(CasegenError::Validation {
                message: format!("requirement at index {} must be a JSON object", index),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|reqs| (reqs, model))
}

fn batch_response(
    outcomes: Vec<BatchOutcome>,
    summary: BatchSummary,
    filename: Option<&str>,
) -> Response {
    let (results, errors): (Vec<_>, Vec<_>) = outcomes
        .into_iter()
        .partition(|outcome| outcome.outcome.is_success());

    let mut body = json!({
        "total": summary.total,
        "successful": summary.successful,
        "failed": summary.failed,
        "results": results,
    });
    if !errors.is_empty() {
        body["errors"] = json!(errors);
    }
    if let Some(filename) = filename {
        body["filename"] = json!(filename);
    }

    let status = if summary.failed == 0 {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (status, Json(body)).into_response()
}

/// Generate a test case for a single requirement
async fn generate_handler(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let mut object = match body {
        Value::Object(object) => object,
        _ => return error_body(StatusCode::BAD_REQUEST, "No JSON body provided"),
    };
    let model = take_model(&mut object);
    let requirement = Requirement(object);

    match state
        .engine
        .generate_one(&requirement, model.as_deref())
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            tracing::error!("Error generating test case: {}", e);
            error_response(&e)
        }
    }
}

/// Generate test cases for multiple requirements
async fn generate_batch_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    let (requirements, model) = match batch_payload(body) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e),
    };

    let (outcomes, summary) = state.engine.run_batch(&requirements, model.as_deref()).await;
    batch_response(outcomes, summary, None)
}

fn sse_event(event: &StreamEvent) -> Event {
    match Event::default().json_data(event) {
        Ok(event) => event,
        Err(e) => Event::default().data(json!({ "type": "error", "error": e.to_string() }).to_string()),
    }
}

fn sse_from_receiver(
    rx: mpsc::Receiver<StreamEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|event| (Ok::<_, Infallible>(sse_event(&event)), rx))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Streamed batch generation over Server-Sent Events
async fn generate_stream_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = match batch_payload(body) {
        Ok((requirements, model)) => state.engine.stream(requirements, model),
        Err(e) => Engine::error_stream(e.to_string()),
    };
    sse_from_receiver(rx)
}

/// Classify a multipart read failure. A body-limit trip surfaces as the
/// same oversize rejection the explicit byte-cap check produces.
fn multipart_error(err: MultipartError, max_mb: usize, context: &str) -> CasegenError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CasegenError::FileFormat {
            message: format!("File too large (max {}MB)", max_mb),
        }
    } else {
        CasegenError::FileFormat {
            message: format!("{}: {}", context, err),
        }
    }
}

/// Pull the uploaded file (and optional model) out of a multipart body
async fn read_upload(
    multipart: &mut Multipart,
    max_mb: usize,
) -> Result<(String, Vec<u8>, Option<String>), CasegenError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut model: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_mb, "invalid multipart body"))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_mb, "failed to read upload"))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("model") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_mb, "failed to read model field"))?;
                if !text.is_empty() {
                    model = Some(text);
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| CasegenError::FileFormat {
        message: "No file part in request".to_string(),
    })?;
    if filename.is_empty() {
        return Err(CasegenError::FileFormat {
            message: "No selected file".to_string(),
        });
    }
    if !filename.ends_with(".json") {
        return Err(CasegenError::FileFormat {
            message: "File must be a JSON file".to_string(),
        });
    }
    Ok((filename, bytes, model))
}

/// Generate test cases from an uploaded JSON file, aggregate response
async fn generate_file_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let (filename, bytes, model) =
        match read_upload(&mut multipart, state.config.max_upload_mb()).await {
            Ok(parts) => parts,
            Err(e) => return error_response(&e),
        };
    tracing::info!(
        "Processing file upload: {} ({} bytes), model: {}",
        filename,
        bytes.len(),
        model.as_deref().unwrap_or("default")
    );

    let requirements = match upload::parse_upload(
        &bytes,
        state.config.max_upload_bytes,
        state.config.max_upload_mb(),
    ) {
        Ok(requirements) => requirements,
        Err(e) => {
            tracing::warn!("Rejected upload {}: {}", filename, e);
            return error_response(&e);
        }
    };

    let (outcomes, summary) = state.engine.run_batch(&requirements, model.as_deref()).await;
    batch_response(outcomes, summary, Some(&filename))
}

/// Generate test cases from an uploaded JSON file, streamed response
async fn generate_file_stream_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = match read_upload(&mut multipart, state.config.max_upload_mb()).await {
        Ok((_filename, bytes, model)) => match upload::parse_upload(
            &bytes,
            state.config.max_upload_bytes,
            state.config.max_upload_mb(),
        ) {
            Ok(requirements) => state.engine.stream(requirements, model),
            Err(e) => Engine::error_stream(e.to_string()),
        },
        Err(e) => Engine::error_stream(e.to_string()),
    };
    sse_from_receiver(rx)
}

/// Read the current system instructions
async fn instructions_get_handler(State(state): State<AppState>) -> impl IntoResponse {
    let path = &state.config.instructions_path;
    Json(json!({
        "instructions": prompts::load_system_instructions(path),
        "file_path": path.display().to_string(),
        "file_exists": path.exists(),
    }))
}

/// Update the system instructions
async fn instructions_post_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    let instructions = match body.get("instructions").and_then(|v| v.as_str()) {
        Some(text) => text.trim().to_string(),
        None => return error_body(StatusCode::BAD_REQUEST, "No 'instructions' field in JSON body"),
    };
    if let Err(e) = prompts::validate_instructions(&instructions) {
        return error_response(&e);
    }
    if let Err(e) = prompts::save_system_instructions(&state.config.instructions_path, &instructions)
    {
        tracing::error!("Error updating instructions: {}", e);
        return error_response(&e);
    }
    Json(json!({
        "status": "success",
        "message": "System instructions updated",
        "file_path": state.config.instructions_path.display().to_string(),
    }))
    .into_response()
}

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    // Let oversize uploads through to our own size check so they fail with
    // the documented FileFormat error rather than the extractor's default
    let body_limit = state.config.max_upload_bytes.saturating_mul(2);
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/models", get(models_handler))
        .route("/generate", post(generate_handler))
        .route("/generate/batch", post(generate_batch_handler))
        .route("/generate/stream", post(generate_stream_handler))
        .route("/generate/file", post(generate_file_handler))
        .route("/generate/file/stream", post(generate_file_stream_handler))
        .route(
            "/instructions",
            get(instructions_get_handler).post(instructions_post_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(config: Arc<Config>) -> anyhow::Result<()> {
    let client = Arc::new(OllamaClient::new(&config)?);
    let engine = Arc::new(Engine::new(
        config.clone(),
        client.clone() as Arc<dyn crate::client::Generator>,
    ));
    let state = AppState {
        config: config.clone(),
        engine,
        client,
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.http_bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!(
        "Starting Test Case Generator API on {} ({} mode)",
        config.http_bind,
        config.environment
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
