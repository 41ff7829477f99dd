use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument, warn};

use super::dto::{extracted_data_schema, ExtractRequest};
use super::prompt::build_prompt;
use crate::state::AppState;

pub fn extract_routes() -> Router<AppState> {
    Router::new().route("/extract", post(extract_text))
}

/// POST /api/extract
///
/// Relays the provider's partial-JSON text to the caller as a chunked body,
/// without buffering or re-validating it; the schema handed to the provider is
/// the only shape enforcement. Failures before the stream starts become an
/// opaque 500; mid-stream provider errors are logged by the client and simply
/// terminate the body.
#[instrument(skip(state, payload))]
pub async fn extract_text(
    State(state): State<AppState>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    if payload.text.trim().is_empty() {
        warn!("extract request without text");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No text provided" })),
        ));
    }

    let prompt = build_prompt(&payload.text);
    let stream = state
        .llm
        .stream_object(&prompt, extracted_data_schema())
        .await
        .map_err(|e| {
            error!(error = %e, "structured generation failed to start");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error processing text" })),
            )
        })?;

    let headers = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];
    Ok((headers, Body::from_stream(stream)).into_response())
}
