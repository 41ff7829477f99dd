use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::state::AppState;

/// GET /api/health — ping the database and report connectivity.
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "message": "Database connection successful" })),
        ),
        Err(e) => {
            error!(error = %e, "database connection failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "Database connection failed" })),
            )
        }
    }
}
