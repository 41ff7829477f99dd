use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod prompt;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::extract_routes())
}
