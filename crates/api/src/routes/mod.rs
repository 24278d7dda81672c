//! API routes

pub mod health;
pub mod ingest;
pub mod people;
pub mod stats;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/stats", get(stats::group))
        .route("/api/stats/:login", get(stats::individual))
        .route("/api/people/:login/availability", get(people::availability))
        .route("/api/cursors/:owner/:name", get(ingest::cursor))
        .route("/api/ingest", post(ingest::trigger))
        .route("/api/ingest/:owner/:name", post(ingest::trigger_repo))
        .with_state(state)
}
