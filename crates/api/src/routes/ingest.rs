//! Ingestion endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::models::{IngestionCursor, RepoRef};
use processor::{LatencyStore, TickReport};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiResult, OptionExt};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub reports: Vec<TickReport>,
    /// Set when the tick stopped on a rate limit
    pub retry_after_secs: Option<u64>,
}

/// Current cursor of a repository
/// GET /api/cursors/:owner/:name
pub async fn cursor(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
) -> ApiResult<Json<IngestionCursor>> {
    let repo = RepoRef::new(owner, name);
    let cursor = state
        .store
        .cursor(&repo)
        .await?
        .not_found(format!("No cursor for {}", repo))?;
    Ok(Json(cursor))
}

/// Run one ingestion tick over all tracked repositories
/// POST /api/ingest
pub async fn trigger(State(state): State<Arc<AppState>>) -> Json<IngestResponse> {
    info!(
        "Ingestion tick requested for {} repos",
        state.config.tracked_repos.len()
    );
    let (reports, retry_after_secs) = state.ingestor.tick(&state.config.tracked_repos).await;
    Json(IngestResponse {
        reports,
        retry_after_secs,
    })
}

/// Run one ingestion tick for a single repository
/// POST /api/ingest/:owner/:name
pub async fn trigger_repo(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
) -> ApiResult<Json<TickReport>> {
    let repo = RepoRef::new(owner, name);
    info!("Ingestion tick requested for {}", repo);
    let report = state.ingestor.tick_repo(&repo).await?;
    Ok(Json(report))
}
