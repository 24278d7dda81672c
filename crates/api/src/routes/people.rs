//! Per-person availability

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Defaults to now
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Availability {
    pub login: String,
    pub at: DateTime<Utc>,
    pub working_day: bool,
}

/// GET /api/people/:login/availability
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Path(login): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Json<Availability>> {
    let at = query.at.unwrap_or_else(Utc::now);
    let working_day = state
        .calendar
        .is_working_day(at, &login, state.store.as_ref())
        .await?;
    Ok(Json(Availability {
        login,
        at,
        working_day,
    }))
}
