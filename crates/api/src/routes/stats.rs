//! Review latency statistics

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use common::models::Summary;
use processor::calendar::week_start_datetime;
use processor::stats;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_period")]
    pub period: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupQuery {
    /// Comma-separated logins
    pub logins: String,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "all".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndividualResponse {
    pub login: String,
    /// `null` when there is not enough data
    pub stats: Option<Summary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub stats: BTreeMap<String, Summary>,
}

/// Resolve the date range of a query. Explicit bounds override the period.
fn resolve_range(query: &RangeQuery, now: DateTime<Utc>) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
    let to = query.to.unwrap_or(now);
    let from = match query.from {
        Some(from) => from,
        None => match query.period.as_str() {
            "week" => week_start_datetime(now),
            "month" => now - Duration::days(30),
            // Unix epoch
            "all" => DateTime::<Utc>::default(),
            other => {
                return Err(ApiError::BadRequest(format!(
                    "unknown period {:?}, expected week, month or all",
                    other
                )))
            }
        },
    };

    if from > to {
        return Err(ApiError::BadRequest("from must not be after to".to_string()));
    }
    Ok((from, to))
}

/// GET /api/stats/:login
pub async fn individual(
    State(state): State<Arc<AppState>>,
    Path(login): Path<String>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<IndividualResponse>> {
    let (from, to) = resolve_range(&query, Utc::now())?;
    let stats = stats::individual_summary(state.store.as_ref(), &login, from, to).await?;
    Ok(Json(IndividualResponse { login, stats }))
}

/// GET /api/stats?logins=a,b,c
pub async fn group(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GroupQuery>,
) -> ApiResult<Json<GroupResponse>> {
    let logins: Vec<String> = query
        .logins
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if logins.is_empty() {
        return Err(ApiError::BadRequest("logins must not be empty".to_string()));
    }

    let range = RangeQuery {
        from: query.from,
        to: query.to,
        period: query.period,
    };
    let (from, to) = resolve_range(&range, Utc::now())?;
    let stats = stats::group_summary(state.store.as_ref(), &logins, from, to).await?;
    Ok(Json(GroupResponse { stats }))
}
