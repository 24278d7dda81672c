//! Absence cache refresh
//!
//! Pulls upcoming absences of active reviewers from the gap API and replaces
//! each person's cached gaps. The calendar only ever reads the cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use common::models::Absence;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::store::Store;

#[derive(Error, Debug)]
pub enum AbsenceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gap API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Unparseable gap timestamp {0:?}")]
    Timestamp(String),
}

/// Source of per-person absence intervals
#[async_trait]
pub trait AbsenceSource: Send + Sync {
    /// Absences of `login` overlapping `[from, to]`, excluding intervals the
    /// person works through
    async fn absences(
        &self,
        login: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Absence>, AbsenceError>;
}

#[derive(Debug, Deserialize)]
struct GapsResponse {
    #[serde(default)]
    gaps: Vec<GapRecord>,
}

#[derive(Debug, Deserialize)]
struct GapRecord {
    date_from: String,
    date_to: String,
    #[serde(default)]
    work_in_absence: bool,
}

/// Parse a gap timestamp into naive UTC.
///
/// Accepts RFC 3339 with an offset, a naive date-time, or a bare date
/// (midnight).
fn parse_gap_timestamp(raw: &str) -> Result<NaiveDateTime, AbsenceError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc).naive_utc());
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(t);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| AbsenceError::Timestamp(raw.to_string()))
}

fn into_absences(response: GapsResponse) -> Result<Vec<Absence>, AbsenceError> {
    response
        .gaps
        .into_iter()
        .filter(|gap| !gap.work_in_absence)
        .map(|gap| {
            Ok(Absence {
                begin: parse_gap_timestamp(&gap.date_from)?,
                end: parse_gap_timestamp(&gap.date_to)?,
            })
        })
        .collect()
}

/// HTTP client for the gap API
pub struct GapApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GapApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            if let Ok(val) = HeaderValue::from_str(&format!("OAuth {}", token)) {
                headers.insert(AUTHORIZATION, val);
            }
        }
        headers
    }
}

#[async_trait]
impl AbsenceSource for GapApiClient {
    async fn absences(
        &self,
        login: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Absence>, AbsenceError> {
        let url = format!("{}/api/gaps_find/", self.base_url);
        let from = from.to_string();
        let to = to.to_string();
        debug!("GET {} for {} ({} .. {})", url, login, from, to);

        let resp = self
            .client
            .get(&url)
            .headers(self.headers())
            .query(&[
                ("person_login", login),
                ("date_from", from.as_str()),
                ("date_to", to.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AbsenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        into_absences(resp.json().await?)
    }
}

/// Outcome of one refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: u32,
    pub failed: u32,
}

/// Periodic refresh of the absence cache
pub struct AbsenceRefresher {
    source: Arc<dyn AbsenceSource>,
    store: Arc<dyn Store>,
    every: Duration,
    lookahead_days: i64,
    lookback_days: i64,
}

impl AbsenceRefresher {
    pub fn new(
        source: Arc<dyn AbsenceSource>,
        store: Arc<dyn Store>,
        every: Duration,
        lookahead_days: i64,
        lookback_days: i64,
    ) -> Self {
        Self {
            source,
            store,
            every,
            lookahead_days,
            lookback_days,
        }
    }

    /// Start the refresh loop. The first pass runs immediately.
    pub async fn run(self) {
        info!("Starting absence refresher (interval: {:?})", self.every);

        let mut ticker = interval(self.every);
        loop {
            ticker.tick().await;
            match self.refresh_once(Utc::now()).await {
                Ok(report) => info!(
                    "Absence cache refreshed: {} people, {} failed",
                    report.refreshed, report.failed
                ),
                Err(e) => error!("Absence refresh failed: {}", e),
            }
        }
    }

    /// Refresh every reviewer active within the lookback window.
    ///
    /// A person whose request fails keeps their previous cache.
    pub async fn refresh_once(&self, now: DateTime<Utc>) -> common::Result<RefreshReport> {
        let since = now - chrono::Duration::days(self.lookback_days);
        let reviewers = self.store.reviewers_since(since).await?;

        let from = now.date_naive();
        let to = from + chrono::Duration::days(self.lookahead_days);

        let mut report = RefreshReport::default();
        for login in reviewers {
            match self.source.absences(&login, from, to).await {
                Ok(gaps) => {
                    debug!("{} has {} upcoming absences", login, gaps.len());
                    self.store.replace_absences(&login, &gaps).await?;
                    report.refreshed += 1;
                }
                Err(e) => {
                    warn!("Failed to fetch absences for {}: {}", login, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
