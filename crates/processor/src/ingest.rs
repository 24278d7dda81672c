//! Cursor-driven ingestion of merged pull requests
//!
//! One tick per repository: bootstrap a cursor if there is none, fetch the
//! next page of merged PRs after it, turn every unprocessed PR into latency
//! samples and move the cursor forward. Samples and processed markers are
//! written with no-op-on-conflict semantics, so a tick abandoned halfway can
//! be replayed safely.

use std::sync::Arc;

use common::models::{IngestionCursor, RepoRef, WorkItem};
use common::LatencyPolicy;
use github::{ClientError, MergedPr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::calendar::Calendar;
use crate::events::review_events;
use crate::intervals::reconstruct;
use crate::store::{ReviewSource, Store};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("GitHub API error: {0}")]
    GitHub(ClientError),
    #[error("Store error: {0}")]
    Store(#[from] common::Error),
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl From<ClientError> for IngestError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::RateLimited { retry_after } => Self::RateLimited(retry_after),
            other => Self::GitHub(other),
        }
    }
}

/// Outcome of one repository tick
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickReport {
    pub repo: String,
    /// A cursor was created during this tick
    pub bootstrapped: bool,
    pub fetched: u32,
    /// Already marked processed, skipped
    pub skipped: u32,
    pub processed: u32,
    pub samples: u64,
    /// Cursor after the tick, if any
    pub cursor: Option<String>,
    pub error: Option<String>,
}

impl TickReport {
    fn new(repo: &RepoRef) -> Self {
        Self {
            repo: repo.to_string(),
            ..Default::default()
        }
    }
}

fn cursor_for(repo: &RepoRef, pr: &MergedPr) -> IngestionCursor {
    IngestionCursor {
        owner: repo.owner.clone(),
        repo: repo.name.clone(),
        cursor: pr.cursor.clone(),
        number: pr.item.id.number,
        merged_at: pr.item.merged_at,
    }
}

/// Drives ingestion for a set of repositories.
///
/// Ticks are serialized: a manual trigger waits for a scheduled tick in
/// progress and vice versa.
pub struct Ingestor {
    source: Arc<dyn ReviewSource>,
    store: Arc<dyn Store>,
    calendar: Calendar,
    policy: LatencyPolicy,
    running: Mutex<()>,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        store: Arc<dyn Store>,
        calendar: Calendar,
        policy: LatencyPolicy,
    ) -> Self {
        Self {
            source,
            store,
            calendar,
            policy,
            running: Mutex::new(()),
        }
    }

    /// Run one tick over `repos` in order.
    ///
    /// A failing repository is logged and reported; the remaining ones still
    /// run. A rate limit stops the tick early and is returned so the caller
    /// can pause.
    pub async fn tick(&self, repos: &[RepoRef]) -> (Vec<TickReport>, Option<u64>) {
        let _running = self.running.lock().await;
        let mut reports = Vec::with_capacity(repos.len());

        for repo in repos {
            match self.ingest_repo(repo).await {
                Ok(report) => {
                    info!(
                        "Ingested {}: {} fetched, {} processed, {} skipped, {} samples",
                        repo, report.fetched, report.processed, report.skipped, report.samples
                    );
                    reports.push(report);
                }
                Err(IngestError::RateLimited(retry_after)) => {
                    warn!(
                        "Rate limited while ingesting {}. Retry after {} seconds",
                        repo, retry_after
                    );
                    let mut report = TickReport::new(repo);
                    report.error = Some(IngestError::RateLimited(retry_after).to_string());
                    reports.push(report);
                    return (reports, Some(retry_after));
                }
                Err(e) => {
                    error!("Failed to ingest {}: {}", repo, e);
                    let mut report = TickReport::new(repo);
                    report.error = Some(e.to_string());
                    reports.push(report);
                }
            }
        }

        (reports, None)
    }

    /// One tick for a single repository
    pub async fn tick_repo(&self, repo: &RepoRef) -> Result<TickReport, IngestError> {
        let _running = self.running.lock().await;
        self.ingest_repo(repo).await
    }

    async fn ingest_repo(&self, repo: &RepoRef) -> Result<TickReport, IngestError> {
        let mut report = TickReport::new(repo);

        let cursor = match self.store.cursor(repo).await? {
            Some(cursor) => cursor,
            None => match self.bootstrap(repo).await? {
                Some(cursor) => {
                    report.bootstrapped = true;
                    cursor
                }
                None => {
                    info!("No merged PRs in {}, skipping", repo);
                    return Ok(report);
                }
            },
        };

        let page = self
            .source
            .merged_pull_requests(repo, Some(&cursor.cursor), self.policy.page_size)
            .await?;
        report.fetched = page.len() as u32;

        let Some(last) = page.last() else {
            debug!("No new merged PRs in {}", repo);
            report.cursor = Some(cursor.cursor);
            return Ok(report);
        };
        let next = cursor_for(repo, last);

        for pr in &page {
            if self.store.is_processed(&pr.item.id).await? {
                debug!("{} already processed, skip", pr.item.id);
                report.skipped += 1;
                continue;
            }
            report.samples += self.process(&pr.item).await?;
            report.processed += 1;
        }

        self.store.save_cursor(&next).await?;
        debug!("Cursor for {} moved to #{}", repo, next.number);
        report.cursor = Some(next.cursor);

        Ok(report)
    }

    /// Point a fresh cursor at the oldest of the most recent merged PRs
    async fn bootstrap(&self, repo: &RepoRef) -> Result<Option<IngestionCursor>, IngestError> {
        warn!("No cursor for {}, bootstrapping from recent merged PRs", repo);

        let recent = self
            .source
            .merged_pull_requests(repo, None, self.policy.bootstrap_count)
            .await?;
        let Some(oldest) = recent.first() else {
            return Ok(None);
        };

        let cursor = cursor_for(repo, oldest);
        self.store.save_cursor(&cursor).await?;
        info!("Bootstrapped cursor for {} at #{}", repo, cursor.number);
        Ok(Some(cursor))
    }

    /// Extract and persist the samples of one PR, then mark it processed
    async fn process(&self, item: &WorkItem) -> Result<u64, IngestError> {
        debug!("Processing {} ({})", item.title, item.id.url());

        let timeline = self.source.timeline(&item.id).await?;
        let author = timeline.author.as_deref().unwrap_or(&item.author);

        let events = review_events(&timeline.events, author, self.policy.request_attribution);
        let samples = reconstruct(&self.calendar, &self.policy, &item.id, &events);

        let inserted = self.store.save_samples(&item.id, &samples).await?;
        self.store.mark_processed(&item.id).await?;

        debug!(
            "{} processed: {} samples ({} new)",
            item.id,
            samples.len(),
            inserted
        );
        Ok(inserted)
    }
}
