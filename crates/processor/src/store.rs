//! Storage and source boundaries of the ingestion pipeline

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::models::{Absence, IngestionCursor, LatencySample, RepoRef, WorkItemId};
use common::{Error, Result};
use github::{ClientError, GitHubClient, MergedPr, Timeline};
use sqlx::PgPool;

/// Durable state owned by the ingestion controller
#[async_trait]
pub trait LatencyStore: Send + Sync {
    async fn cursor(&self, repo: &RepoRef) -> Result<Option<IngestionCursor>>;

    /// Upsert the cursor and record it in the cursor history
    async fn save_cursor(&self, cursor: &IngestionCursor) -> Result<()>;

    async fn is_processed(&self, id: &WorkItemId) -> Result<bool>;

    /// Idempotent
    async fn mark_processed(&self, id: &WorkItemId) -> Result<()>;

    /// Insert samples, ignoring ones already stored. Returns rows inserted.
    async fn save_samples(&self, id: &WorkItemId, samples: &[LatencySample]) -> Result<u64>;

    /// Minutes of a reviewer's samples with `review_at` in `[from, to]`
    async fn sample_minutes(
        &self,
        reviewer: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<i64>>;

    async fn reviewers_since(&self, since: DateTime<Utc>) -> Result<Vec<String>>;
}

/// Cached per-person absences
#[async_trait]
pub trait AbsenceStore: Send + Sync {
    /// Absences of a person; empty when nothing is cached
    async fn absences(&self, login: &str) -> Result<Vec<Absence>>;

    async fn replace_absences(&self, login: &str, gaps: &[Absence]) -> Result<()>;
}

/// Everything the service persists
pub trait Store: LatencyStore + AbsenceStore {}

impl<T: LatencyStore + AbsenceStore + ?Sized> Store for T {}

/// Source of merged PRs and their timelines
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Merged PRs after `after` in ascending order, or the most recent
    /// `count` when there is no cursor yet
    async fn merged_pull_requests(
        &self,
        repo: &RepoRef,
        after: Option<&str>,
        count: u32,
    ) -> std::result::Result<Vec<MergedPr>, ClientError>;

    async fn timeline(&self, id: &WorkItemId) -> std::result::Result<Timeline, ClientError>;
}

#[async_trait]
impl ReviewSource for GitHubClient {
    async fn merged_pull_requests(
        &self,
        repo: &RepoRef,
        after: Option<&str>,
        count: u32,
    ) -> std::result::Result<Vec<MergedPr>, ClientError> {
        GitHubClient::merged_pull_requests(self, repo, after, count).await
    }

    async fn timeline(&self, id: &WorkItemId) -> std::result::Result<Timeline, ClientError> {
        GitHubClient::timeline(self, id).await
    }
}

fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LatencyStore for PgStore {
    async fn cursor(&self, repo: &RepoRef) -> Result<Option<IngestionCursor>> {
        db::cursors::get(&self.pool, &repo.owner, &repo.name)
            .await
            .map_err(db_err)
    }

    async fn save_cursor(&self, cursor: &IngestionCursor) -> Result<()> {
        db::cursors::save(&self.pool, cursor).await.map_err(db_err)
    }

    async fn is_processed(&self, id: &WorkItemId) -> Result<bool> {
        db::processed::is_processed(&self.pool, id)
            .await
            .map_err(db_err)
    }

    async fn mark_processed(&self, id: &WorkItemId) -> Result<()> {
        db::processed::mark(&self.pool, id).await.map_err(db_err)
    }

    async fn save_samples(&self, id: &WorkItemId, samples: &[LatencySample]) -> Result<u64> {
        db::samples::insert_many(&self.pool, id, samples)
            .await
            .map_err(db_err)
    }

    async fn sample_minutes(
        &self,
        reviewer: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        db::samples::minutes_for(&self.pool, reviewer, from, to)
            .await
            .map_err(db_err)
    }

    async fn reviewers_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        db::samples::reviewers_since(&self.pool, since)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl AbsenceStore for PgStore {
    async fn absences(&self, login: &str) -> Result<Vec<Absence>> {
        db::gaps::get(&self.pool, login).await.map_err(db_err)
    }

    async fn replace_absences(&self, login: &str, gaps: &[Absence]) -> Result<()> {
        db::gaps::set(&self.pool, login, gaps).await.map_err(db_err)
    }
}
