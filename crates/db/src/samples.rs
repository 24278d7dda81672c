//! Latency sample queries

use chrono::{DateTime, Utc};
use common::models::{LatencySample, WorkItemId};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Insert the samples of one PR, skipping rows that already exist
pub async fn insert_many(
    pool: &PgPool,
    id: &WorkItemId,
    samples: &[LatencySample],
) -> Result<u64, sqlx::Error> {
    if samples.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = samples.iter().map(|_| Uuid::new_v4()).collect();
    let reviewers: Vec<String> = samples.iter().map(|s| s.reviewer.clone()).collect();
    let minutes: Vec<i64> = samples.iter().map(|s| s.minutes).collect();
    let review_ats: Vec<DateTime<Utc>> = samples.iter().map(|s| s.review_at).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO latency_samples (id, owner, repo, number, reviewer, minutes, review_at)
        SELECT t.id, $2, $3, $4, t.reviewer, t.minutes, t.review_at
        FROM UNNEST($1::uuid[], $5::text[], $6::bigint[], $7::timestamptz[])
            AS t(id, reviewer, minutes, review_at)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(&ids)
    .bind(&id.owner)
    .bind(&id.repo)
    .bind(id.number)
    .bind(&reviewers)
    .bind(&minutes)
    .bind(&review_ats)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Minutes of every sample for a reviewer with `review_at` in `[from, to]`
pub async fn minutes_for(
    pool: &PgPool,
    reviewer: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<i64>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT minutes
        FROM latency_samples
        WHERE reviewer = $1 AND review_at BETWEEN $2 AND $3
        ORDER BY review_at ASC
        "#,
    )
    .bind(reviewer)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.get("minutes")).collect())
}

/// Reviewers with at least one sample since the given time
pub async fn reviewers_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT reviewer
        FROM latency_samples
        WHERE review_at >= $1
        ORDER BY reviewer
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.get("reviewer")).collect())
}
