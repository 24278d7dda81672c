//! Processed pull request markers

use common::models::WorkItemId;
use sqlx::{PgPool, Row};

/// Check whether a PR has already been reduced to latency samples
pub async fn is_processed(pool: &PgPool, id: &WorkItemId) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM processed_prs
            WHERE owner = $1 AND repo = $2 AND number = $3
        ) as processed
        "#,
    )
    .bind(&id.owner)
    .bind(&id.repo)
    .bind(id.number)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<bool, _>("processed"))
}

/// Mark a PR as processed (no-op if already marked)
pub async fn mark(pool: &PgPool, id: &WorkItemId) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO processed_prs (owner, repo, number, processed_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(&id.owner)
    .bind(&id.repo)
    .bind(id.number)
    .execute(pool)
    .await?;
    Ok(())
}
