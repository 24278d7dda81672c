//! Ingestion cursor queries

use common::models::IngestionCursor;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Get the persisted cursor for a repository
pub async fn get(
    pool: &PgPool,
    owner: &str,
    repo: &str,
) -> Result<Option<IngestionCursor>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT owner, repo, cursor, number, merged_at
        FROM cursors
        WHERE owner = $1 AND repo = $2
        "#,
    )
    .bind(owner)
    .bind(repo)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| IngestionCursor {
        owner: r.get("owner"),
        repo: r.get("repo"),
        cursor: r.get("cursor"),
        number: r.get("number"),
        merged_at: r.get("merged_at"),
    }))
}

/// Move the repository cursor and append it to the history.
///
/// Both writes share one transaction; a repeated history row is ignored.
pub async fn save(pool: &PgPool, cursor: &IngestionCursor) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO cursors (owner, repo, cursor, number, merged_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (owner, repo) DO UPDATE
        SET cursor = EXCLUDED.cursor,
            number = EXCLUDED.number,
            merged_at = EXCLUDED.merged_at,
            updated_at = NOW()
        "#,
    )
    .bind(&cursor.owner)
    .bind(&cursor.repo)
    .bind(&cursor.cursor)
    .bind(cursor.number)
    .bind(cursor.merged_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO cursor_history (id, owner, repo, number, cursor, merged_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&cursor.owner)
    .bind(&cursor.repo)
    .bind(cursor.number)
    .bind(&cursor.cursor)
    .bind(cursor.merged_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}
