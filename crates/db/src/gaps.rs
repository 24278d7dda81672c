//! Cached absence gaps per person

use common::models::Absence;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

/// Get the cached absences of a person; unknown people have none
pub async fn get(pool: &PgPool, login: &str) -> Result<Vec<Absence>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT gaps
        FROM absence_gaps
        WHERE login = $1
        "#,
    )
    .bind(login)
    .fetch_optional(pool)
    .await?;

    Ok(row
        .map(|r| r.get::<Json<Vec<Absence>>, _>("gaps").0)
        .unwrap_or_default())
}

/// Replace the cached absences of a person
pub async fn set(pool: &PgPool, login: &str, gaps: &[Absence]) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO absence_gaps (login, gaps, updated_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (login) DO UPDATE
        SET gaps = EXCLUDED.gaps,
            updated_at = NOW()
        "#,
    )
    .bind(login)
    .bind(Json(gaps))
    .execute(pool)
    .await?;
    Ok(())
}
