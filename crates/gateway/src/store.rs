//! Dataset persistence. Owner-scoped by construction: every read and
//! delete filters on `owner_id`, so a foreign id and a missing id are
//! indistinguishable to callers.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use tabulens_tabular::Row;

use crate::models::{Dataset, DatasetSummary, UserStatsRow};

pub async fn create_dataset(
    pool: &PgPool,
    owner_id: Uuid,
    filename: &str,
    columns: &[String],
    rows: &[Row],
) -> Result<Uuid, sqlx::Error> {
    let inserted: (Uuid,) = sqlx::query_as(
        "INSERT INTO datasets (owner_id, filename, columns, data) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(owner_id)
    .bind(filename)
    .bind(Json(columns))
    .bind(Json(rows))
    .fetch_one(pool)
    .await?;

    Ok(inserted.0)
}

pub async fn list_by_owner(
    pool: &PgPool,
    owner_id: Uuid,
) -> Result<Vec<DatasetSummary>, sqlx::Error> {
    sqlx::query_as::<_, DatasetSummary>(
        "SELECT id, filename, uploaded_at FROM datasets WHERE owner_id = $1 ORDER BY uploaded_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn get_by_id_for_owner(
    pool: &PgPool,
    dataset_id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Dataset>, sqlx::Error> {
    sqlx::query_as::<_, Dataset>(
        "SELECT id, owner_id, filename, columns, data, uploaded_at FROM datasets WHERE id = $1 AND owner_id = $2",
    )
    .bind(dataset_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_by_id_for_owner(
    pool: &PgPool,
    dataset_id: Uuid,
    owner_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM datasets WHERE id = $1 AND owner_id = $2")
        .bind(dataset_id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// First half of the user-removal cascade. Not transactional with the
/// user delete that follows; a failure in between leaves orphan-free
/// datasets gone but the user present, which callers accept.
pub async fn delete_all_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM datasets WHERE owner_id = $1")
        .bind(owner_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn count_datasets(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
        .fetch_one(pool)
        .await
}

pub async fn count_non_admin_users(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role <> 'admin'")
        .fetch_one(pool)
        .await
}

pub async fn user_stats(pool: &PgPool) -> Result<Vec<UserStatsRow>, sqlx::Error> {
    sqlx::query_as::<_, UserStatsRow>(
        r#"
        SELECT u.id, u.username, u.email, u.role, u.created_at,
               COUNT(d.id) AS file_count
        FROM users u
        LEFT JOIN datasets d ON d.owner_id = u.id
        GROUP BY u.id, u.username, u.email, u.role, u.created_at
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}
