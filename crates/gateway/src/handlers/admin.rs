use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{self, Role};
use crate::error::ApiError;
use crate::models::User;
use crate::store;
use crate::AppState;

pub async fn get_all_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;
    auth::authorize(&ctx, Role::Admin)?;

    let users: Vec<User> = sqlx::query_as(
        "SELECT id, username, email, password_hash, role, created_at FROM users ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok((StatusCode::OK, Json(users)).into_response())
}

/// Remove a user and everything they own. The two deletes are sequential
/// and not transactional: if the user delete fails after the dataset
/// delete succeeded, the datasets stay gone.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;
    auth::authorize(&ctx, Role::Admin)?;

    let removed_datasets = store::delete_all_by_owner(&state.db, id).await?;

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(
        admin_id = %ctx.user_id,
        user_id = %id,
        datasets = removed_datasets,
        "User removed with dataset cascade"
    );

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "User deleted successfully" })),
    )
        .into_response())
}

pub async fn user_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;
    auth::authorize(&ctx, Role::Admin)?;

    let total_users = store::count_non_admin_users(&state.db).await?;
    let total_files = store::count_datasets(&state.db).await?;
    let user_stats = store::user_stats(&state.db).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "totalUsers": total_users,
            "totalFiles": total_files,
            "userStats": user_stats,
        })),
    )
        .into_response())
}
