use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use tabulens_tabular::parse_workbook;

use crate::auth::{self, Role};
use crate::error::ApiError;
use crate::store;
use crate::AppState;

/// Upload cap, matching the deployed clients.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

fn has_spreadsheet_extension(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    lower.ends_with(".xls") || lower.ends_with(".xlsx")
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;
    auth::authorize(&ctx, Role::User)?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("Malformed upload: {}", err)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation("Uploaded file has no name".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::Validation(format!("Malformed upload: {}", err)))?;
        upload = Some((filename, data.to_vec()));
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::Validation("No file uploaded".to_string()))?;

    if !has_spreadsheet_extension(&filename) {
        return Err(ApiError::Validation(
            "Only Excel files are allowed".to_string(),
        ));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::Validation(
            "File exceeds the 5MB upload limit".to_string(),
        ));
    }

    tracing::info!(
        user_id = %ctx.user_id,
        filename = %filename,
        bytes = data.len(),
        "Processing spreadsheet upload"
    );

    // Workbook decode is CPU-bound; keep it off the async workers.
    let table = task::spawn_blocking(move || parse_workbook(&data))
        .await
        .map_err(|_| ApiError::Internal("parser worker failed".to_string()))??;

    let dataset_id =
        store::create_dataset(&state.db, ctx.user_id, &filename, &table.columns, &table.rows)
            .await?;

    tracing::info!(
        user_id = %ctx.user_id,
        dataset_id = %dataset_id,
        rows = table.rows.len(),
        "Spreadsheet stored"
    );

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "File uploaded",
            "columns": table.columns,
            "fileId": dataset_id,
        })),
    )
        .into_response())
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;
    auth::authorize(&ctx, Role::User)?;

    let summaries = store::list_by_owner(&state.db, ctx.user_id).await?;
    Ok((StatusCode::OK, Json(summaries)).into_response())
}

pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;
    auth::authorize(&ctx, Role::User)?;

    let dataset = store::get_by_id_for_owner(&state.db, id, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    Ok((StatusCode::OK, Json(dataset)).into_response())
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;
    auth::authorize(&ctx, Role::User)?;

    let deleted = store::delete_by_id_for_owner(&state.db, id, ctx.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("File not found".to_string()));
    }

    tracing::info!(user_id = %ctx.user_id, dataset_id = %id, "Dataset deleted");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "File deleted successfully" })),
    )
        .into_response())
}
