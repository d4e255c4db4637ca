use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth;
use crate::error::ApiError;
use crate::insights::generate_insights;
use crate::store;
use crate::AppState;

pub async fn insights(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;

    let dataset = store::get_by_id_for_owner(&state.db, file_id, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let api_key = state
        .gemini_api_key
        .as_deref()
        .ok_or_else(|| ApiError::Configuration("Gemini API key not configured".to_string()))?;

    let insights = generate_insights(
        &state.http,
        api_key,
        &dataset.columns.0,
        &dataset.data.0,
        "excel",
    )
    .await
    .map_err(|err| ApiError::Insights(err.to_string()))?;

    tracing::info!(user_id = %ctx.user_id, dataset_id = %dataset.id, "Insights generated");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "fileId": dataset.id,
            "filename": dataset.filename,
            "insights": insights,
        })),
    )
        .into_response())
}
