use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use tabulens_tabular::{
    build_chart, export_csv, export_rows, suggest_charts, Chart, ChartType, ExportFormat, Table,
};

use crate::auth;
use crate::error::ApiError;
use crate::models::{ChartDataRequest, Dataset, ExportQuery};
use crate::store;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartResponse {
    file_id: Uuid,
    filename: String,
    #[serde(flatten)]
    chart: Chart,
}

fn into_table(dataset: Dataset) -> (Uuid, String, Table) {
    (
        dataset.id,
        dataset.filename,
        Table {
            columns: dataset.columns.0,
            rows: dataset.data.0,
        },
    )
}

pub async fn chart_data(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<ChartDataRequest>,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;

    // Chart type is checked before anything is read from the store.
    let chart_type: ChartType = payload.chart_type.parse()?;

    let dataset = store::get_by_id_for_owner(&state.db, file_id, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let (id, filename, table) = into_table(dataset);
    let chart = build_chart(
        &table,
        &payload.x_axis,
        &payload.y_axis,
        chart_type,
        payload.title.as_deref(),
    )?;

    tracing::info!(
        user_id = %ctx.user_id,
        dataset_id = %id,
        points = chart.point_count,
        "Chart generated"
    );

    Ok((
        StatusCode::OK,
        Json(ChartResponse {
            file_id: id,
            filename,
            chart,
        }),
    )
        .into_response())
}

pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;

    let dataset = store::get_by_id_for_owner(&state.db, file_id, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let (_, _, table) = into_table(dataset);
    Ok((StatusCode::OK, Json(suggest_charts(&table))).into_response())
}

pub async fn export(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;

    let dataset = store::get_by_id_for_owner(&state.db, file_id, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let (_, _, table) = into_table(dataset);

    match ExportFormat::from_query(query.format.as_deref()) {
        ExportFormat::Csv => {
            let csv = export_csv(&table, &query.x_axis, &query.y_axis);
            let headers = [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"chart-data.csv\"",
                ),
            ];
            Ok((StatusCode::OK, headers, csv).into_response())
        }
        ExportFormat::Json => {
            let rows = export_rows(&table, &query.x_axis, &query.y_axis);
            Ok((StatusCode::OK, Json(rows)).into_response())
        }
    }
}
