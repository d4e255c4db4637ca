use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use tabulens_tabular::Row;

use crate::auth::Role;

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub columns: Json<Vec<String>>,
    pub data: Json<Vec<Row>>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub file_count: i64,
}

// ── API Payloads ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartDataRequest {
    pub title: Option<String>,
    #[serde(default, rename = "xAxis")]
    pub x_axis: String,
    #[serde(default, rename = "yAxis")]
    pub y_axis: String,
    #[serde(default, rename = "chartType")]
    pub chart_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default, rename = "xAxis")]
    pub x_axis: String,
    #[serde(default, rename = "yAxis")]
    pub y_axis: String,
    pub format: Option<String>,
}
