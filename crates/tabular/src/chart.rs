use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Cell, ChartError, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Area,
    Column,
    #[serde(rename = "3d-bar")]
    ThreeDBar,
    #[serde(rename = "3d-pie")]
    ThreeDPie,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Area => "area",
            ChartType::Column => "column",
            ChartType::ThreeDBar => "3d-bar",
            ChartType::ThreeDPie => "3d-pie",
        }
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "pie" => Ok(ChartType::Pie),
            "scatter" => Ok(ChartType::Scatter),
            "area" => Ok(ChartType::Area),
            "column" => Ok(ChartType::Column),
            "3d-bar" => Ok(ChartType::ThreeDBar),
            "3d-pie" => Ok(ChartType::ThreeDPie),
            other => Err(ChartError::InvalidChartType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: Cell,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub chart_type: ChartType,
    #[serde(rename = "data")]
    pub points: Vec<ChartPoint>,
    #[serde(rename = "dataPoints")]
    pub point_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Project a stored table into render-ready points.
///
/// A point survives only when its x cell is truthy and its y cell coerces
/// to a number. The truthiness check means a numeric x of exactly 0 is
/// dropped; existing clients depend on that quirk.
pub fn build_chart(
    table: &Table,
    x_axis: &str,
    y_axis: &str,
    chart_type: ChartType,
    title: Option<&str>,
) -> Result<Chart, ChartError> {
    if table.rows.is_empty() {
        return Err(ChartError::EmptyDataset);
    }
    if !table.columns.iter().any(|c| c == x_axis) || !table.columns.iter().any(|c| c == y_axis) {
        return Err(ChartError::InvalidAxis);
    }

    let points = project_points(table, x_axis, y_axis);

    Ok(Chart {
        title: title
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{} vs {}", y_axis, x_axis)),
        x_axis: x_axis.to_string(),
        y_axis: y_axis.to_string(),
        chart_type,
        point_count: points.len(),
        points,
        generated_at: Utc::now(),
    })
}

fn project_points(table: &Table, x_axis: &str, y_axis: &str) -> Vec<ChartPoint> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let x = row.get(x_axis).cloned().unwrap_or_else(Cell::empty);
            let y = row.get(y_axis).map(Cell::to_number).unwrap_or(f64::NAN);
            (x.is_truthy() && !y.is_nan()).then_some(ChartPoint { x, y })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// The export endpoint treats anything that isn't "csv" as JSON.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

/// Export rows keyed by the original column names instead of x/y.
/// Same survival rule as [`build_chart`]; no axis validation, unknown
/// columns simply project nothing.
pub fn export_rows(table: &Table, x_axis: &str, y_axis: &str) -> Vec<IndexMap<String, Value>> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let x = row.get(x_axis).cloned().unwrap_or_else(Cell::empty);
            let y = row.get(y_axis).map(Cell::to_number).unwrap_or(f64::NAN);
            if !x.is_truthy() || y.is_nan() {
                return None;
            }
            let mut out = IndexMap::new();
            out.insert(x_axis.to_string(), Value::from(&x));
            out.insert(
                y_axis.to_string(),
                serde_json::Number::from_f64(y)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            );
            Some(out)
        })
        .collect()
}

/// CSV rendition of the export: a header line then one line per point.
/// Cell values are written raw; embedded commas and quotes are NOT
/// escaped, matching the behavior existing consumers rely on.
pub fn export_csv(table: &Table, x_axis: &str, y_axis: &str) -> String {
    let mut lines = vec![format!("{},{}", x_axis, y_axis)];
    for row in &table.rows {
        let x = row.get(x_axis).cloned().unwrap_or_else(Cell::empty);
        let y = row.get(y_axis).map(Cell::to_number).unwrap_or(f64::NAN);
        if x.is_truthy() && !y.is_nan() {
            lines.push(format!("{},{}", x, y));
        }
    }
    lines.join("\n")
}
