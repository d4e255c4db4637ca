//! Pure spreadsheet ingestion and chart projection for the tabulens gateway.
//!
//! Everything in this crate operates on in-memory byte buffers and row maps;
//! no I/O, no async. The gateway feeds it upload buffers and stored datasets.

use thiserror::Error;

pub mod cell;
pub mod chart;
pub mod parse;
pub mod suggest;

pub use cell::{parse_number_prefix, Cell};
pub use chart::{
    build_chart, export_csv, export_rows, Chart, ChartPoint, ChartType, ExportFormat,
};
pub use parse::{parse_workbook, Table};
pub use suggest::{classify_columns, column_types, suggest_charts, ChartSuggestion, Suggestions};

/// An ordered row: column name -> cell, in first-encounter column order.
pub type Row = indexmap::IndexMap<String, Cell>;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unreadable workbook: {0}")]
    Unreadable(String),
    #[error("sheet has no data rows")]
    EmptySheet,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("Invalid chart type.")]
    InvalidChartType(String),
    #[error("No data available to generate chart.")]
    EmptyDataset,
    #[error("Invalid xAxis or yAxis column.")]
    InvalidAxis,
}
