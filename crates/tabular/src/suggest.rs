use indexmap::IndexMap;
use serde::Serialize;

use crate::{Cell, ChartType, Row, Table};

/// How many leading rows the suggestion engine samples per column.
pub const SAMPLE_ROWS: usize = 10;
/// Strictly-greater-than share of numeric samples needed to call a column
/// numeric. 7 of 10 is categorical; 8 of 10 is numeric.
pub const NUMERIC_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSuggestion {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(rename = "xAxis")]
    pub x_axis: String,
    #[serde(rename = "yAxis")]
    pub y_axis: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub numeric_columns: Vec<String>,
    pub text_columns: Vec<String>,
    pub suggestions: Vec<ChartSuggestion>,
    pub total_rows: usize,
}

/// Split columns into numeric and categorical buckets by sampling the
/// first `sample` rows. A missing key still counts toward the denominator,
/// so sparse columns lean categorical. Numeric values that only appear
/// after the sample window never influence the verdict.
pub fn classify_columns(table: &Table, sample: usize) -> (Vec<String>, Vec<String>) {
    let mut numeric_columns = Vec::new();
    let mut text_columns = Vec::new();

    for column in &table.columns {
        let sampled = table.rows.len().min(sample);
        let numeric = table
            .rows
            .iter()
            .take(sample)
            .filter(|row| {
                row.get(column)
                    .map(|cell| !cell.to_number().is_nan())
                    .unwrap_or(false)
            })
            .count();

        if numeric as f64 > sampled as f64 * NUMERIC_THRESHOLD {
            numeric_columns.push(column.clone());
        } else {
            text_columns.push(column.clone());
        }
    }

    (numeric_columns, text_columns)
}

/// Column-type map for the insights prompt. Unlike [`classify_columns`],
/// the denominator here is only the values actually present in the sample.
pub fn column_types(
    rows: &[Row],
    columns: &[String],
    sample: usize,
) -> IndexMap<String, &'static str> {
    let mut types = IndexMap::new();
    for column in columns {
        let values: Vec<&Cell> = rows
            .iter()
            .take(sample)
            .filter_map(|row| row.get(column))
            .collect();
        let numeric = values
            .iter()
            .filter(|cell| !cell.to_number().is_nan())
            .count();
        let kind = if numeric as f64 > values.len() as f64 * NUMERIC_THRESHOLD {
            "numeric"
        } else {
            "categorical"
        };
        types.insert(column.clone(), kind);
    }
    types
}

/// Deterministic suggestion rules over the classified buckets. Only the
/// first one or two columns of each bucket ever participate.
pub fn suggest_charts(table: &Table) -> Suggestions {
    let (numeric_columns, text_columns) = classify_columns(table, SAMPLE_ROWS);

    let mut suggestions = Vec::new();

    if numeric_columns.len() >= 2 {
        suggestions.push(ChartSuggestion {
            chart_type: ChartType::Scatter,
            x_axis: numeric_columns[0].clone(),
            y_axis: numeric_columns[1].clone(),
            title: format!("{} vs {}", numeric_columns[1], numeric_columns[0]),
            description: "Good for showing correlation between numeric values".to_string(),
        });
    }

    if !text_columns.is_empty() && !numeric_columns.is_empty() {
        suggestions.push(ChartSuggestion {
            chart_type: ChartType::Bar,
            x_axis: text_columns[0].clone(),
            y_axis: numeric_columns[0].clone(),
            title: format!("{} by {}", numeric_columns[0], text_columns[0]),
            description: "Good for comparing categories".to_string(),
        });
        suggestions.push(ChartSuggestion {
            chart_type: ChartType::Pie,
            x_axis: text_columns[0].clone(),
            y_axis: numeric_columns[0].clone(),
            title: format!("Distribution of {}", numeric_columns[0]),
            description: "Good for showing proportions".to_string(),
        });
    }

    Suggestions {
        numeric_columns,
        text_columns,
        suggestions,
        total_rows: table.rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_column_table(values: Vec<Cell>) -> Table {
        Table {
            columns: vec!["V".to_string()],
            rows: values
                .into_iter()
                .map(|v| {
                    let mut row = Row::new();
                    row.insert("V".to_string(), v);
                    row
                })
                .collect(),
        }
    }

    fn mixed_table() -> Table {
        // "City" categorical, "Pop" and "Area" numeric.
        Table {
            columns: vec!["City".to_string(), "Pop".to_string(), "Area".to_string()],
            rows: (0..12)
                .map(|i| {
                    let mut row = Row::new();
                    row.insert("City".to_string(), Cell::Text(format!("city-{}", i)));
                    row.insert("Pop".to_string(), Cell::Number(i as f64 + 1.0));
                    row.insert("Area".to_string(), Cell::Text(format!("{}.5", i)));
                    row
                })
                .collect(),
        }
    }

    #[test]
    fn seven_of_ten_is_categorical_eight_is_numeric() {
        let seven: Vec<Cell> = (0..10)
            .map(|i| {
                if i < 7 {
                    Cell::Text(i.to_string())
                } else {
                    Cell::Text("n/a".to_string())
                }
            })
            .collect();
        let (numeric, text) = classify_columns(&one_column_table(seven), SAMPLE_ROWS);
        assert!(numeric.is_empty());
        assert_eq!(text, vec!["V"]);

        let eight: Vec<Cell> = (0..10)
            .map(|i| {
                if i < 8 {
                    Cell::Text(i.to_string())
                } else {
                    Cell::Text("n/a".to_string())
                }
            })
            .collect();
        let (numeric, text) = classify_columns(&one_column_table(eight), SAMPLE_ROWS);
        assert_eq!(numeric, vec!["V"]);
        assert!(text.is_empty());
    }

    #[test]
    fn classification_only_sees_the_sample_window() {
        // Numeric everywhere except the sampled prefix: still categorical.
        let values: Vec<Cell> = (0..30)
            .map(|i| {
                if i < 10 {
                    Cell::Text("word".to_string())
                } else {
                    Cell::Number(i as f64)
                }
            })
            .collect();
        let (numeric, text) = classify_columns(&one_column_table(values), SAMPLE_ROWS);
        assert!(numeric.is_empty());
        assert_eq!(text, vec!["V"]);
    }

    #[test]
    fn short_tables_use_the_row_count_as_denominator() {
        let values = vec![Cell::Number(1.0), Cell::Number(2.0), Cell::Text("x".to_string())];
        // 2 of 3 numeric: 2 > 2.1 is false, categorical.
        let (numeric, _) = classify_columns(&one_column_table(values), SAMPLE_ROWS);
        assert!(numeric.is_empty());

        let values = vec![Cell::Number(1.0), Cell::Number(2.0)];
        let (numeric, _) = classify_columns(&one_column_table(values), SAMPLE_ROWS);
        assert_eq!(numeric, vec!["V"]);
    }

    #[test]
    fn two_numeric_columns_suggest_a_scatter() {
        let s = suggest_charts(&mixed_table());
        assert_eq!(s.numeric_columns, vec!["Pop", "Area"]);
        assert_eq!(s.text_columns, vec!["City"]);
        assert_eq!(s.total_rows, 12);

        assert_eq!(s.suggestions.len(), 3);
        let scatter = &s.suggestions[0];
        assert_eq!(scatter.chart_type, ChartType::Scatter);
        assert_eq!(scatter.x_axis, "Pop");
        assert_eq!(scatter.y_axis, "Area");
        assert_eq!(scatter.title, "Area vs Pop");

        let bar = &s.suggestions[1];
        assert_eq!(bar.chart_type, ChartType::Bar);
        assert_eq!(bar.x_axis, "City");
        assert_eq!(bar.y_axis, "Pop");
        assert_eq!(bar.title, "Pop by City");

        let pie = &s.suggestions[2];
        assert_eq!(pie.chart_type, ChartType::Pie);
        assert_eq!(pie.title, "Distribution of Pop");
    }

    #[test]
    fn single_numeric_column_alone_yields_nothing() {
        let values: Vec<Cell> = (0..5).map(|i| Cell::Number(i as f64 + 1.0)).collect();
        let s = suggest_charts(&one_column_table(values));
        assert!(s.suggestions.is_empty());
    }

    #[test]
    fn insights_map_skips_missing_values_in_denominator() {
        // Column present in only 2 of 5 rows, both numeric: numeric.
        let mut rows: Vec<Row> = Vec::new();
        for i in 0..5 {
            let mut row = Row::new();
            row.insert("A".to_string(), Cell::Text(format!("a{}", i)));
            if i < 2 {
                row.insert("B".to_string(), Cell::Number(i as f64));
            }
            rows.push(row);
        }
        let columns = vec!["A".to_string(), "B".to_string()];
        let types = column_types(&rows, &columns, 25);
        assert_eq!(types["A"], "categorical");
        assert_eq!(types["B"], "numeric");
    }
}
