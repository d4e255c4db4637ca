// Storage round-trip and projection over the public tabular API:
// a table encoded the way the gateway persists it (JSON) must come back
// identical and still chart correctly.

use tabulens_tabular::{
    build_chart, export_csv, suggest_charts, Cell, ChartType, Row, Table,
};

fn sales_table() -> Table {
    let columns = vec!["Region".to_string(), "Revenue".to_string()];
    let rows: Vec<Row> = [("North", "120"), ("South", "95"), ("East", "110")]
        .into_iter()
        .map(|(region, revenue)| {
            let mut row = Row::new();
            row.insert("Region".to_string(), Cell::Text(region.to_string()));
            row.insert("Revenue".to_string(), Cell::Text(revenue.to_string()));
            row
        })
        .collect();
    Table { columns, rows }
}

#[test]
fn json_round_trip_preserves_columns_and_row_order() {
    let table = sales_table();

    let encoded = serde_json::to_value(&table).expect("encode table");
    let decoded: Table = serde_json::from_value(encoded).expect("decode table");

    assert_eq!(decoded.columns, table.columns);
    assert_eq!(decoded.rows, table.rows);
    // Key order inside each row survives the trip.
    let keys: Vec<&String> = decoded.rows[0].keys().collect();
    assert_eq!(keys, ["Region", "Revenue"]);
}

#[test]
fn decoded_table_still_projects_charts() {
    let encoded = serde_json::to_value(sales_table()).expect("encode table");
    let table: Table = serde_json::from_value(encoded).expect("decode table");

    let chart = build_chart(&table, "Region", "Revenue", ChartType::Bar, None)
        .expect("chart should build");
    assert_eq!(chart.point_count, 3);
    assert_eq!(chart.points[0].y, 120.0);

    let csv = export_csv(&table, "Region", "Revenue");
    assert_eq!(csv, "Region,Revenue\nNorth,120\nSouth,95\nEast,110");
}

#[test]
fn suggestions_survive_the_round_trip() {
    let encoded = serde_json::to_value(sales_table()).expect("encode table");
    let table: Table = serde_json::from_value(encoded).expect("decode table");

    let s = suggest_charts(&table);
    assert_eq!(s.numeric_columns, vec!["Revenue"]);
    assert_eq!(s.text_columns, vec!["Region"]);
    // One categorical + one numeric column: bar and pie, no scatter.
    assert_eq!(s.suggestions.len(), 2);
    assert_eq!(s.suggestions[0].chart_type, ChartType::Bar);
    assert_eq!(s.suggestions[1].chart_type, ChartType::Pie);
}
