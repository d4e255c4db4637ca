//! Adapter for the external text-generation service. The dataset sample
//! and column-type map are folded into a prompt; the reply is parsed as
//! JSON when possible and wrapped as `{"raw": ...}` when not.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use tabulens_tabular::{column_types, Row};

const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// How many leading rows are handed to the model. Not the same window as
/// the chart suggestion engine (10); the two have always differed.
pub const INSIGHTS_SAMPLE_ROWS: usize = 25;

#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Failed to generate AI insights: {0}")]
    Upstream(String),
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

pub async fn generate_insights(
    client: &Client,
    api_key: &str,
    columns: &[String],
    rows: &[Row],
    data_kind: &str,
) -> Result<Value, InsightsError> {
    let sample: Vec<&Row> = rows.iter().take(INSIGHTS_SAMPLE_ROWS).collect();
    let prompt = build_prompt(columns, rows, &sample, data_kind);

    let body = json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    });

    let response = client
        .post(format!("{}?key={}", GEMINI_API_URL, api_key))
        .json(&body)
        .send()
        .await
        .map_err(|err| InsightsError::Upstream(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(InsightsError::Upstream(format!(
            "text-generation service returned {}",
            status
        )));
    }

    let parsed: GenerateContentResponse = response
        .json()
        .await
        .map_err(|err| InsightsError::Upstream(err.to_string()))?;

    let text = parsed
        .candidates
        .first()
        .and_then(|c| c.content.parts.first())
        .map(|p| p.text.clone())
        .ok_or_else(|| InsightsError::Upstream("empty response from service".to_string()))?;

    Ok(parse_insights_text(&text))
}

fn build_prompt(columns: &[String], rows: &[Row], sample: &[&Row], data_kind: &str) -> String {
    let types = column_types(rows, columns, INSIGHTS_SAMPLE_ROWS);
    let types_json = serde_json::to_string(&types).unwrap_or_else(|_| "{}".to_string());
    let sample_json = serde_json::to_string_pretty(sample).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a data analysis expert. Analyze this {} data and provide insights:\n\
         Column Information: {}\n\
         Data Sample: {}\n\
         Please provide:\n\
         1. A brief summary of what the data represents\n\
         2. Key observations and patterns in the data\n\
         3. Potential correlations between variables\n\
         4. Recommended visualizations for this data\n\
         5. Business insights that might be valuable\n\n\
         Format your response as JSON with these sections.",
        data_kind, types_json, sample_json
    )
}

/// Interpret the model's reply: strip a ```json fence when present, try a
/// JSON parse, fall back to wrapping the raw text.
pub fn parse_insights_text(text: &str) -> Value {
    let mut candidate = text.trim();
    if candidate.contains("```json") {
        if let Some(inner) = candidate
            .split("```json")
            .nth(1)
            .and_then(|rest| rest.split("```").next())
        {
            candidate = inner.trim();
        }
    }
    serde_json::from_str(candidate).unwrap_or_else(|_| json!({ "raw": candidate }))
}
