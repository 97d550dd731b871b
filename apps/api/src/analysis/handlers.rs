use std::path::Path;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::prompts::{build_narrative_prompt, NARRATIVE_SYSTEM};
use crate::analysis::{analyze_dataset, TrendPoint};
use crate::dataset::{parse_spreadsheet, Row};
use crate::errors::AppError;
use crate::state::AppState;

/// Sentinel narrative when the completion service fails.
/// The analysis itself still succeeds; this is never an HTTP error.
pub const AI_UNAVAILABLE: &str = "AI unavailable.";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub summary: String,
    pub chart: Vec<TrendPoint>,
    pub table: Vec<Row>,
    pub ai_message: String,
    pub locations_used: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
}

/// POST /upload_excel/
///
/// The upload replaces the current dataset only after the bytes parse as a
/// complete spreadsheet, so a failed upload leaves the old table in place.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file_bytes = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::InvalidRequest(format!("malformed multipart body: {e}"))
    })? {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Storage(format!("failed to read uploaded file: {e}")))?;
            file_bytes = Some(bytes);
            break;
        }
    }
    let bytes = file_bytes.ok_or_else(|| AppError::InvalidRequest("no file provided".to_string()))?;

    let dataset = parse_spreadsheet(&bytes)
        .map_err(|e| AppError::InvalidRequest(format!("could not parse spreadsheet: {e}")))?;
    info!(rows = dataset.row_count(), "replacing current dataset");
    state.datasets.replace(dataset);

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
    }))
}

/// POST /analyze/
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(req) =
        payload.map_err(|e| AppError::InvalidRequest(format!("invalid JSON body: {e}")))?;

    let dataset = state
        .datasets
        .load_or_default(Path::new(&state.config.default_data_path))
        .await?;
    let analysis = analyze_dataset(&req.query, &dataset)?;

    let prompt = build_narrative_prompt(&req.query, &analysis);
    let ai_message = match state.narrator.narrate(NARRATIVE_SYSTEM, &prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("narrative call failed, degrading to sentinel: {e}");
            AI_UNAVAILABLE.to_string()
        }
    };

    Ok(Json(AnalyzeResponse {
        summary: summarize(&analysis.locations, analysis.avg_value),
        chart: analysis.trend,
        table: analysis.table,
        ai_message,
        locations_used: analysis.locations,
    }))
}

fn summarize(locations: &[String], avg_value: Option<f64>) -> String {
    match avg_value {
        Some(avg) => format!("Locations: {locations:?}, Avg Value: {avg:.2}"),
        None => format!("Locations: {locations:?}, Avg Value: unavailable"),
    }
}
