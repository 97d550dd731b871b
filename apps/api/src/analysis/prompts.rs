//! Prompt assembly for the narrative call.

use crate::analysis::{Analysis, TrendPoint};
use crate::dataset::Row;

/// Fixed system role for every narrative call.
pub const NARRATIVE_SYSTEM: &str = "You are a real estate analysis expert.";

/// Builds the user prompt: raw query, detected locations, sample rows, and
/// the trend series, with instructions bounded to eight sentences.
pub fn build_narrative_prompt(query: &str, analysis: &Analysis) -> String {
    format!(
        "User query: {query}\n\
         Locations detected: {locations}\n\
         Trend data (year, mean sales): {trend}\n\
         Sample rows: {rows}\n\n\
         Analyze the real estate trends in this data. Compare the locations, \
         explain the growth pattern, and predict future market performance. \
         Give concrete insights in at most eight sentences.",
        locations = analysis.locations.join(", "),
        trend = render_trend(&analysis.trend),
        rows = render_rows(&analysis.table),
    )
}

fn render_trend(trend: &[TrendPoint]) -> String {
    serde_json::to_string(trend).unwrap_or_default()
}

fn render_rows(rows: &[Row]) -> String {
    serde_json::to_string(rows).unwrap_or_default()
}
