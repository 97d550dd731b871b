//! Location detection — which `final location` values a free-text query
//! mentions. Deliberately plain substring containment, isolated here so a
//! token-based matcher can replace it without touching the analyzer.

use serde_json::Value;

use crate::dataset::Dataset;

/// Distinct non-null location values in first-occurrence order.
/// Distinctness is exact (case-sensitive), matching how the values will be
/// echoed back to the client.
pub fn distinct_locations(dataset: &Dataset, column: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for row in &dataset.rows {
        if let Some(loc) = row.get(column).and_then(Value::as_str) {
            if seen.insert(loc.to_string()) {
                out.push(loc.to_string());
            }
        }
    }
    out
}

/// Locations whose lowercased form appears as a substring of the lowercased
/// query. No ranking; result keeps the input's order.
pub fn match_locations(query: &str, locations: &[String]) -> Vec<String> {
    let query = query.to_lowercase();
    locations
        .iter()
        .filter(|loc| query.contains(&loc.to_lowercase()))
        .cloned()
        .collect()
}
