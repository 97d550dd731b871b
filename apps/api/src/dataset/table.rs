use serde_json::{Map, Value};

/// One spreadsheet row, keyed by normalized column name.
/// `serde_json::Map` keeps insertion order, so rows serialize with columns
/// in their original spreadsheet order.
pub type Row = Map<String, Value>;

/// The in-memory table parsed from the current spreadsheet.
///
/// Column names are normalized (trimmed, lowercased) at parse time, so
/// lookups against the expected column constants never need to re-normalize.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
