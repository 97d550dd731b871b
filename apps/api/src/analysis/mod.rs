//! Query analysis — turns a free-text query plus the current dataset into
//! detected locations, summary statistics, a yearly trend, and a display
//! table. Pure and synchronous; the narrative call happens in the handler.

pub mod handlers;
pub mod locations;
pub mod prompts;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::dataset::{Dataset, Row};
use crate::errors::AppError;
use self::locations::{distinct_locations, match_locations};

pub const LOCATION_COLUMN: &str = "final location";
pub const SALES_COLUMN: &str = "total_sales - igr";
pub const YEAR_COLUMN: &str = "year";

/// Cap on both the display table and the rows embedded in the prompt.
/// The source revisions disagreed on whether the table is capped; we cap.
pub const TABLE_CAP: usize = 50;

/// One point of the yearly trend, serialized in chart-friendly casing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    #[serde(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Value")]
    pub value: f64,
}

/// Everything the analyzer derives from one query against one dataset.
#[derive(Debug)]
pub struct Analysis {
    pub locations: Vec<String>,
    pub avg_value: Option<f64>,
    pub trend: Vec<TrendPoint>,
    pub table: Vec<Row>,
}

/// Runs the full analysis pipeline. See module docs for the step order.
pub fn analyze_dataset(query: &str, dataset: &Dataset) -> Result<Analysis, AppError> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidRequest("query is required".to_string()));
    }
    if !dataset.has_column(LOCATION_COLUMN) {
        return Err(AppError::Schema(format!(
            "column '{LOCATION_COLUMN}' not found in dataset"
        )));
    }

    let distinct = distinct_locations(dataset, LOCATION_COLUMN);
    let mut locations = match_locations(query, &distinct);
    if locations.is_empty() {
        // No location mentioned means "analyze everything".
        locations = distinct;
    }

    let wanted: HashSet<String> = locations.iter().map(|l| l.to_lowercase()).collect();
    let filtered: Vec<&Row> = dataset
        .rows
        .iter()
        .filter(|row| {
            row.get(LOCATION_COLUMN)
                .and_then(Value::as_str)
                .map(|loc| wanted.contains(&loc.to_lowercase()))
                .unwrap_or(false)
        })
        .collect();

    if filtered.is_empty() {
        return Err(AppError::NoData(
            "no rows match the detected locations".to_string(),
        ));
    }

    let avg_value = column_mean(&filtered, SALES_COLUMN);
    let trend = trend_series(&filtered);
    let table = filtered
        .iter()
        .take(TABLE_CAP)
        .map(|row| (*row).clone())
        .collect();

    Ok(Analysis {
        locations,
        avg_value,
        trend,
        table,
    })
}

/// Mean of a numeric column over the given rows; `None` when the column is
/// absent or holds no numeric values. Non-numeric cells are skipped, not
/// treated as zero.
fn column_mean(rows: &[&Row], column: &str) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for row in rows {
        if let Some(v) = row.get(column).and_then(Value::as_f64) {
            sum += v;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f64)
}

/// Mean sales per year, ascending by year. The BTreeMap gives the sort and
/// the one-point-per-year guarantee. Rows missing either column are skipped.
fn trend_series(rows: &[&Row]) -> Vec<TrendPoint> {
    let mut by_year: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let Some(year) = row.get(YEAR_COLUMN).and_then(Value::as_f64) else {
            continue;
        };
        let Some(value) = row.get(SALES_COLUMN).and_then(Value::as_f64) else {
            continue;
        };
        let entry = by_year.entry(year as i64).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    by_year
        .into_iter()
        .map(|(year, (sum, n))| TrendPoint {
            year,
            value: sum / n as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_spreadsheet;

    /// Pune: 100 (2020), 200 (2021); Mumbai: 300 (2020), 400 (2021).
    fn pune_mumbai() -> Dataset {
        parse_spreadsheet(
            b"final location,total_sales - igr,year\n\
              Pune,100,2020\n\
              Pune,200,2021\n\
              Mumbai,300,2020\n\
              Mumbai,400,2021\n",
        )
        .unwrap()
    }

    #[test]
    fn query_naming_a_location_filters_to_it() {
        let analysis = analyze_dataset("How is Pune doing?", &pune_mumbai()).unwrap();
        assert_eq!(analysis.locations, vec!["Pune"]);
        assert_eq!(
            analysis.trend,
            vec![
                TrendPoint {
                    year: 2020,
                    value: 100.0
                },
                TrendPoint {
                    year: 2021,
                    value: 200.0
                },
            ]
        );
        assert_eq!(analysis.avg_value, Some(150.0));
        assert_eq!(analysis.table.len(), 2);
    }

    #[test]
    fn query_without_a_location_analyzes_everything() {
        let analysis = analyze_dataset("market overview", &pune_mumbai()).unwrap();
        assert_eq!(analysis.locations, vec!["Pune", "Mumbai"]);
        assert_eq!(analysis.avg_value, Some(250.0));
        assert_eq!(analysis.table.len(), 4);
    }

    #[test]
    fn avg_covers_exactly_the_filtered_rows() {
        let analysis = analyze_dataset("tell me about Mumbai", &pune_mumbai()).unwrap();
        assert_eq!(analysis.locations, vec!["Mumbai"]);
        assert_eq!(analysis.avg_value, Some(350.0));
    }

    #[test]
    fn trend_is_strictly_ascending_with_no_duplicate_years() {
        // Years arrive out of order and repeated.
        let dataset = parse_spreadsheet(
            b"final location,total_sales - igr,year\n\
              Pune,10,2021\n\
              Pune,30,2019\n\
              Pune,20,2021\n\
              Pune,40,2020\n",
        )
        .unwrap();
        let analysis = analyze_dataset("Pune", &dataset).unwrap();
        let years: Vec<i64> = analysis.trend.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        // 2021 point is the mean of its two rows.
        assert_eq!(analysis.trend[2].value, 15.0);
    }

    #[test]
    fn blank_query_is_invalid() {
        let err = analyze_dataset("   ", &pune_mumbai()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn missing_location_column_is_a_schema_error() {
        let dataset = parse_spreadsheet(b"city,year\nPune,2020\n").unwrap();
        let err = analyze_dataset("How is Pune doing?", &dataset).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[test]
    fn all_null_locations_is_no_data() {
        let dataset = parse_spreadsheet(b"final location,year\n,2020\n,2021\n").unwrap();
        let err = analyze_dataset("anything", &dataset).unwrap_err();
        assert!(matches!(err, AppError::NoData(_)));
    }

    #[test]
    fn missing_sales_column_drops_avg_and_trend_but_not_the_table() {
        let dataset = parse_spreadsheet(b"final location,year\nPune,2020\n").unwrap();
        let analysis = analyze_dataset("Pune", &dataset).unwrap();
        assert_eq!(analysis.avg_value, None);
        assert!(analysis.trend.is_empty());
        assert_eq!(analysis.table.len(), 1);
    }

    #[test]
    fn missing_year_column_yields_empty_trend() {
        let dataset =
            parse_spreadsheet(b"final location,total_sales - igr\nPune,100\n").unwrap();
        let analysis = analyze_dataset("Pune", &dataset).unwrap();
        assert!(analysis.trend.is_empty());
        assert_eq!(analysis.avg_value, Some(100.0));
    }

    #[test]
    fn non_numeric_sales_cells_are_skipped_in_the_mean() {
        let dataset = parse_spreadsheet(
            b"final location,total_sales - igr,year\n\
              Pune,100,2020\n\
              Pune,n/a,2020\n",
        )
        .unwrap();
        let analysis = analyze_dataset("Pune", &dataset).unwrap();
        assert_eq!(analysis.avg_value, Some(100.0));
    }

    #[test]
    fn table_is_capped_at_fifty_rows() {
        let mut csv = String::from("final location,total_sales - igr,year\n");
        for i in 0..80 {
            csv.push_str(&format!("Pune,{i},2020\n"));
        }
        let dataset = parse_spreadsheet(csv.as_bytes()).unwrap();
        let analysis = analyze_dataset("Pune", &dataset).unwrap();
        assert_eq!(analysis.table.len(), TABLE_CAP);
        // First-occurrence order: the cap keeps the earliest rows.
        assert_eq!(analysis.table[0][SALES_COLUMN], 0);
    }

    #[test]
    fn filtering_is_equality_not_substring() {
        // "Navi Mumbai" must not absorb plain "Mumbai" rows at filter time.
        let dataset = parse_spreadsheet(
            b"final location,total_sales - igr,year\n\
              Navi Mumbai,100,2020\n\
              Mumbai,900,2020\n",
        )
        .unwrap();
        let analysis = analyze_dataset("what about Navi Mumbai?", &dataset).unwrap();
        // Both match the query text ("navi mumbai" contains "mumbai"), so both
        // are detected; each row is then filtered by exact location equality.
        assert_eq!(analysis.locations, vec!["Navi Mumbai", "Mumbai"]);
        assert_eq!(analysis.table.len(), 2);
    }
}
