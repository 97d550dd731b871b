use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::dataset::table::{Dataset, Row};

/// Failure to turn uploaded bytes into a table.
/// Mapped to 400 at the upload boundary and to `DataUnavailable` when the
/// bundled default file is the source.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet contains no sheets")]
    NoSheet,

    #[error("spreadsheet has no header row")]
    NoHeader,
}

/// xlsx files are ZIP containers; anything else is treated as CSV.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Parses spreadsheet bytes into a `Dataset`, sniffing the format.
///
/// Column names are normalized here (trimmed, lowercased); cells become JSON
/// values (numbers stay numeric, blanks become null). The whole table is
/// materialized before the caller may swap it in, so readers never observe a
/// partially parsed dataset.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Dataset, ParseError> {
    if bytes.starts_with(ZIP_MAGIC) {
        parse_xlsx(bytes)
    } else {
        parse_csv(bytes)
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn parse_xlsx(bytes: &[u8]) -> Result<Dataset, ParseError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(ParseError::NoSheet)??;

    let mut sheet_rows = range.rows();
    let header = sheet_rows.next().ok_or(ParseError::NoHeader)?;

    // Keep only columns with a non-blank header.
    let columns: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| (i, normalize_header(&cell.to_string())))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    if columns.is_empty() {
        return Err(ParseError::NoHeader);
    }

    let rows = sheet_rows
        .map(|cells| {
            let mut row = Row::new();
            for (i, name) in &columns {
                let value = cells.get(*i).map(cell_to_value).unwrap_or(Value::Null);
                row.insert(name.clone(), value);
            }
            row
        })
        .collect();

    let names = columns.into_iter().map(|(_, name)| name).collect();
    Ok(Dataset::new(names, rows))
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Number::from_f64(dt.as_f64())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Dataset, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<(usize, String)> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (i, normalize_header(h)))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    if columns.is_empty() {
        return Err(ParseError::NoHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (i, name) in &columns {
            row.insert(name.clone(), field_to_value(record.get(*i).unwrap_or("")));
        }
        rows.push(row);
    }

    let names = columns.into_iter().map(|(_, name)| name).collect();
    Ok(Dataset::new(names, rows))
}

/// CSV fields are untyped text; recover the numeric typing the analyzer
/// expects for the sales and year columns.
fn field_to_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = field.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &[u8] = b"\
 Final Location ,Total_Sales - IGR,Year,notes
Pune,100,2020,good
Pune,200.5,2021,
Mumbai,300,2020,flat
";

    #[test]
    fn csv_headers_are_trimmed_and_lowercased() {
        let dataset = parse_spreadsheet(SAMPLE_CSV).unwrap();
        assert_eq!(
            dataset.columns,
            vec!["final location", "total_sales - igr", "year", "notes"]
        );
    }

    #[test]
    fn csv_fields_keep_numeric_typing() {
        let dataset = parse_spreadsheet(SAMPLE_CSV).unwrap();
        let first = &dataset.rows[0];
        assert_eq!(first["final location"], "Pune");
        assert_eq!(first["total_sales - igr"], 100);
        assert_eq!(first["year"], 2020);

        let second = &dataset.rows[1];
        assert_eq!(second["total_sales - igr"].as_f64(), Some(200.5));
        assert!(second["notes"].is_null());
    }

    #[test]
    fn xlsx_fixture_round_trips_headers_and_rows() {
        let bytes = include_bytes!("../../tests/data/small.xlsx");
        let dataset = parse_spreadsheet(bytes).unwrap();
        assert_eq!(
            dataset.columns,
            vec!["final location", "total_sales - igr", "year"]
        );
        assert_eq!(dataset.row_count(), 4);
        assert_eq!(dataset.rows[0]["final location"], "Pune");
        assert_eq!(dataset.rows[0]["total_sales - igr"].as_f64(), Some(100.0));
    }

    #[test]
    fn garbage_zip_bytes_fail_cleanly() {
        let bytes = b"PK\x03\x04not actually a workbook";
        assert!(parse_spreadsheet(bytes).is_err());
    }

    #[test]
    fn blank_header_columns_are_dropped() {
        let dataset = parse_spreadsheet(b"a,,b\n1,2,3\n").unwrap();
        assert_eq!(dataset.columns, vec!["a", "b"]);
        assert_eq!(dataset.rows[0]["b"], 3);
    }

    #[test]
    fn header_only_input_yields_empty_table() {
        let dataset = parse_spreadsheet(b"final location,year\n").unwrap();
        assert_eq!(dataset.row_count(), 0);
    }
}
