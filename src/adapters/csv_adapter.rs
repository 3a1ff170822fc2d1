//! CSV price history adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with rows of
//! `date, close, volume, open, high, low`. Numbers may carry thousands
//! separators (`"1,234.50"`).

use crate::domain::error::{MarketSimError, RecordParseError};
use crate::domain::price_record::{sort_by_date, PriceRecord};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

const COLUMNS: [&str; 6] = ["date", "close", "volume", "open", "high", "low"];

pub struct CsvAdapter {
    base_path: PathBuf,
    has_headers: bool,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            has_headers: false,
        }
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

impl PriceDataPort for CsvAdapter {
    fn fetch_records(&self, symbol: &str) -> Result<Vec<PriceRecord>, MarketSimError> {
        let path = self.csv_path(symbol);
        let file = File::open(&path).map_err(|e| MarketSimError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let records = parse_records(file, self.has_headers)?;
        if records.is_empty() {
            return Err(MarketSimError::NoData {
                symbol: symbol.to_string(),
            });
        }
        log::info!("Loaded {} records for {} from {}", records.len(), symbol, path.display());
        Ok(records)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MarketSimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MarketSimError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MarketSimError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

/// Parse every row of `reader` into records sorted (stably) by date.
///
/// The first bad row aborts parsing.
pub fn parse_records<R: io::Read>(
    reader: R,
    has_headers: bool,
) -> Result<Vec<PriceRecord>, MarketSimError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let row = result.map_err(|e| MarketSimError::DataSource {
            reason: format!("CSV read error: {}", e),
        })?;
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        records.push(parse_row(&row, line)?);
    }

    sort_by_date(&mut records);
    Ok(records)
}

fn column(row: &csv::StringRecord, i: usize, line: usize) -> Result<&str, RecordParseError> {
    row.get(i).ok_or_else(|| RecordParseError {
        row: line,
        field: COLUMNS[i].to_string(),
        reason: "missing column".into(),
    })
}

fn parse_row(row: &csv::StringRecord, line: usize) -> Result<PriceRecord, RecordParseError> {
    let field = |i: usize| column(row, i, line);

    let date_str = field(0)?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| RecordParseError {
        row: line,
        field: "date".into(),
        reason: format!("{:?}: {}", date_str, e),
    })?;

    let close = parse_price(field(1)?, line, COLUMNS[1])?;
    let volume = parse_price(field(2)?, line, COLUMNS[2])?;
    let open = parse_price(field(3)?, line, COLUMNS[3])?;
    let high = parse_price(field(4)?, line, COLUMNS[4])?;
    let low = parse_price(field(5)?, line, COLUMNS[5])?;

    if close <= 0.0 {
        return Err(RecordParseError {
            row: line,
            field: "close".into(),
            reason: format!("must be positive, got {}", close),
        });
    }

    Ok(PriceRecord {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

/// Non-negative decimal; thousands separators are ignored.
fn parse_price(raw: &str, line: usize, field: &str) -> Result<f64, RecordParseError> {
    let err = |reason: String| RecordParseError {
        row: line,
        field: field.to_string(),
        reason,
    };
    let cleaned = raw.replace(',', "");
    let value: f64 = cleaned
        .parse()
        .map_err(|_| err(format!("not a number: {:?}", raw)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(err(format!("must be a non-negative number, got {:?}", raw)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SPY: &str = "2016-03-16,\"2,040.50\",\"1,234,567\",2030.00,2045.25,2025.10\n\
        2016-03-14,2019.64,100000,2015.27,2024.57,2012.05\n\
        2016-03-15,2015.93,90000,2016.76,2018.00,2005.00\n";

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(path.join("SPY.csv"), SPY).unwrap();
        fs::write(path.join("AGG.csv"), "").unwrap();
        fs::write(path.join("notes.txt"), "ignore me").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_records_parses_and_sorts() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let records = adapter.fetch_records("SPY").unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2016, 3, 14).unwrap());
        assert_eq!(records[2].date, NaiveDate::from_ymd_opt(2016, 3, 16).unwrap());
        assert_eq!(records[2].close, 2040.50);
        assert_eq!(records[2].volume, 1_234_567.0);
        assert_eq!(records[2].open, 2030.00);
        assert_eq!(records[2].high, 2045.25);
        assert_eq!(records[2].low, 2025.10);
    }

    #[test]
    fn fetch_records_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(matches!(
            adapter.fetch_records("XYZ"),
            Err(MarketSimError::DataSource { .. })
        ));
    }

    #[test]
    fn fetch_records_errors_for_empty_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(matches!(
            adapter.fetch_records("AGG"),
            Err(MarketSimError::NoData { symbol }) if symbol == "AGG"
        ));
    }

    #[test]
    fn header_row_is_skipped_when_configured() {
        let content = format!("Date,Close,Volume,Open,High,Low\n{}", SPY);
        let records = parse_records(content.as_bytes(), true).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn header_row_is_rejected_otherwise() {
        let content = format!("Date,Close,Volume,Open,High,Low\n{}", SPY);
        let err = parse_records(content.as_bytes(), false).unwrap_err();
        assert!(matches!(err, MarketSimError::RecordParse(e) if e.row == 1 && e.field == "date"));
    }

    #[test]
    fn bad_price_identifies_row() {
        let content = "2016-03-14,1.0,1,1,1,1\n2016-03-15,abc,1,1,1,1\n";
        let err = parse_records(content.as_bytes(), false).unwrap_err();
        assert!(matches!(err, MarketSimError::RecordParse(e) if e.row == 2 && e.field == "close"));
    }

    #[test]
    fn missing_column_is_rejected() {
        let content = "2016-03-14,1.0,1,1,1\n";
        let err = parse_records(content.as_bytes(), false).unwrap_err();
        assert!(matches!(err, MarketSimError::RecordParse(e) if e.field == "low"));
    }

    #[test]
    fn zero_close_is_rejected() {
        let content = "2016-03-14,0,1,1,1,1\n";
        let err = parse_records(content.as_bytes(), false).unwrap_err();
        assert!(matches!(err, MarketSimError::RecordParse(e) if e.field == "close"));
    }

    #[test]
    fn negative_low_is_rejected() {
        let content = "2016-03-14,1,1,1,1,-1\n";
        let err = parse_records(content.as_bytes(), false).unwrap_err();
        assert!(matches!(err, MarketSimError::RecordParse(e) if e.field == "low"));
    }

    #[test]
    fn inverted_low_high_is_accepted() {
        let content = "2016-03-14,10,1,10,9,11\n";
        let records = parse_records(content.as_bytes(), false).unwrap();
        assert!(records[0].is_inverted());
    }

    #[test]
    fn same_date_rows_keep_input_order() {
        let content = "2016-03-15,2,1,1,1,1\n2016-03-14,1,1,1,1,1\n2016-03-15,3,1,1,1,1\n";
        let records = parse_records(content.as_bytes(), false).unwrap();
        let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["AGG", "SPY"]);
    }
}
