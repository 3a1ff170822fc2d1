#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use market_sim::domain::error::MarketSimError;
pub use market_sim::domain::price_record::PriceRecord;
use market_sim::domain::sim_config::{SimulationParams, DEFAULT_FEE};
use market_sim::ports::data_port::PriceDataPort;
use std::collections::HashMap;
use std::process::ExitCode;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceRecord>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_records(mut self, symbol: &str, records: Vec<PriceRecord>) -> Self {
        self.data.insert(symbol.to_string(), records);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_records(&self, symbol: &str) -> Result<Vec<PriceRecord>, MarketSimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MarketSimError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(records) if !records.is_empty() => Ok(records.clone()),
            _ => Err(MarketSimError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, MarketSimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days from 2024-01-01; close is the midpoint.
pub fn daily_series(lows_highs: &[(f64, f64)]) -> Vec<PriceRecord> {
    let start = date(2024, 1, 1);
    lows_highs
        .iter()
        .enumerate()
        .map(|(i, &(low, high))| PriceRecord {
            date: start + Duration::days(i as i64),
            open: low,
            high,
            low,
            close: (low + high) / 2.0,
            volume: 1000.0,
        })
        .collect()
}

/// Eight days trading 90..110, then a buy, reserve, stop raise, stop sale
/// and a superbuy. With `scenario_params` this completes one trade at 117.
pub fn scenario_days() -> Vec<(f64, f64)> {
    let mut days = vec![(90.0, 110.0); 8];
    days.extend([
        (95.0, 105.0),  // 01-09 buy at 100
        (100.0, 112.0), // 01-10 reserve met, stop = 100
        (110.0, 130.0), // 01-11 stop raised to 117
        (115.0, 120.0), // 01-12 sold at 117
        (108.0, 109.0), // 01-13 superbuy at 109
    ]);
    days
}

pub fn scenario_params() -> SimulationParams {
    SimulationParams {
        symbol: "TEST".into(),
        span_weeks: 1.0,
        span_percent: 0.5,
        limit_pct: 0.1,
        eject_pct: 0.2,
        initial_balance: 1000.0,
        fee: DEFAULT_FEE,
        trace: false,
    }
}

/// CSV rows (`date,close,volume,open,high,low`) for `records`.
pub fn to_csv(records: &[PriceRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "{},{},\"{}\",{},{},{}\n",
                r.date, r.close, "1,000", r.open, r.high, r.low
            )
        })
        .collect()
}

pub fn same_exit_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}
