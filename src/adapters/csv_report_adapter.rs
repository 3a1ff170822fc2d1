//! CSV export of per-investment summaries implementing ReportPort.

use crate::domain::error::MarketSimError;
use crate::domain::report::SimulationReport;
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 16] = [
    "number",
    "status",
    "target_buy",
    "buy_type",
    "buy_date",
    "buy_price",
    "set_date",
    "set_price",
    "trailing_stop",
    "sell_date",
    "sell_price",
    "days_held",
    "roi",
    "apr",
    "balance_before",
    "balance_after",
];

pub struct CsvReportAdapter;

fn csv_error(e: impl std::fmt::Display) -> MarketSimError {
    MarketSimError::DataSource {
        reason: format!("CSV write error: {}", e),
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ReportPort for CsvReportAdapter {
    fn render(&self, report: &SimulationReport) -> Result<String, MarketSimError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(HEADER).map_err(csv_error)?;

        for (s, entry) in report.investments.iter().zip(&report.ledger) {
            wtr.write_record([
                s.number.to_string(),
                s.status.to_string(),
                s.target_buy.to_string(),
                opt(s.buy_type),
                opt(s.buy_date),
                s.buy_price.to_string(),
                opt(s.set_date),
                s.set_price.to_string(),
                s.trailing_stop.to_string(),
                opt(s.sell_date),
                s.sell_price.to_string(),
                s.days_held.to_string(),
                s.roi.to_string(),
                s.apr.to_string(),
                entry.balance_before.to_string(),
                entry.balance_after.to_string(),
            ])
            .map_err(csv_error)?;
        }

        let bytes = wtr.into_inner().map_err(csv_error)?;
        String::from_utf8(bytes).map_err(csv_error)
    }
}
