//! Daily price record.

use chrono::NaiveDate;

/// One day of price history. Never mutated once built.
///
/// `low <= high` is not enforced; malformed rows flow through the simulation
/// unchanged and are surfaced via [`PriceRecord::is_inverted`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceRecord {
    /// low > high
    pub fn is_inverted(&self) -> bool {
        self.low > self.high
    }
}

/// Stable sort by date; records sharing a date keep their input order.
pub fn sort_by_date(records: &mut [PriceRecord]) {
    records.sort_by_key(|r| r.date);
}
