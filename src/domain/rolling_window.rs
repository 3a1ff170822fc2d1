//! Trailing high/low window and buy-target derivation.

use std::collections::VecDeque;

use chrono::{Duration, NaiveDate};

use super::error::MarketSimError;
use super::price_record::PriceRecord;

/// Bounds derived from the current window contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowBounds {
    pub rolling_hi: f64,
    pub rolling_lo: f64,
    pub target_buy: f64,
}

impl WindowBounds {
    fn from_extremes(rolling_hi: f64, rolling_lo: f64, span_percent: f64) -> Self {
        let mut bounds = Self {
            rolling_hi,
            rolling_lo,
            target_buy: rolling_lo,
        };
        bounds.target_buy = span_percent * bounds.price_span() + rolling_lo;
        bounds
    }

    pub fn price_span(&self) -> f64 {
        self.rolling_hi - self.rolling_lo
    }
}

/// Where the warm-up ends and how many records seed the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmUp {
    /// `first_date + span`; buys are only considered strictly after this date.
    pub sim_start_date: NaiveDate,
    /// Number of leading records dated on or before `sim_start_date`.
    pub window_len: usize,
}

/// Locate the warm-up boundary in date-sorted `records`.
///
/// Fails when no record falls after the boundary, since the simulation would
/// never be allowed to buy. A span that overflows the calendar is rejected as
/// an invalid `span_weeks`.
pub fn warm_up(
    records: &[PriceRecord],
    span_days: i64,
    symbol: &str,
) -> Result<WarmUp, MarketSimError> {
    let first = records.first().ok_or_else(|| MarketSimError::NoData {
        symbol: symbol.to_string(),
    })?;
    let sim_start_date = Duration::try_days(span_days)
        .and_then(|span| first.date.checked_add_signed(span))
        .ok_or_else(|| MarketSimError::ConfigInvalid {
            section: "simulation".into(),
            key: "span_weeks".into(),
            reason: format!("span of {span_days} days is beyond the supported calendar"),
        })?;

    match records.iter().position(|r| r.date > sim_start_date) {
        Some(window_len) => Ok(WarmUp {
            sim_start_date,
            window_len,
        }),
        None => Err(MarketSimError::InsufficientHistory {
            symbol: symbol.to_string(),
            first_date: first.date,
            sim_start_date,
            records: records.len(),
        }),
    }
}

/// Fixed-length sliding window over price records.
///
/// Highs and lows are rescanned on every advance.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    records: VecDeque<PriceRecord>,
    span_percent: f64,
    bounds: WindowBounds,
}

impl RollingWindow {
    pub fn new(initial: Vec<PriceRecord>, span_percent: f64) -> Result<Self, MarketSimError> {
        if initial.is_empty() {
            return Err(MarketSimError::ConfigInvalid {
                section: "simulation".into(),
                key: "span_weeks".into(),
                reason: "rolling window would be empty".into(),
            });
        }
        let records: VecDeque<PriceRecord> = initial.into();
        let bounds = compute_bounds(&records, span_percent);
        Ok(Self {
            records,
            span_percent,
            bounds,
        })
    }

    pub fn bounds(&self) -> WindowBounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop the oldest record, append `record`, and recompute the bounds.
    pub fn advance(&mut self, record: PriceRecord) -> WindowBounds {
        self.records.pop_front();
        self.records.push_back(record);
        self.bounds = compute_bounds(&self.records, self.span_percent);
        self.bounds
    }
}

fn compute_bounds(records: &VecDeque<PriceRecord>, span_percent: f64) -> WindowBounds {
    let mut iter = records.iter();
    let (mut hi, mut lo) = match iter.next() {
        Some(r) => (r.high, r.low),
        None => (0.0, 0.0),
    };
    for r in iter {
        if r.high > hi {
            hi = r.high;
        }
        if r.low < lo {
            lo = r.low;
        }
    }
    WindowBounds::from_extremes(hi, lo, span_percent)
}
