//! Simulation report: per-investment summaries, balance ledger and the
//! buy-and-hold baseline.

use chrono::NaiveDate;

use super::error::MarketSimError;
use super::investment::{BuyType, Investment, InvestmentStatus, TradeEvent};
use super::price_record::PriceRecord;
use super::rolling_window::WindowBounds;

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentSummary {
    /// 1-based position in the run.
    pub number: usize,
    pub status: InvestmentStatus,
    pub target_buy: f64,
    pub buy_type: Option<BuyType>,
    pub buy_date: Option<NaiveDate>,
    pub buy_price: f64,
    pub set_date: Option<NaiveDate>,
    pub set_price: f64,
    pub trailing_stop: f64,
    pub sell_date: Option<NaiveDate>,
    pub sell_price: f64,
    pub days_held: i64,
    pub roi: f64,
    pub apr: f64,
}

impl InvestmentSummary {
    pub fn from_investment(number: usize, inv: &Investment) -> Result<Self, MarketSimError> {
        Ok(Self {
            number,
            status: inv.status(),
            target_buy: inv.target_buy(),
            buy_type: inv.buy_type(),
            buy_date: inv.buy_date(),
            buy_price: inv.buy_price(),
            set_date: inv.set_date(),
            set_price: inv.set_price(),
            trailing_stop: inv.trailing_stop(),
            sell_date: inv.sell_date(),
            sell_price: inv.sell_price(),
            days_held: inv.days_held(),
            roi: inv.roi(),
            apr: inv.apr()?,
        })
    }

    pub fn was_set(&self) -> bool {
        self.set_date.is_some()
    }
}

/// Running balance around one investment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerEntry {
    pub number: usize,
    pub balance_before: f64,
    pub change: f64,
    pub balance_after: f64,
}

/// Buy-and-hold comparison over the same history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub initial_price: f64,
    pub final_price: f64,
    pub percent_change: f64,
    pub final_balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayTrace {
    pub date: NaiveDate,
    pub status_before: InvestmentStatus,
    pub day_high: f64,
    pub day_low: f64,
    /// Bounds the day's decision was made against.
    pub bounds: WindowBounds,
    pub event: Option<TradeEvent>,
    pub status_after: InvestmentStatus,
}

/// A parseable but suspicious record, kept in the simulation as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct DataWarning {
    pub date: NaiveDate,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub symbol: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub sim_start_date: NaiveDate,
    pub initial_balance: f64,
    pub fee: f64,
    pub investments: Vec<InvestmentSummary>,
    pub ledger: Vec<LedgerEntry>,
    pub final_balance: f64,
    pub baseline: Baseline,
    pub trace: Vec<DayTrace>,
    pub data_warnings: Vec<DataWarning>,
}

impl SimulationReport {
    pub fn completed(&self) -> impl Iterator<Item = &InvestmentSummary> {
        self.investments
            .iter()
            .filter(|s| s.status == InvestmentStatus::Completed)
    }

    /// (final - initial) / initial for the strategy.
    pub fn total_return(&self) -> f64 {
        (self.final_balance - self.initial_balance) / self.initial_balance
    }

    pub fn beats_baseline(&self) -> bool {
        self.final_balance > self.baseline.final_balance
    }
}

/// Charge `fee` and compound each investment's ROI into a running balance.
///
/// Every investment is charged, including the unfinished last one.
pub fn compound_balances(investments: &[Investment], initial_balance: f64, fee: f64) -> Vec<LedgerEntry> {
    let mut balance = initial_balance;
    investments
        .iter()
        .enumerate()
        .map(|(i, inv)| {
            let after = balance - fee + balance * inv.roi();
            let entry = LedgerEntry {
                number: i + 1,
                balance_before: balance,
                change: after - balance,
                balance_after: after,
            };
            balance = after;
            entry
        })
        .collect()
}

/// Buy-and-hold from the second record's close to the last record's close.
pub fn baseline(
    records: &[PriceRecord],
    initial_balance: f64,
    symbol: &str,
) -> Result<Baseline, MarketSimError> {
    let (Some(initial), Some(last)) = (records.get(1), records.last()) else {
        return Err(MarketSimError::NoData {
            symbol: symbol.to_string(),
        });
    };
    let percent_change = (last.close - initial.close) / initial.close;
    Ok(Baseline {
        initial_price: initial.close,
        final_price: last.close,
        percent_change,
        final_balance: initial_balance * (1.0 + percent_change),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(d: u32, close: f64) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn baseline_skips_first_record() {
        let records = vec![record(1, 1.0), record(2, 50.0), record(3, 60.0), record(4, 75.0)];
        let b = baseline(&records, 1000.0, "X").unwrap();
        assert_eq!(b.initial_price, 50.0);
        assert_eq!(b.final_price, 75.0);
        assert_relative_eq!(b.percent_change, 0.5);
        assert_relative_eq!(b.final_balance, 1500.0);
    }

    #[test]
    fn baseline_needs_two_records() {
        let err = baseline(&[record(1, 10.0)], 1000.0, "X").unwrap_err();
        assert!(matches!(err, MarketSimError::NoData { .. }));
    }

    #[test]
    fn ledger_charges_fee_on_unfinished_investment() {
        let ledger = compound_balances(&[Investment::new(10.0)], 1000.0, 14.0);
        assert_eq!(ledger.len(), 1);
        assert_relative_eq!(ledger[0].balance_after, 986.0);
        assert_relative_eq!(ledger[0].change, -14.0);
    }

    #[test]
    fn ledger_entries_chain() {
        let invs = vec![Investment::new(1.0), Investment::new(2.0), Investment::new(3.0)];
        let ledger = compound_balances(&invs, 100.0, 1.0);
        assert_eq!(ledger.iter().map(|e| e.number).collect::<Vec<_>>(), vec![1, 2, 3]);
        for pair in ledger.windows(2) {
            assert_eq!(pair[0].balance_after, pair[1].balance_before);
        }
        assert_relative_eq!(ledger[2].balance_after, 97.0);
    }

    #[test]
    fn summary_of_ready_investment() {
        let s = InvestmentSummary::from_investment(3, &Investment::new(12.5)).unwrap();
        assert_eq!(s.number, 3);
        assert_eq!(s.status, InvestmentStatus::Ready);
        assert_eq!(s.target_buy, 12.5);
        assert!(!s.was_set());
        assert_eq!(s.apr, 0.0);
    }
}
