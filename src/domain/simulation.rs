//! Day-by-day replay of price history (the simulation driver).
//!
//! Each day the current investment is evaluated against the window bounds
//! computed from prior history; only afterwards is the day folded into the
//! window for tomorrow. A closing day opens a fresh `ready` investment that
//! is first evaluated on the following day.

use std::mem;

use chrono::NaiveDate;
use log::{debug, info, warn};

use super::error::MarketSimError;
use super::investment::{DayContext, Investment, StopLimits, TradeEvent};
use super::price_record::PriceRecord;
use super::report::{
    baseline, compound_balances, DataWarning, DayTrace, InvestmentSummary, SimulationReport,
};
use super::rolling_window::{warm_up, RollingWindow, WarmUp};
use super::sim_config::SimulationParams;

pub struct Simulation<'a> {
    params: &'a SimulationParams,
    limits: StopLimits,
    warm_up: WarmUp,
    window: RollingWindow,
    current: Investment,
    history: Vec<Investment>,
    trace: Vec<DayTrace>,
    data_warnings: Vec<DataWarning>,
}

impl<'a> Simulation<'a> {
    /// Size the warm-up window from `records` and open the first investment.
    pub fn new(records: &[PriceRecord], params: &'a SimulationParams) -> Result<Self, MarketSimError> {
        if records.windows(2).any(|w| w[0].date > w[1].date) {
            return Err(MarketSimError::DataSource {
                reason: format!("price records for {} are not in ascending date order", params.symbol),
            });
        }

        let warm_up = warm_up(records, params.span_days(), &params.symbol)?;
        info!(
            "Simulation will start on {} ({} records in window)",
            warm_up.sim_start_date, warm_up.window_len
        );

        let window = RollingWindow::new(records[..warm_up.window_len].to_vec(), params.span_percent)?;
        let current = Investment::new(window.bounds().target_buy);

        Ok(Self {
            params,
            limits: StopLimits {
                limit_pct: params.limit_pct,
                eject_pct: params.eject_pct,
            },
            warm_up,
            window,
            current,
            history: Vec::new(),
            trace: Vec::new(),
            data_warnings: Vec::new(),
        })
    }

    pub fn sim_start_date(&self) -> NaiveDate {
        self.warm_up.sim_start_date
    }

    pub fn current(&self) -> &Investment {
        &self.current
    }

    /// Closed investments, oldest first.
    pub fn history(&self) -> &[Investment] {
        &self.history
    }

    /// Process one day and return the event that fired, if any.
    pub fn step(&mut self, record: &PriceRecord) -> Option<TradeEvent> {
        if record.is_inverted() {
            warn!(
                "{}: low {} above high {}, kept as-is",
                record.date, record.low, record.high
            );
            self.data_warnings.push(DataWarning {
                date: record.date,
                low: record.low,
                high: record.high,
            });
        }

        let status_before = self.current.status();
        let bounds = self.window.bounds();
        let ctx = DayContext {
            record,
            bounds,
            sim_start_date: self.warm_up.sim_start_date,
        };

        let event = self.current.apply_day(&ctx, &self.limits);
        if let Some(ev) = &event {
            debug!("{}: {}", record.date, ev);
            if ev.closes_position() {
                let closed = mem::replace(&mut self.current, Investment::new(bounds.target_buy));
                self.history.push(closed);
            }
        }

        self.window.advance(record.clone());

        if self.params.trace {
            self.trace.push(DayTrace {
                date: record.date,
                status_before,
                day_high: record.high,
                day_low: record.low,
                bounds,
                event: event.clone(),
                status_after: self.current.status(),
            });
        }
        event
    }

    /// Close out the run: summaries, balance ledger and baseline.
    pub fn finish(self, records: &[PriceRecord]) -> Result<SimulationReport, MarketSimError> {
        let Simulation {
            params,
            warm_up,
            current,
            mut history,
            trace,
            data_warnings,
            ..
        } = self;
        history.push(current);

        let investments = history
            .iter()
            .enumerate()
            .map(|(i, inv)| InvestmentSummary::from_investment(i + 1, inv))
            .collect::<Result<Vec<_>, _>>()?;
        let ledger = compound_balances(&history, params.initial_balance, params.fee);
        let final_balance = ledger
            .last()
            .map(|e| e.balance_after)
            .unwrap_or(params.initial_balance);
        let baseline = baseline(records, params.initial_balance, &params.symbol)?;

        let (first_date, last_date) = match (records.first(), records.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => {
                return Err(MarketSimError::NoData {
                    symbol: params.symbol.clone(),
                })
            }
        };

        Ok(SimulationReport {
            symbol: params.symbol.clone(),
            first_date,
            last_date,
            sim_start_date: warm_up.sim_start_date,
            initial_balance: params.initial_balance,
            fee: params.fee,
            investments,
            ledger,
            final_balance,
            baseline,
            trace,
            data_warnings,
        })
    }
}

/// Replay `records` (ascending by date) once and build the report.
pub fn run(records: &[PriceRecord], params: &SimulationParams) -> Result<SimulationReport, MarketSimError> {
    let mut sim = Simulation::new(records, params)?;
    for record in records {
        sim.step(record);
    }
    info!(
        "{}: {} investments, {} completed",
        params.symbol,
        sim.history().len() + 1,
        sim.history().len()
    );
    sim.finish(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::investment::InvestmentStatus;
    use crate::domain::sim_config::DEFAULT_FEE;
    use chrono::Duration;

    fn params() -> SimulationParams {
        SimulationParams {
            symbol: "TEST".into(),
            span_weeks: 1.0,
            span_percent: 0.5,
            limit_pct: 0.05,
            eject_pct: 0.10,
            initial_balance: 1000.0,
            fee: DEFAULT_FEE,
            trace: true,
        }
    }

    fn series(lows_highs: &[(f64, f64)]) -> Vec<PriceRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        lows_highs
            .iter()
            .enumerate()
            .map(|(i, &(low, high))| PriceRecord {
                date: start + Duration::days(i as i64),
                open: low,
                high,
                low,
                close: (low + high) / 2.0,
                volume: 100.0,
            })
            .collect()
    }

    /// Eight warm-up days trading 90..110, so the target settles at 100.
    fn warm() -> Vec<(f64, f64)> {
        vec![(90.0, 110.0); 8]
    }

    #[test]
    fn unsorted_records_are_rejected() {
        let mut records = series(&warm());
        records.swap(0, 3);
        let p = params();
        assert!(matches!(
            Simulation::new(&records, &p),
            Err(MarketSimError::DataSource { .. })
        ));
    }

    #[test]
    fn no_trades_during_warm_up() {
        let records = series(&[warm(), vec![(110.0, 120.0)]].concat());
        let report = run(&records, &params()).unwrap();
        assert_eq!(report.investments.len(), 1);
        assert_eq!(report.investments[0].status, InvestmentStatus::Ready);
        assert_eq!(report.sim_start_date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[test]
    fn buy_then_eject_opens_new_investment() {
        let days = [warm(), vec![(95.0, 105.0), (85.0, 100.0), (95.0, 105.0)]].concat();
        let records = series(&days);
        let p = params();
        let mut sim = Simulation::new(&records, &p).unwrap();
        let events: Vec<_> = records.iter().map(|r| sim.step(r)).collect();

        assert!(matches!(events[8], Some(TradeEvent::Bought { price, .. }) if price == 100.0));
        assert!(matches!(events[9], Some(TradeEvent::Ejected { .. })));
        assert_eq!(sim.history().len(), 1);
        // new investment is only evaluated from the following day
        assert!(matches!(events[10], Some(TradeEvent::Bought { .. })));
        assert_eq!(sim.current().status(), InvestmentStatus::Open);
    }

    #[test]
    fn closing_day_does_not_reevaluate_new_investment() {
        // eject day also trades through the target; the fresh investment stays ready
        let days = [warm(), vec![(95.0, 105.0), (85.0, 101.0)]].concat();
        let records = series(&days);
        let report = run(&records, &params()).unwrap();
        assert_eq!(report.investments.len(), 2);
        assert_eq!(report.investments[0].status, InvestmentStatus::Completed);
        assert_eq!(report.investments[1].status, InvestmentStatus::Ready);
    }

    #[test]
    fn decision_uses_previous_day_bounds() {
        // Day 9 low of 50 would drag the target down if folded in first.
        let days = [warm(), vec![(50.0, 99.0)]].concat();
        let records = series(&days);
        let report = run(&records, &params()).unwrap();
        let last = report.trace.last().unwrap();
        assert_eq!(last.bounds.target_buy, 100.0);
        assert!(matches!(
            last.event,
            Some(TradeEvent::Bought { price, .. }) if price == 99.0
        ));
    }

    #[test]
    fn trace_records_every_day() {
        let records = series(&[warm(), vec![(95.0, 105.0)]].concat());
        let report = run(&records, &params()).unwrap();
        assert_eq!(report.trace.len(), records.len());
        let buy_day = &report.trace[8];
        assert_eq!(buy_day.status_before, InvestmentStatus::Ready);
        assert_eq!(buy_day.status_after, InvestmentStatus::Open);
    }

    #[test]
    fn trace_disabled() {
        let records = series(&[warm(), vec![(95.0, 105.0)]].concat());
        let p = SimulationParams {
            trace: false,
            ..params()
        };
        assert!(run(&records, &p).unwrap().trace.is_empty());
    }

    #[test]
    fn inverted_day_is_reported_not_clamped() {
        let days = [warm(), vec![(120.0, 80.0)]].concat();
        let records = series(&days);
        let report = run(&records, &params()).unwrap();
        assert_eq!(report.data_warnings.len(), 1);
        assert_eq!(report.data_warnings[0].low, 120.0);
        // target 100 > high 80: superbuy at the (inverted) high
        assert!(matches!(
            report.trace[8].event,
            Some(TradeEvent::Bought { price, .. }) if price == 80.0
        ));
    }

    #[test]
    fn insufficient_history_is_fatal() {
        let records = series(&warm());
        assert!(matches!(
            run(&records, &params()),
            Err(MarketSimError::InsufficientHistory { .. })
        ));
    }
}
