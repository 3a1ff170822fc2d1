//! Investment lifecycle: ready -> open -> set -> completed.
//!
//! Each simulated day is matched against [`DECISION_TABLE`] top to bottom and
//! at most one rule fires. The order of the table is part of the strategy's
//! behaviour: an `open` position that both breaches the eject threshold and
//! clears its reserve on the same day is ejected.

use std::fmt;

use chrono::NaiveDate;

use super::error::MarketSimError;
use super::price_record::PriceRecord;
use super::rolling_window::WindowBounds;

pub const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvestmentStatus {
    Ready,
    Open,
    Set,
    Completed,
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvestmentStatus::Ready => "ready",
            InvestmentStatus::Open => "open",
            InvestmentStatus::Set => "set",
            InvestmentStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyType {
    /// Intraday crossing of the target; filled at the target.
    Buy,
    /// Whole day traded below the target; filled at the day's high.
    Superbuy,
}

impl fmt::Display for BuyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuyType::Buy => f.write_str("Buy"),
            BuyType::Superbuy => f.write_str("Superbuy"),
        }
    }
}

/// Percentages that govern exits, as fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLimits {
    pub limit_pct: f64,
    pub eject_pct: f64,
}

/// Everything a rule may look at for one day.
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    pub record: &'a PriceRecord,
    /// Bounds computed from history up to, not including, `record`.
    pub bounds: WindowBounds,
    pub sim_start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    Ejected { buy_price: f64, sell_price: f64 },
    StopRaised { from: f64, to: f64 },
    StopSold { buy_price: f64, sell_price: f64 },
    ReserveMet { trailing_stop: f64 },
    Bought { buy_type: BuyType, price: f64 },
}

impl TradeEvent {
    pub fn closes_position(&self) -> bool {
        matches!(self, TradeEvent::Ejected { .. } | TradeEvent::StopSold { .. })
    }
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeEvent::Ejected {
                buy_price,
                sell_price,
            } => write!(f, "EJECTED! bought at {buy_price} sold at {sell_price}"),
            TradeEvent::StopRaised { from, to } => {
                write!(f, "trailing stop increased from {from} to {to}")
            }
            TradeEvent::StopSold {
                buy_price,
                sell_price,
            } => write!(
                f,
                "investment complete, bought at {buy_price} sold at {sell_price}"
            ),
            TradeEvent::ReserveMet { trailing_stop } => {
                write!(f, "investment is set, trailing stop = {trailing_stop}")
            }
            TradeEvent::Bought { buy_type, price } => write!(f, "{buy_type} occurred at {price}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRule {
    Eject,
    RaiseStop,
    StopSell,
    ReserveMet,
    BuyDecision,
}

/// Strict priority order; first match wins.
pub const DECISION_TABLE: [DecisionRule; 5] = [
    DecisionRule::Eject,
    DecisionRule::RaiseStop,
    DecisionRule::StopSell,
    DecisionRule::ReserveMet,
    DecisionRule::BuyDecision,
];

impl DecisionRule {
    fn applies(self, inv: &Investment, ctx: &DayContext<'_>, limits: &StopLimits) -> bool {
        let day = ctx.record;
        match self {
            DecisionRule::Eject => {
                inv.status == InvestmentStatus::Open
                    && inv.buy_price * (1.0 - limits.eject_pct) > day.low
            }
            DecisionRule::RaiseStop => {
                inv.status == InvestmentStatus::Set
                    && day.high * (1.0 - limits.limit_pct) > inv.trailing_stop
            }
            DecisionRule::StopSell => {
                inv.status == InvestmentStatus::Set && inv.trailing_stop > day.low
            }
            DecisionRule::ReserveMet => {
                inv.status == InvestmentStatus::Open && day.high > inv.set_price
            }
            DecisionRule::BuyDecision => {
                inv.status == InvestmentStatus::Ready
                    && day.date > ctx.sim_start_date
                    && buy_type_for(ctx.bounds.target_buy, day).is_some()
            }
        }
    }

    fn fire(self, inv: &mut Investment, ctx: &DayContext<'_>, limits: &StopLimits) -> TradeEvent {
        let day = ctx.record;
        match self {
            DecisionRule::Eject => {
                let sell_price = inv.buy_price * (1.0 - limits.eject_pct);
                inv.complete(day.date, sell_price);
                TradeEvent::Ejected {
                    buy_price: inv.buy_price,
                    sell_price,
                }
            }
            DecisionRule::RaiseStop => {
                let from = inv.trailing_stop;
                inv.trailing_stop = day.high * (1.0 - limits.limit_pct);
                TradeEvent::StopRaised {
                    from,
                    to: inv.trailing_stop,
                }
            }
            DecisionRule::StopSell => {
                let sell_price = inv.trailing_stop;
                inv.complete(day.date, sell_price);
                TradeEvent::StopSold {
                    buy_price: inv.buy_price,
                    sell_price,
                }
            }
            DecisionRule::ReserveMet => {
                inv.status = InvestmentStatus::Set;
                inv.set_date = Some(day.date);
                inv.trailing_stop = inv.buy_price;
                TradeEvent::ReserveMet {
                    trailing_stop: inv.trailing_stop,
                }
            }
            DecisionRule::BuyDecision => {
                let target = ctx.bounds.target_buy;
                // applies() already established a buy type exists
                let buy_type = buy_type_for(target, day).unwrap_or(BuyType::Buy);
                let price = match buy_type {
                    BuyType::Superbuy => day.high,
                    BuyType::Buy => target,
                };
                inv.status = InvestmentStatus::Open;
                inv.buy_type = Some(buy_type);
                inv.buy_date = Some(day.date);
                inv.buy_price = price;
                inv.set_price = price * (1.0 + limits.limit_pct);
                TradeEvent::Bought { buy_type, price }
            }
        }
    }
}

/// Exact-equality edges (target == high, target == low) buy nothing.
fn buy_type_for(target: f64, day: &PriceRecord) -> Option<BuyType> {
    if target > day.high {
        Some(BuyType::Superbuy)
    } else if day.low < target && target < day.high {
        Some(BuyType::Buy)
    } else {
        None
    }
}

/// One buy/sell cycle. Status only changes through [`Investment::apply_day`].
#[derive(Debug, Clone, PartialEq)]
pub struct Investment {
    status: InvestmentStatus,
    target_buy: f64,
    buy_type: Option<BuyType>,
    buy_date: Option<NaiveDate>,
    buy_price: f64,
    set_date: Option<NaiveDate>,
    set_price: f64,
    trailing_stop: f64,
    sell_date: Option<NaiveDate>,
    sell_price: f64,
}

impl Investment {
    pub fn new(target_buy: f64) -> Self {
        Self {
            status: InvestmentStatus::Ready,
            target_buy,
            buy_type: None,
            buy_date: None,
            buy_price: 0.0,
            set_date: None,
            set_price: 0.0,
            trailing_stop: 0.0,
            sell_date: None,
            sell_price: 0.0,
        }
    }

    /// Evaluate the decision table for one day. Returns the event of the
    /// rule that fired, if any.
    pub fn apply_day(&mut self, ctx: &DayContext<'_>, limits: &StopLimits) -> Option<TradeEvent> {
        let rule = DECISION_TABLE
            .into_iter()
            .find(|rule| rule.applies(self, ctx, limits))?;
        Some(rule.fire(self, ctx, limits))
    }

    fn complete(&mut self, date: NaiveDate, sell_price: f64) {
        self.status = InvestmentStatus::Completed;
        self.sell_date = Some(date);
        self.sell_price = sell_price;
    }

    pub fn status(&self) -> InvestmentStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == InvestmentStatus::Completed
    }

    pub fn target_buy(&self) -> f64 {
        self.target_buy
    }

    pub fn buy_type(&self) -> Option<BuyType> {
        self.buy_type
    }

    pub fn buy_date(&self) -> Option<NaiveDate> {
        self.buy_date
    }

    pub fn buy_price(&self) -> f64 {
        self.buy_price
    }

    pub fn set_date(&self) -> Option<NaiveDate> {
        self.set_date
    }

    pub fn set_price(&self) -> f64 {
        self.set_price
    }

    pub fn trailing_stop(&self) -> f64 {
        self.trailing_stop
    }

    pub fn sell_date(&self) -> Option<NaiveDate> {
        self.sell_date
    }

    pub fn sell_price(&self) -> f64 {
        self.sell_price
    }

    fn holding_dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.status, self.buy_date, self.sell_date) {
            (InvestmentStatus::Completed, Some(buy), Some(sell)) => Some((buy, sell)),
            _ => None,
        }
    }

    /// Calendar days between buy and sell; 0 unless completed.
    pub fn days_held(&self) -> i64 {
        self.holding_dates()
            .map(|(buy, sell)| (sell - buy).num_days())
            .unwrap_or(0)
    }

    /// (sell - buy) / buy; 0 unless completed.
    pub fn roi(&self) -> f64 {
        if self.is_completed() {
            (self.sell_price - self.buy_price) / self.buy_price
        } else {
            0.0
        }
    }

    /// 365.25 / days_held * roi; 0 unless completed.
    pub fn apr(&self) -> Result<f64, MarketSimError> {
        let Some((buy_date, sell_date)) = self.holding_dates() else {
            return Ok(0.0);
        };
        let days = (sell_date - buy_date).num_days();
        if days == 0 {
            return Err(MarketSimError::ZeroHoldingPeriod {
                buy_date,
                sell_date,
            });
        }
        Ok(DAYS_PER_YEAR / days as f64 * self.roi())
    }
}
