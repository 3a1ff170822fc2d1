//! Simulation parameters.

/// Flat deduction charged against the running balance for every investment.
pub const DEFAULT_FEE: f64 = 14.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub symbol: String,
    /// Lookback span in weeks; sizes the rolling window and the warm-up.
    pub span_weeks: f64,
    /// Fraction of the rolling price span above the rolling low at which to buy.
    pub span_percent: f64,
    /// Reserve gain over cost that arms the trailing stop, and the stop's distance below the high.
    pub limit_pct: f64,
    /// Hard stop-loss below cost while the position is open.
    pub eject_pct: f64,
    pub initial_balance: f64,
    pub fee: f64,
    /// Record a per-day trace in the report.
    pub trace: bool,
}

impl SimulationParams {
    /// Warm-up span as whole days; fractional days are dropped.
    pub fn span_days(&self) -> i64 {
        (self.span_weeks * 7.0).floor() as i64
    }
}
