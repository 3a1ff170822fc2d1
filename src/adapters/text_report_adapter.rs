//! Plain-text report adapter implementing ReportPort.
//!
//! Money is truncated to cents and percentages to three decimals; values are
//! never rounded up.

use crate::domain::error::MarketSimError;
use crate::domain::investment::InvestmentStatus;
use crate::domain::report::{DayTrace, InvestmentSummary, LedgerEntry, SimulationReport};
use crate::ports::report_port::ReportPort;

const RULE: &str = "- - - - - - - - - - - - - - - - - - - - -\n";

pub struct TextReportAdapter;

impl ReportPort for TextReportAdapter {
    fn render(&self, report: &SimulationReport) -> Result<String, MarketSimError> {
        let mut output = String::new();
        output.push_str("Market - Equity Trading Simulator\n");
        output.push_str(&format!("Symbol: {}\n", report.symbol));
        output.push_str(&format!(
            "History: {} to {}\n",
            report.first_date, report.last_date
        ));
        output.push_str(&format!(
            "Simulation will start on {}\n",
            report.sim_start_date
        ));

        if !report.trace.is_empty() {
            output.push('\n');
            for day in &report.trace {
                output.push_str(&format_day(day));
            }
        }

        output.push_str("\nInvestment results...\n");
        for (summary, entry) in report.investments.iter().zip(&report.ledger) {
            output.push_str(&format_investment(summary, entry));
        }

        if !report.data_warnings.is_empty() {
            output.push_str("\nData quality warnings (kept as-is):\n");
            for w in &report.data_warnings {
                output.push_str(&format!(
                    "  {}: low {} is above high {}\n",
                    w.date, w.low, w.high
                ));
            }
        }

        let b = &report.baseline;
        output.push_str("\nIf equity was held for the entire period:\n");
        output.push_str(&format!("  Initial price: {}\n", b.initial_price));
        output.push_str(&format!("    Final price: {}\n", b.final_price));
        output.push_str(&format!("       %-change: {}\n", format_percent(b.percent_change)));
        output.push_str(&format!("  Final balance: {}\n", format_money(b.final_balance)));

        output.push_str(&format!(
            "\nStrategy final balance: {} ({} buy-and-hold)\n",
            format_money(report.final_balance),
            if report.beats_baseline() { "beats" } else { "trails" }
        ));
        Ok(output)
    }
}

fn format_day(day: &DayTrace) -> String {
    let mut s = format!("{}:\n", day.date);
    s.push_str(&format!("  beginning   = {}\n", day.status_before));
    s.push_str(&format!("  dayHigh     = {}\n", day.day_high));
    s.push_str(&format!("  dayLow      = {}\n", day.day_low));
    s.push_str(&format!("  rolling_hi  = {}\n", day.bounds.rolling_hi));
    s.push_str(&format!("  rolling_lo  = {}\n", day.bounds.rolling_lo));
    s.push_str(&format!("  target_buy  = {}\n", day.bounds.target_buy));
    if let Some(event) = &day.event {
        s.push_str(&format!("* {}\n", event));
    }
    s.push_str(&format!("  ending      = {}\n", day.status_after));
    s.push_str(RULE);
    s
}

fn format_investment(s: &InvestmentSummary, entry: &LedgerEntry) -> String {
    let mut out = format!("#{}\n", s.number);
    out.push_str(&format!("Initial: {}\n", format_money(entry.balance_before)));
    out.push_str(&format!("Status: {}\n", s.status));
    out.push_str(&format!(
        "    Target buy price was {}\n",
        format_money(s.target_buy)
    ));

    match (s.buy_type, s.buy_date) {
        (Some(buy_type), Some(date)) => out.push_str(&format!(
            "    {} on {} at {}\n",
            buy_type,
            date,
            format_money(s.buy_price)
        )),
        _ => out.push_str("    NO PURCHASE MADE\n"),
    }

    match s.set_date {
        Some(date) => out.push_str(&format!(
            "    Set on {} at {}\n",
            date,
            format_money(s.set_price)
        )),
        None => out.push_str("    EQUITY WAS NEVER SET\n"),
    }

    if s.status == InvestmentStatus::Completed {
        if let Some(date) = s.sell_date {
            out.push_str(&format!(
                "    Sold on {} at {}\n",
                date,
                format_money(s.sell_price)
            ));
        }
    } else {
        out.push_str("    NOT SOLD\n");
    }

    out.push_str(&format!("    Period = {} days\n", s.days_held));
    out.push_str(&format!("    ROI = {}\n", format_percent(s.roi)));
    out.push_str(&format!("    APR = {}\n", format_percent(s.apr)));
    out.push_str(&format!("Change: {}\n", format_money(entry.change)));
    out.push_str(&format!("Final:  {}\n", format_money(entry.balance_after)));
    out.push_str(RULE);
    out
}

fn truncate(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).trunc() / scale
}

/// `$1234.56`, truncated toward zero.
pub fn format_money(value: f64) -> String {
    let v = truncate(value, 2);
    if v < 0.0 {
        format!("-${:.2}", -v)
    } else {
        format!("${:.2}", v.abs())
    }
}

/// Fraction as a percentage: `0.123456` -> `12.345%`, truncated toward zero.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.3}%", truncate(fraction * 100.0, 3))
}
