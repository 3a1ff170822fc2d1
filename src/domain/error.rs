//! Domain error types.

/// A price row that could not be turned into a [`PriceRecord`](super::price_record::PriceRecord).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("row {row}: invalid {field}: {reason}")]
pub struct RecordParseError {
    /// 1-based row number in the source.
    pub row: usize,
    pub field: String,
    pub reason: String,
}

/// Top-level error type for market_sim.
#[derive(Debug, thiserror::Error)]
pub enum MarketSimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error(transparent)]
    RecordParse(#[from] RecordParseError),

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error(
        "span exceeds available history for {symbol}: {records} records from {first_date}, \
         none after {sim_start_date}"
    )]
    InsufficientHistory {
        symbol: String,
        first_date: chrono::NaiveDate,
        sim_start_date: chrono::NaiveDate,
        records: usize,
    },

    #[error("cannot annualize investment bought and sold on {buy_date}: zero days held")]
    ZeroHoldingPeriod {
        buy_date: chrono::NaiveDate,
        sell_date: chrono::NaiveDate,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MarketSimError> for std::process::ExitCode {
    fn from(err: &MarketSimError) -> Self {
        let code: u8 = match err {
            MarketSimError::Io(_) => 1,
            MarketSimError::ConfigParse { .. }
            | MarketSimError::ConfigMissing { .. }
            | MarketSimError::ConfigInvalid { .. } => 2,
            MarketSimError::DataSource { .. } | MarketSimError::RecordParse(_) => 3,
            MarketSimError::NoData { .. } | MarketSimError::InsufficientHistory { .. } => 5,
            MarketSimError::ZeroHoldingPeriod { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
