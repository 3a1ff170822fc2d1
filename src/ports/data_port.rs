//! Price history access port trait.

use crate::domain::error::MarketSimError;
use crate::domain::price_record::PriceRecord;

pub trait PriceDataPort {
    /// Full daily history for `symbol`, sorted ascending by date.
    fn fetch_records(&self, symbol: &str) -> Result<Vec<PriceRecord>, MarketSimError>;

    fn list_symbols(&self) -> Result<Vec<String>, MarketSimError>;
}
