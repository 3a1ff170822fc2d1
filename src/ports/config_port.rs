//! Configuration access port trait.

use crate::domain::error::MarketSimError;

/// Section/key lookups over a parameter source.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Non-empty, trimmed string or [`MarketSimError::ConfigMissing`].
    fn require_string(&self, section: &str, key: &str) -> Result<String, MarketSimError> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| MarketSimError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}
