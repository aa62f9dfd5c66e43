//! Market-data provider port trait.

use crate::domain::error::EquiscoreError;
use crate::domain::fundamentals::Fundamentals;
use chrono::NaiveDate;

/// One bar as a provider hands it back, before it is tied to a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Remote market-data source. `listing` is the fully suffixed exchange
/// symbol (e.g. `INFY.NS`); suffix fallback is the caller's concern.
pub trait MarketDataPort {
    fn fetch_history(
        &self,
        listing: &str,
        lookback_days: i64,
    ) -> Result<Vec<ProviderBar>, EquiscoreError>;

    fn fetch_fundamentals(&self, listing: &str) -> Result<Option<Fundamentals>, EquiscoreError>;
}
