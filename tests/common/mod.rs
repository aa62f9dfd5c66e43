#![allow(dead_code)]

use chrono::{Duration, Local, NaiveDate};
use equiscore::domain::error::EquiscoreError;
use equiscore::domain::fundamentals::Fundamentals;
use equiscore::domain::price::PricePoint;
use equiscore::ports::provider_port::{MarketDataPort, ProviderBar};
use std::collections::HashMap;

/// Canned market-data provider keyed by fully suffixed listing.
pub struct MockProvider {
    pub bars: HashMap<String, Vec<ProviderBar>>,
    pub fundamentals: HashMap<String, Fundamentals>,
    pub errors: HashMap<String, String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            fundamentals: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, listing: &str, closes: &[f64]) -> Self {
        self.bars.insert(listing.to_string(), recent_bars(closes));
        self
    }

    pub fn with_fundamentals(mut self, listing: &str, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(listing.to_string(), fundamentals);
        self
    }

    pub fn with_error(mut self, listing: &str, reason: &str) -> Self {
        self.errors.insert(listing.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockProvider {
    fn fetch_history(
        &self,
        listing: &str,
        _lookback_days: i64,
    ) -> Result<Vec<ProviderBar>, EquiscoreError> {
        if let Some(reason) = self.errors.get(listing) {
            return Err(EquiscoreError::Provider {
                symbol: listing.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.bars.get(listing).cloned().unwrap_or_default())
    }

    fn fetch_fundamentals(&self, listing: &str) -> Result<Option<Fundamentals>, EquiscoreError> {
        if let Some(reason) = self.errors.get(listing) {
            return Err(EquiscoreError::Provider {
                symbol: listing.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.fundamentals.get(listing).cloned())
    }
}

/// Bars ending today, one per calendar day.
pub fn recent_bars(closes: &[f64]) -> Vec<ProviderBar> {
    let today = Local::now().date_naive();
    let n = closes.len() as i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| ProviderBar {
            date: today - Duration::days(n - 1 - i as i64),
            open: close,
            high: close * 1.02,
            low: close * 0.98,
            close,
            volume: 100_000,
        })
        .collect()
}

pub fn make_point(symbol: &str, date: &str, close: f64) -> PricePoint {
    PricePoint {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close * 1.02,
        low: close * 0.98,
        close,
        volume: 100_000,
    }
}

/// Steady compounding uptrend.
pub fn rising_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 * 1.01_f64.powi(i as i32)).collect()
}

/// Steady compounding downtrend.
pub fn falling_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 * 0.99_f64.powi(i as i32)).collect()
}

pub fn sample_fundamentals(price: f64, eps: f64) -> Fundamentals {
    Fundamentals {
        price,
        previous_close: price * 0.99,
        market_cap: 250_000.0 * 1e7,
        pe_ratio: if eps > 0.0 { price / eps } else { 0.0 },
        pb_ratio: 3.0,
        eps,
        roe: 20.0,
        beta: 1.0,
        dividend_yield: 1.5,
        high_52w: price * 1.2,
        low_52w: price * 0.7,
    }
}
