//! Fundamental snapshot for a single security.
//!
//! Providers hand back partial, sometimes non-numeric data. Every field is
//! coerced to a safe default at the boundary so downstream formulas never see
//! NaN; beta defaults to 1.0 (market beta) rather than 0.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fundamentals {
    pub price: f64,
    pub previous_close: f64,
    pub market_cap: f64,
    pub pe_ratio: f64,
    pub pb_ratio: f64,
    pub eps: f64,
    /// Return on equity as a percentage (e.g. 18.5 for 18.5%).
    pub roe: f64,
    pub beta: f64,
    /// Dividend yield as a percentage.
    pub dividend_yield: f64,
    pub high_52w: f64,
    pub low_52w: f64,
}

impl Default for Fundamentals {
    fn default() -> Self {
        Self {
            price: 0.0,
            previous_close: 0.0,
            market_cap: 0.0,
            pe_ratio: 0.0,
            pb_ratio: 0.0,
            eps: 0.0,
            roe: 0.0,
            beta: 1.0,
            dividend_yield: 0.0,
            high_52w: 0.0,
            low_52w: 0.0,
        }
    }
}

impl Fundamentals {
    /// Position of the current price inside the 52-week range, in percent.
    /// Degenerate ranges answer 50 (mid-range).
    pub fn range_position_52w(&self) -> f64 {
        if self.high_52w > self.low_52w {
            (self.price - self.low_52w) / (self.high_52w - self.low_52w) * 100.0
        } else {
            50.0
        }
    }
}

/// Coerce an optional, possibly-NaN value to a safe default.
pub fn safe_f64(val: Option<f64>, default: f64) -> f64 {
    match val {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}
