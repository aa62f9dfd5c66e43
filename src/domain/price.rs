//! Daily OHLCV price points and trailing return calculations.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PricePoint {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Trailing percentage returns at calendar-trading-day offsets: 5 periods for
/// one week, 20 for one month, 60 for three months.
///
/// Short histories degrade rather than error:
/// - fewer than 5 points: all returns 0
/// - 5-19 points: the 1-month return falls back to the 1-week return
/// - 40-59 points: the 3-month return is approximated as 1.5x the 1-month
/// - otherwise below 60 points: the 3-month return equals the 1-month return
///
/// The 1.5x approximation is an inherited compatibility heuristic; keep it
/// bit-for-bit even though it has no analytical basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailingReturns {
    pub r1w: f64,
    pub r1m: f64,
    pub r3m: f64,
}

impl Default for TrailingReturns {
    fn default() -> Self {
        Self {
            r1w: 0.0,
            r1m: 0.0,
            r3m: 0.0,
        }
    }
}

impl TrailingReturns {
    pub fn from_closes(closes: &[f64]) -> Self {
        let n = closes.len();
        if n < 5 {
            return Self::default();
        }

        let latest = closes[n - 1];
        let pct = |past: f64| {
            if past != 0.0 {
                (latest - past) / past * 100.0
            } else {
                0.0
            }
        };

        let r1w = pct(closes[n - 5]);
        let r1m = if n >= 20 { pct(closes[n - 20]) } else { r1w };
        let r3m = if n >= 60 {
            pct(closes[n - 60])
        } else if n >= 40 {
            r1m * 1.5
        } else {
            r1m
        };

        Self { r1w, r1m, r3m }
    }

    pub fn from_points(points: &[PricePoint]) -> Self {
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        Self::from_closes(&closes)
    }
}
