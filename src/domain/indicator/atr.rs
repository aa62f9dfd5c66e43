//! ATR: rolling mean of the true range.
//!
//! True range = max(high - low, |high - prev_close|, |low - prev_close|).
//! The first row has no previous close, so its true range is high - low.
//! Plain rolling mean — no Wilder smoothing here.

use crate::domain::price::PricePoint;

pub fn atr(points: &[PricePoint], period: usize) -> Vec<Option<f64>> {
    let n = points.len();
    if period == 0 {
        return vec![None; n];
    }

    let mut tr = Vec::with_capacity(n);
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            tr.push(p.high - p.low);
        } else {
            tr.push(p.true_range(points[i - 1].close));
        }
    }

    let mut out = Vec::with_capacity(n);
    let mut sum = 0.0;
    for i in 0..n {
        sum += tr[i];
        if i >= period {
            sum -= tr[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }

    out
}
