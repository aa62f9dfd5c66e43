//! Simple and exponential moving averages.
//!
//! SMA is a trailing arithmetic mean with a full warm-up window; rows before
//! the window have no value. EMA uses smoothing k = 2/(n+1) and is seeded with
//! the first close, so it is defined from the first row onward.

/// Trailing SMA. Rows with fewer than `period` observations behind them are
/// `None`.
pub fn sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut out = Vec::with_capacity(closes.len());
    let mut sum = 0.0;

    for (i, &close) in closes.iter().enumerate() {
        sum += close;
        if i >= period {
            sum -= closes[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }

    out
}

/// EMA seeded with the first value: ema[0] = c[0], then
/// ema[i] = c[i]*k + ema[i-1]*(1-k) with k = 2/(period+1).
pub fn ema(closes: &[f64], period: usize) -> Vec<f64> {
    if closes.is_empty() || period == 0 {
        return closes.to_vec();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(closes.len());
    let mut prev = closes[0];
    out.push(prev);

    for &close in &closes[1..] {
        prev = close * k + prev * (1.0 - k);
        out.push(prev);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_warmup_is_none() {
        let out = sma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_relative_eq!(out[2].unwrap(), 20.0);
        assert_relative_eq!(out[3].unwrap(), 30.0);
    }

    #[test]
    fn sma_window_longer_than_series() {
        let out = sma(&[10.0, 20.0], 5);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn sma_period_one_is_identity() {
        let out = sma(&[10.0, 20.0, 30.0], 1);
        assert_relative_eq!(out[0].unwrap(), 10.0);
        assert_relative_eq!(out[2].unwrap(), 30.0);
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let out = ema(&[10.0, 20.0, 30.0], 3);
        assert_relative_eq!(out[0], 10.0);

        let k = 2.0 / 4.0;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        assert_relative_eq!(out[1], e1);
        assert_relative_eq!(out[2], 30.0 * k + e1 * (1.0 - k));
    }

    #[test]
    fn ema_constant_series_is_flat() {
        let out = ema(&[100.0; 10], 5);
        for v in out {
            assert_relative_eq!(v, 100.0);
        }
    }

    #[test]
    fn ema_empty() {
        assert!(ema(&[], 9).is_empty());
    }
}
