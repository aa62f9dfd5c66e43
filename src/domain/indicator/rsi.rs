//! RSI from simple rolling means of gains and losses.
//!
//! Deliberately not Wilder's recursive smoothing: average gain and average
//! loss are plain rolling means over the last `period` price deltas. This
//! deviation from the textbook definition is inherited behavior and must not
//! be "corrected".
//!
//! RS = avg_gain / avg_loss; avg_loss of 0 makes RS undefined (not infinite).
//! Any undefined RSI — warm-up rows included — answers the neutral 50.

pub const NEUTRAL_RSI: f64 = 50.0;

pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    if period == 0 || n < 2 {
        return vec![NEUTRAL_RSI; n];
    }

    let mut gains = Vec::with_capacity(n - 1);
    let mut losses = Vec::with_capacity(n - 1);
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        // Row i has deltas gains[..i]; the window needs `period` of them.
        if i < period {
            out.push(NEUTRAL_RSI);
            continue;
        }

        let window = (i - period)..i;
        let avg_gain: f64 = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[window].iter().sum::<f64>() / period as f64;

        if avg_loss == 0.0 {
            out.push(NEUTRAL_RSI);
        } else {
            let rs = avg_gain / avg_loss;
            out.push(100.0 - 100.0 / (1.0 + rs));
        }
    }

    out
}
