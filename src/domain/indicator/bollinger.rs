//! Bollinger Bands: SMA(period) middle band with +/- mult * rolling sample
//! standard deviation, plus %B position within the bands.

use super::moving_average::sma;

#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub percent_b: Vec<Option<f64>>,
}

pub fn bollinger(closes: &[f64], period: usize, mult: f64) -> BollingerSeries {
    let n = closes.len();
    let middle = sma(closes, period);
    let std = rolling_std(closes, period);

    let mut upper = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut percent_b = Vec::with_capacity(n);

    for i in 0..n {
        match (middle[i], std[i]) {
            (Some(mid), Some(sd)) => {
                let up = mid + mult * sd;
                let lo = mid - mult * sd;
                upper.push(Some(up));
                lower.push(Some(lo));
                if up > lo {
                    percent_b.push(Some((closes[i] - lo) / (up - lo)));
                } else {
                    // Zero-width band (constant prices): position undefined
                    percent_b.push(None);
                }
            }
            _ => {
                upper.push(None);
                lower.push(None);
                percent_b.push(None);
            }
        }
    }

    BollingerSeries {
        upper,
        middle,
        lower,
        percent_b,
    }
}

/// Rolling sample standard deviation (n-1 denominator).
fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    if period < 2 {
        return vec![None; n];
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        if i + 1 < period {
            out.push(None);
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period as f64 - 1.0);
        out.push(Some(variance.sqrt()));
    }

    out
}
