//! Rate-of-change momentum over fixed period offsets, in percent.

pub fn roc(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        if period == 0 || i < period || closes[i - period] == 0.0 {
            out.push(None);
        } else {
            let past = closes[i - period];
            out.push(Some((closes[i] - past) / past * 100.0));
        }
    }

    out
}
