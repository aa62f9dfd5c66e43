//! Volume indicators: rolling volume mean, volume ratio, and On-Balance
//! Volume (cumulative volume signed by the close-to-close direction; a flat
//! day contributes 0).

#[derive(Debug, Clone)]
pub struct VolumeSeries {
    pub volume_sma: Vec<Option<f64>>,
    pub volume_ratio: Vec<Option<f64>>,
    pub obv: Vec<f64>,
}

pub fn volume_analysis(closes: &[f64], volumes: &[i64], period: usize) -> VolumeSeries {
    let n = closes.len().min(volumes.len());

    let mut volume_sma = Vec::with_capacity(n);
    let mut volume_ratio = Vec::with_capacity(n);
    let mut sum = 0.0;
    for i in 0..n {
        sum += volumes[i] as f64;
        if i >= period {
            sum -= volumes[i - period] as f64;
        }
        if period > 0 && i + 1 >= period {
            let mean = sum / period as f64;
            volume_sma.push(Some(mean));
            if mean > 0.0 {
                volume_ratio.push(Some(volumes[i] as f64 / mean));
            } else {
                volume_ratio.push(None);
            }
        } else {
            volume_sma.push(None);
            volume_ratio.push(None);
        }
    }

    let mut obv = Vec::with_capacity(n);
    let mut running = 0.0;
    for i in 0..n {
        if i > 0 {
            let delta = closes[i] - closes[i - 1];
            if delta > 0.0 {
                running += volumes[i] as f64;
            } else if delta < 0.0 {
                running -= volumes[i] as f64;
            }
        }
        obv.push(running);
    }

    VolumeSeries {
        volume_sma,
        volume_ratio,
        obv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn obv_accumulates_signed_volume() {
        let closes = [100.0, 101.0, 100.5, 100.5, 102.0];
        let volumes = [1000, 2000, 1500, 800, 1200];
        let out = volume_analysis(&closes, &volumes, 3);

        // up +2000, down -1500, flat 0, up +1200
        assert_relative_eq!(out.obv[0], 0.0);
        assert_relative_eq!(out.obv[1], 2000.0);
        assert_relative_eq!(out.obv[2], 500.0);
        assert_relative_eq!(out.obv[3], 500.0);
        assert_relative_eq!(out.obv[4], 1700.0);
    }

    #[test]
    fn ratio_against_rolling_mean() {
        let closes = [100.0; 4];
        let volumes = [1000, 1000, 1000, 3000];
        let out = volume_analysis(&closes, &volumes, 3);

        assert!(out.volume_ratio[1].is_none());
        assert_relative_eq!(out.volume_sma[3].unwrap(), 5000.0 / 3.0);
        assert_relative_eq!(out.volume_ratio[3].unwrap(), 3000.0 / (5000.0 / 3.0));
    }

    #[test]
    fn zero_volume_mean_has_no_ratio() {
        let closes = [100.0, 100.0, 100.0];
        let volumes = [0, 0, 0];
        let out = volume_analysis(&closes, &volumes, 3);
        assert!(out.volume_ratio[2].is_none());
    }
}
