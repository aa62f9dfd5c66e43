//! Human-readable signal summary for the latest row of an indicator frame.

use super::{IndicatorFrame, IndicatorRow};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RsiZone {
    Oversold,
    Overbought,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bias {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Crossover {
    #[serde(rename = "Golden Cross")]
    Golden,
    #[serde(rename = "Death Cross")]
    Death,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    #[serde(rename = "Strong Uptrend")]
    StrongUptrend,
    #[serde(rename = "Strong Downtrend")]
    StrongDowntrend,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BandPosition {
    #[serde(rename = "Near Upper")]
    NearUpper,
    #[serde(rename = "Near Lower")]
    NearLower,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolumeLevel {
    High,
    Low,
    Normal,
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crossover::Golden => f.write_str("Golden Cross"),
            Crossover::Death => f.write_str("Death Cross"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalSummary {
    pub rsi_value: f64,
    pub rsi_zone: RsiZone,

    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub macd_bias: Bias,

    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub price_above_sma_20: Option<bool>,
    pub price_above_sma_50: Option<bool>,
    pub price_above_sma_200: Option<bool>,
    /// SMA20-vs-SMA50 ordering flip between the prior and latest rows.
    pub crossover: Option<Crossover>,
    pub trend: Trend,

    pub bb_percent: Option<f64>,
    pub band_position: BandPosition,

    pub volume: i64,
    pub volume_avg: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub volume_level: VolumeLevel,

    pub roc_5: Option<f64>,
    pub roc_10: Option<f64>,

    pub atr: Option<f64>,
    pub atr_percent: Option<f64>,
}

/// Categorize the latest row. Needs at least two rows for crossover
/// detection; shorter frames have no summary.
pub fn signals(frame: &IndicatorFrame) -> Option<SignalSummary> {
    let latest = frame.latest()?;
    let prev = frame.previous()?;

    let rsi_zone = if latest.rsi < 30.0 {
        RsiZone::Oversold
    } else if latest.rsi > 70.0 {
        RsiZone::Overbought
    } else {
        RsiZone::Neutral
    };

    let macd_bias = if latest.macd > latest.macd_signal {
        Bias::Bullish
    } else {
        Bias::Bearish
    };

    let crossover = detect_crossover(prev, latest);
    let trend = classify_trend(latest);

    let band_position = match latest.bb_percent {
        Some(pb) if pb > 0.8 => BandPosition::NearUpper,
        Some(pb) if pb < 0.2 => BandPosition::NearLower,
        _ => BandPosition::Middle,
    };

    let volume_level = match latest.volume_ratio {
        Some(r) if r > 1.5 => VolumeLevel::High,
        Some(r) if r < 0.5 => VolumeLevel::Low,
        _ => VolumeLevel::Normal,
    };

    let atr_percent = latest.atr.and_then(|a| {
        if latest.close > 0.0 {
            Some(a / latest.close * 100.0)
        } else {
            None
        }
    });

    Some(SignalSummary {
        rsi_value: latest.rsi,
        rsi_zone,
        macd: latest.macd,
        macd_signal: latest.macd_signal,
        macd_histogram: latest.macd_histogram,
        macd_bias,
        sma_20: latest.sma_20,
        sma_50: latest.sma_50,
        sma_200: latest.sma_200,
        price_above_sma_20: latest.sma_20.map(|s| latest.close > s),
        price_above_sma_50: latest.sma_50.map(|s| latest.close > s),
        price_above_sma_200: latest.sma_200.map(|s| latest.close > s),
        crossover,
        trend,
        bb_percent: latest.bb_percent,
        band_position,
        volume: latest.volume,
        volume_avg: latest.volume_sma,
        volume_ratio: latest.volume_ratio,
        volume_level,
        roc_5: latest.roc_5,
        roc_10: latest.roc_10,
        atr: latest.atr,
        atr_percent,
    })
}

fn detect_crossover(prev: &IndicatorRow, latest: &IndicatorRow) -> Option<Crossover> {
    let (p20, p50) = (prev.sma_20?, prev.sma_50?);
    let (l20, l50) = (latest.sma_20?, latest.sma_50?);

    if p20 <= p50 && l20 > l50 {
        Some(Crossover::Golden)
    } else if p20 >= p50 && l20 < l50 {
        Some(Crossover::Death)
    } else {
        None
    }
}

fn classify_trend(row: &IndicatorRow) -> Trend {
    match (row.sma_20, row.sma_50, row.sma_200) {
        (Some(s20), Some(s50), Some(s200)) if s20 > s50 && s50 > s200 => Trend::StrongUptrend,
        (Some(s20), Some(s50), Some(s200)) if s20 < s50 && s50 < s200 => Trend::StrongDowntrend,
        _ => Trend::Mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use chrono::NaiveDate;

    fn make_points(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                symbol: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn too_short_for_signals() {
        let frame = IndicatorFrame::compute(&make_points(&[100.0]));
        assert!(signals(&frame).is_none());
    }

    #[test]
    fn macd_bias_follows_trend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let frame = IndicatorFrame::compute(&make_points(&closes));
        let summary = signals(&frame).unwrap();
        assert_eq!(summary.macd_bias, Bias::Bullish);
    }

    #[test]
    fn golden_cross_on_ordering_flip() {
        let prev = row_with_smas(Some(99.0), Some(100.0));
        let latest = row_with_smas(Some(101.0), Some(100.0));
        assert_eq!(detect_crossover(&prev, &latest), Some(Crossover::Golden));
        assert_eq!(detect_crossover(&latest, &prev), Some(Crossover::Death));
        assert_eq!(detect_crossover(&latest, &latest), None);
    }

    #[test]
    fn crossover_needs_both_smas() {
        let missing = row_with_smas(None, Some(100.0));
        let full = row_with_smas(Some(101.0), Some(100.0));
        assert_eq!(detect_crossover(&missing, &full), None);
    }

    #[test]
    fn trend_requires_full_stack() {
        let frame = IndicatorFrame::compute(&make_points(&[100.0, 101.0, 102.0]));
        let summary = signals(&frame).unwrap();
        // No SMA200 with 3 points; stacking cannot be established
        assert_eq!(summary.trend, Trend::Mixed);
    }

    fn row_with_smas(sma_20: Option<f64>, sma_50: Option<f64>) -> IndicatorRow {
        IndicatorRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1000,
            sma_20,
            sma_50,
            sma_200: None,
            ema_9: 100.0,
            ema_12: 100.0,
            ema_21: 100.0,
            ema_26: 100.0,
            ema_50: 100.0,
            rsi: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
            bb_percent: None,
            atr: None,
            volume_sma: None,
            volume_ratio: None,
            obv: 0.0,
            roc_5: None,
            roc_10: None,
            roc_20: None,
        }
    }
}
