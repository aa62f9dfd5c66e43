//! Technical indicator engine.
//!
//! [`IndicatorFrame::compute`] is a pure transform from an ordered
//! (oldest-to-newest) price series to per-date rows carrying the original
//! OHLCV plus every derived column. Columns with a warm-up window are `None`
//! before the window is full; RSI is the documented exception and fills with
//! the neutral 50 instead.

pub mod moving_average;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod atr;
pub mod volume;
pub mod momentum;
pub mod signals;

use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULT: f64 = 2.0;
pub const VOLUME_PERIOD: usize = 20;

#[derive(Debug, Clone)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,

    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,

    // EMAs are seeded with the first close and defined on every row
    pub ema_9: f64,
    pub ema_12: f64,
    pub ema_21: f64,
    pub ema_26: f64,
    pub ema_50: f64,

    pub rsi: f64,

    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,

    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_percent: Option<f64>,

    pub atr: Option<f64>,

    pub volume_sma: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub obv: f64,

    pub roc_5: Option<f64>,
    pub roc_10: Option<f64>,
    pub roc_20: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn compute(points: &[PricePoint]) -> Self {
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        let volumes: Vec<i64> = points.iter().map(|p| p.volume).collect();

        let sma_20 = moving_average::sma(&closes, 20);
        let sma_50 = moving_average::sma(&closes, 50);
        let sma_200 = moving_average::sma(&closes, 200);

        let ema_9 = moving_average::ema(&closes, 9);
        let ema_12 = moving_average::ema(&closes, 12);
        let ema_21 = moving_average::ema(&closes, 21);
        let ema_26 = moving_average::ema(&closes, 26);
        let ema_50 = moving_average::ema(&closes, 50);

        let rsi = rsi::rsi(&closes, RSI_PERIOD);
        let macd = macd::macd(&closes, 12, 26, 9);
        let bollinger = bollinger::bollinger(&closes, BOLLINGER_PERIOD, BOLLINGER_MULT);
        let atr = atr::atr(points, ATR_PERIOD);
        let volume = volume::volume_analysis(&closes, &volumes, VOLUME_PERIOD);

        let roc_5 = momentum::roc(&closes, 5);
        let roc_10 = momentum::roc(&closes, 10);
        let roc_20 = momentum::roc(&closes, 20);

        let rows = points
            .iter()
            .enumerate()
            .map(|(i, p)| IndicatorRow {
                date: p.date,
                open: p.open,
                high: p.high,
                low: p.low,
                close: p.close,
                volume: p.volume,
                sma_20: sma_20[i],
                sma_50: sma_50[i],
                sma_200: sma_200[i],
                ema_9: ema_9[i],
                ema_12: ema_12[i],
                ema_21: ema_21[i],
                ema_26: ema_26[i],
                ema_50: ema_50[i],
                rsi: rsi[i],
                macd: macd.line[i],
                macd_signal: macd.signal[i],
                macd_histogram: macd.histogram[i],
                bb_upper: bollinger.upper[i],
                bb_middle: bollinger.middle[i],
                bb_lower: bollinger.lower[i],
                bb_percent: bollinger.percent_b[i],
                atr: atr[i],
                volume_sma: volume.volume_sma[i],
                volume_ratio: volume.volume_ratio[i],
                obv: volume.obv[i],
                roc_5: roc_5[i],
                roc_10: roc_10[i],
                roc_20: roc_20[i],
            })
            .collect();

        Self { rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// Row before the latest, used for crossover detection.
    pub fn previous(&self) -> Option<&IndicatorRow> {
        self.rows.len().checked_sub(2).map(|i| &self.rows[i])
    }

    pub fn high_52w(&self) -> Option<f64> {
        self.rows.iter().map(|r| r.high).fold(None, |acc, h| {
            Some(acc.map_or(h, |a: f64| a.max(h)))
        })
    }

    pub fn low_52w(&self) -> Option<f64> {
        self.rows.iter().map(|r| r.low).fold(None, |acc, l| {
            Some(acc.map_or(l, |a: f64| a.min(l)))
        })
    }
}
