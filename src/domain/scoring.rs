//! Composite scoring: four technical sub-scores blended with the
//! valuation view, an action classifier and ranked summaries.

use crate::domain::fundamentals::Fundamentals;
use crate::domain::indicator::signals::Bias;
use crate::domain::indicator::IndicatorFrame;
use crate::domain::price::TrailingReturns;
use crate::domain::valuation::{
    DcfValuation, HurdleRate, MarketCapCategory, TargetPrices, ValuationBand,
};
use serde::Serialize;

/// Weighted trailing returns normalized to 0-100. Short histories fall
/// back to the 5-bar return on a tighter band; under five bars there is
/// nothing to measure and the score is neutral.
pub fn momentum_score(closes: &[f64], returns: &TrailingReturns) -> f64 {
    if closes.len() < 5 {
        return 50.0;
    }
    if closes.len() < 20 {
        let base = closes[closes.len() - 5];
        if base <= 0.0 {
            return 50.0;
        }
        let short_return = (closes[closes.len() - 1] - base) / base * 100.0;
        return ((short_return + 10.0) / 20.0 * 100.0).clamp(0.0, 100.0);
    }

    let weighted = returns.r1w * 0.5 + returns.r1m * 0.3 + returns.r3m * 0.2;
    ((weighted + 20.0) / 40.0 * 100.0).clamp(0.0, 100.0)
}

/// Point system over the latest row: RSI band, MACD posture, price vs
/// SMA20/50, and Bollinger %B position. Fewer than 10 rows is neutral.
pub fn technical_score(frame: &IndicatorFrame) -> f64 {
    if frame.len() < 10 {
        return 50.0;
    }
    let latest = match frame.latest() {
        Some(row) => row,
        None => return 50.0,
    };

    let mut score: f64 = 0.0;

    score += match latest.rsi {
        r if (30.0..=50.0).contains(&r) => 25.0,
        r if r > 50.0 && r <= 70.0 => 15.0,
        r if r < 30.0 => 20.0,
        _ => 5.0,
    };

    score += if latest.macd > latest.macd_signal {
        25.0
    } else {
        10.0
    };

    if latest.sma_20.is_some_and(|s| s > 0.0 && latest.close > s) {
        score += 15.0;
    }
    if latest.sma_50.is_some_and(|s| s > 0.0 && latest.close > s) {
        score += 15.0;
    }

    score += match latest.bb_percent {
        Some(pb) if (0.2..=0.5).contains(&pb) => 20.0,
        Some(pb) if pb > 0.5 && pb <= 0.8 => 10.0,
        _ => 5.0,
    };

    score.min(100.0)
}

/// Average volume ratio over the last ten rows, shifted off a neutral 50.
pub fn volume_score(frame: &IndicatorFrame) -> f64 {
    if frame.len() < 5 {
        return 50.0;
    }

    let mut score: f64 = 50.0;
    let rows = frame.rows();
    let tail = &rows[rows.len().saturating_sub(10)..];
    let ratios: Vec<f64> = tail.iter().filter_map(|row| row.volume_ratio).collect();

    if !ratios.is_empty() {
        let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
        if avg > 1.5 {
            score += 25.0;
        } else if avg > 1.2 {
            score += 15.0;
        } else if avg < 0.7 {
            score -= 15.0;
        }
    }

    score.clamp(0.0, 100.0)
}

/// Window-wide drift plus the SMA20-vs-SMA50 posture, off a neutral 50.
pub fn trend_score(frame: &IndicatorFrame) -> f64 {
    if frame.len() < 5 {
        return 50.0;
    }
    let rows = frame.rows();
    let (first, latest) = (&rows[0], &rows[rows.len() - 1]);
    if first.close <= 0.0 {
        return 50.0;
    }

    let mut score: f64 = 50.0;
    let trend = (latest.close - first.close) / first.close * 100.0;

    if trend > 5.0 {
        score += 20.0;
    } else if trend > 2.0 {
        score += 10.0;
    } else if trend < -5.0 {
        score -= 20.0;
    } else if trend < -2.0 {
        score -= 10.0;
    }

    if let (Some(s20), Some(s50)) = (latest.sma_20, latest.sma_50) {
        if s20 > 0.0 && s50 > 0.0 {
            if s20 > s50 {
                score += 15.0;
            } else {
                score -= 10.0;
            }
        }
    }

    score.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreBreakdown {
    pub composite: f64,
    pub momentum: f64,
    pub technical: f64,
    pub volume: f64,
    pub trend: f64,
    pub valuation: f64,
    pub pe_score: f64,
}

impl ScoreBreakdown {
    /// Blend: 25% momentum, 30% technical, 15% volume, 15% trend, 15%
    /// split evenly between valuation status and PE score.
    pub fn blend(
        momentum: f64,
        technical: f64,
        volume: f64,
        trend: f64,
        valuation: f64,
        pe_score: f64,
    ) -> Self {
        let composite = momentum * 0.25
            + technical * 0.30
            + volume * 0.15
            + trend * 0.15
            + (valuation + pe_score) / 2.0 * 0.15;
        ScoreBreakdown {
            composite,
            momentum,
            technical,
            volume,
            trend,
            valuation,
            pe_score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

impl Action {
    pub fn is_buy(self) -> bool {
        matches!(self, Action::StrongBuy | Action::Buy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, Action::StrongSell | Action::Sell)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::StrongBuy => "STRONG BUY",
            Action::Buy => "BUY",
            Action::Hold => "HOLD",
            Action::Sell => "SELL",
            Action::StrongSell => "STRONG SELL",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub action: Action,
    pub confidence: f64,
    pub dcf_margin: f64,
    pub upside_pct: f64,
    pub risk_reward: f64,
    pub buy_target: f64,
    pub sell_target: f64,
}

/// Classify the composite score into an action, letting a wide DCF
/// margin of safety promote borderline scores.
pub fn recommend(
    composite: f64,
    dcf_margin: f64,
    targets: Option<&TargetPrices>,
) -> Recommendation {
    let (action, confidence) = if composite >= 70.0 && dcf_margin > 20.0 {
        (Action::StrongBuy, composite.min(95.0))
    } else if composite >= 60.0 || (composite >= 50.0 && dcf_margin > 15.0) {
        (Action::Buy, composite)
    } else if composite >= 45.0 {
        (Action::Hold, 50.0)
    } else if composite >= 35.0 {
        (Action::Sell, 100.0 - composite)
    } else {
        (Action::StrongSell, (100.0 - composite).min(95.0))
    };

    Recommendation {
        action,
        confidence,
        dcf_margin,
        upside_pct: targets.map_or(0.0, |t| t.upside_conservative_pct),
        risk_reward: targets.map_or(0.0, |t| t.risk_reward_ratio),
        buy_target: targets.map_or(0.0, |t| t.buy_conservative),
        sell_target: targets.map_or(0.0, |t| t.sell_conservative),
    }
}

/// Everything a scan emits for one stock.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredStock {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub price: f64,
    pub change_percent: f64,
    pub scores: ScoreBreakdown,
    pub returns: TrailingReturns,
    pub rsi: f64,
    pub macd_bias: Bias,
    pub valuation_status: ValuationBand,
    pub market_cap_category: MarketCapCategory,
    pub market_cap: f64,
    pub fundamentals: Fundamentals,
    pub dcf: DcfValuation,
    pub hurdle: HurdleRate,
    pub targets: Option<TargetPrices>,
    pub recommendation: Recommendation,
    /// 1-based position after sorting by composite, 0 before ranking.
    pub rank: usize,
}

/// Sort by composite score descending and assign 1-based ranks.
pub fn rank_stocks(stocks: &mut [ScoredStock]) {
    stocks.sort_by(|a, b| {
        b.scores
            .composite
            .partial_cmp(&a.scores.composite)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, stock) in stocks.iter_mut().enumerate() {
        stock.rank = i + 1;
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ActionCounts {
    pub strong_buy: usize,
    pub buy: usize,
    pub hold: usize,
    pub sell: usize,
    pub strong_sell: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSummary {
    pub summary: ActionCounts,
    pub top_picks: Vec<ScoredStock>,
    pub avoid_list: Vec<ScoredStock>,
}

/// Histogram of actions plus the five most confident buys and sells.
pub fn recommendation_summary(stocks: &[ScoredStock]) -> RecommendationSummary {
    let mut counts = ActionCounts {
        total: stocks.len(),
        ..ActionCounts::default()
    };
    for stock in stocks {
        match stock.recommendation.action {
            Action::StrongBuy => counts.strong_buy += 1,
            Action::Buy => counts.buy += 1,
            Action::Hold => counts.hold += 1,
            Action::Sell => counts.sell += 1,
            Action::StrongSell => counts.strong_sell += 1,
        }
    }

    let by_confidence = |filter: fn(Action) -> bool| -> Vec<ScoredStock> {
        let mut picked: Vec<ScoredStock> = stocks
            .iter()
            .filter(|s| filter(s.recommendation.action))
            .cloned()
            .collect();
        picked.sort_by(|a, b| {
            b.recommendation
                .confidence
                .partial_cmp(&a.recommendation.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        picked.truncate(5);
        picked
    };

    RecommendationSummary {
        summary: counts,
        top_picks: by_confidence(Action::is_buy),
        avoid_list: by_confidence(Action::is_sell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

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
    fn momentum_neutral_below_five_points() {
        let returns = TrailingReturns::default();
        assert_relative_eq!(momentum_score(&[100.0, 101.0], &returns), 50.0);
    }

    #[test]
    fn momentum_short_history_uses_five_bar_return() {
        // 100 -> 105 over the last 5 bars: (5 + 10) / 20 * 100 = 75
        let closes = [98.0, 99.0, 100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        let returns = TrailingReturns::default();
        assert_relative_eq!(momentum_score(&closes, &returns), 75.0, epsilon = 1e-9);
    }

    #[test]
    fn momentum_weighted_returns() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let returns = TrailingReturns {
            r1w: 4.0,
            r1m: 10.0,
            r3m: 20.0,
        };
        // weighted = 2 + 3 + 4 = 9 -> (9 + 20) / 40 * 100 = 72.5
        assert_relative_eq!(momentum_score(&closes, &returns), 72.5, epsilon = 1e-9);
    }

    #[test]
    fn technical_neutral_when_thin() {
        let frame = IndicatorFrame::compute(&make_points(&[100.0; 5]));
        assert_relative_eq!(technical_score(&frame), 50.0);
    }

    #[test]
    fn technical_rewards_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.005_f64.powi(i)).collect();
        let frame = IndicatorFrame::compute(&make_points(&closes));
        // Steady rise: MACD above signal and price above both SMAs
        assert!(technical_score(&frame) >= 55.0);
    }

    #[test]
    fn trend_score_penalizes_decline() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let frame = IndicatorFrame::compute(&make_points(&closes));
        let score = trend_score(&frame);
        assert!(score < 50.0, "declining series scored {score}");
    }

    #[test]
    fn blend_weights_sum_to_one() {
        let b = ScoreBreakdown::blend(100.0, 100.0, 100.0, 100.0, 100.0, 100.0);
        assert_relative_eq!(b.composite, 100.0, epsilon = 1e-9);
        let b = ScoreBreakdown::blend(50.0, 50.0, 50.0, 50.0, 50.0, 50.0);
        assert_relative_eq!(b.composite, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn classifier_bands() {
        assert_eq!(recommend(75.0, 25.0, None).action, Action::StrongBuy);
        assert_relative_eq!(recommend(98.0, 25.0, None).confidence, 95.0);
        // High score but thin margin stays a plain BUY
        assert_eq!(recommend(75.0, 5.0, None).action, Action::Buy);
        assert_eq!(recommend(62.0, 0.0, None).action, Action::Buy);
        // Decent score promoted by a wide margin
        assert_eq!(recommend(52.0, 18.0, None).action, Action::Buy);
        assert_eq!(recommend(52.0, 5.0, None).action, Action::Hold);
        assert_relative_eq!(recommend(52.0, 5.0, None).confidence, 50.0);
        assert_eq!(recommend(40.0, 0.0, None).action, Action::Sell);
        assert_relative_eq!(recommend(40.0, 0.0, None).confidence, 60.0);
        assert_eq!(recommend(20.0, 0.0, None).action, Action::StrongSell);
        assert_relative_eq!(recommend(1.0, 0.0, None).confidence, 95.0);
    }

    #[test]
    fn ranking_is_descending_one_based() {
        let mut stocks = vec![
            stub_scored("A", 60.0),
            stub_scored("B", 95.0),
            stub_scored("C", 80.0),
        ];
        rank_stocks(&mut stocks);
        let order: Vec<(&str, usize)> = stocks
            .iter()
            .map(|s| (s.symbol.as_str(), s.rank))
            .collect();
        assert_eq!(order, vec![("B", 1), ("C", 2), ("A", 3)]);
    }

    #[test]
    fn summary_counts_and_picks() {
        let mut stocks = vec![
            stub_scored("A", 75.0),
            stub_scored("B", 62.0),
            stub_scored("C", 50.0),
            stub_scored("D", 38.0),
            stub_scored("E", 20.0),
        ];
        rank_stocks(&mut stocks);
        let summary = recommendation_summary(&stocks);
        assert_eq!(summary.summary.total, 5);
        assert_eq!(summary.summary.buy, 2); // 75 has no DCF margin, lands on BUY
        assert_eq!(summary.summary.hold, 1);
        assert_eq!(summary.summary.sell, 1);
        assert_eq!(summary.summary.strong_sell, 1);
        assert_eq!(summary.top_picks.len(), 2);
        assert_eq!(summary.avoid_list.len(), 2);
        // Most confident sell first: STRONG SELL at 20 has confidence 80
        assert_eq!(summary.avoid_list[0].symbol, "E");
    }

    proptest! {
        #[test]
        fn sub_scores_stay_in_range(closes in proptest::collection::vec(1.0f64..5000.0, 1..120)) {
            let points = make_points(&closes);
            let frame = IndicatorFrame::compute(&points);
            let returns = TrailingReturns::from_closes(&closes);
            let m = momentum_score(&closes, &returns);
            let te = technical_score(&frame);
            let v = volume_score(&frame);
            let tr = trend_score(&frame);
            for score in [m, te, v, tr] {
                prop_assert!((0.0..=100.0).contains(&score));
            }
            let composite = ScoreBreakdown::blend(m, te, v, tr, 50.0, 50.0).composite;
            prop_assert!((0.0..=100.0).contains(&composite));
        }
    }

    fn stub_scored(symbol: &str, composite: f64) -> ScoredStock {
        let scores = ScoreBreakdown {
            composite,
            momentum: 50.0,
            technical: 50.0,
            volume: 50.0,
            trend: 50.0,
            valuation: 50.0,
            pe_score: 50.0,
        };
        let fundamentals = Fundamentals::default();
        let dcf = crate::domain::valuation::dcf_value(0.0, 0.10, 0.12);
        ScoredStock {
            symbol: symbol.into(),
            name: symbol.into(),
            sector: "General".into(),
            price: 100.0,
            change_percent: 0.0,
            scores,
            returns: TrailingReturns::default(),
            rsi: 50.0,
            macd_bias: Bias::Bearish,
            valuation_status: ValuationBand::FairValue,
            market_cap_category: MarketCapCategory::Unknown,
            market_cap: 0.0,
            fundamentals,
            dcf,
            hurdle: crate::domain::valuation::hurdle_rate(1.0),
            targets: None,
            recommendation: recommend(composite, 0.0, None),
            rank: 0,
        }
    }
}
