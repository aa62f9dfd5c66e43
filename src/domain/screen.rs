//! Post-scan screening filters.

use crate::domain::indicator::signals::Bias;
use crate::domain::scoring::ScoredStock;
use crate::domain::valuation::ValuationBand;

/// Conjunction of optional filters applied to scored stocks. Unset
/// fields pass everything.
#[derive(Debug, Clone, Default)]
pub struct ScreenFilter {
    pub min_score: Option<f64>,
    pub min_rsi: Option<f64>,
    pub max_rsi: Option<f64>,
    pub sectors: Option<Vec<String>>,
    pub macd_bias: Option<Bias>,
    pub valuation_status: Option<ValuationBand>,
    pub min_upside: Option<f64>,
    pub max_pe: Option<f64>,
}

impl ScreenFilter {
    pub fn matches(&self, stock: &ScoredStock) -> bool {
        if self.min_score.is_some_and(|min| stock.scores.composite < min) {
            return false;
        }
        if self.min_rsi.is_some_and(|min| stock.rsi < min) {
            return false;
        }
        if self.max_rsi.is_some_and(|max| stock.rsi > max) {
            return false;
        }
        if let Some(sectors) = &self.sectors {
            if !sectors.iter().any(|s| s == &stock.sector) {
                return false;
            }
        }
        if self.macd_bias.is_some_and(|bias| stock.macd_bias != bias) {
            return false;
        }
        if self
            .valuation_status
            .is_some_and(|status| stock.valuation_status != status)
        {
            return false;
        }
        if self
            .min_upside
            .is_some_and(|min| stock.recommendation.upside_pct < min)
        {
            return false;
        }
        if self
            .max_pe
            .is_some_and(|max| stock.fundamentals.pe_ratio > max)
        {
            return false;
        }
        true
    }

    /// Apply the filter, preserving input (rank) order.
    pub fn apply(&self, stocks: &[ScoredStock]) -> Vec<ScoredStock> {
        stocks
            .iter()
            .filter(|s| self.matches(s))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fundamentals::Fundamentals;
    use crate::domain::price::TrailingReturns;
    use crate::domain::scoring::{recommend, ScoreBreakdown};
    use crate::domain::valuation::{hurdle_rate, dcf_value, MarketCapCategory};

    fn scored(symbol: &str, composite: f64, rsi: f64, sector: &str, pe: f64) -> ScoredStock {
        ScoredStock {
            symbol: symbol.into(),
            name: symbol.into(),
            sector: sector.into(),
            price: 100.0,
            change_percent: 0.0,
            scores: ScoreBreakdown {
                composite,
                momentum: 50.0,
                technical: 50.0,
                volume: 50.0,
                trend: 50.0,
                valuation: 50.0,
                pe_score: 50.0,
            },
            returns: TrailingReturns::default(),
            rsi,
            macd_bias: Bias::Bullish,
            valuation_status: ValuationBand::FairValue,
            market_cap_category: MarketCapCategory::Unknown,
            market_cap: 0.0,
            fundamentals: Fundamentals {
                pe_ratio: pe,
                ..Fundamentals::default()
            },
            dcf: dcf_value(0.0, 0.10, 0.12),
            hurdle: hurdle_rate(1.0),
            targets: None,
            recommendation: recommend(composite, 0.0, None),
            rank: 0,
        }
    }

    #[test]
    fn empty_filter_passes_everything() {
        let stocks = vec![scored("A", 70.0, 45.0, "IT", 22.0)];
        assert_eq!(ScreenFilter::default().apply(&stocks).len(), 1);
    }

    #[test]
    fn filters_compose_as_conjunction() {
        let stocks = vec![
            scored("A", 70.0, 45.0, "IT", 22.0),
            scored("B", 70.0, 85.0, "IT", 22.0),
            scored("C", 70.0, 45.0, "Banking", 12.0),
            scored("D", 40.0, 45.0, "IT", 22.0),
        ];
        let filter = ScreenFilter {
            min_score: Some(60.0),
            max_rsi: Some(70.0),
            sectors: Some(vec!["IT".into()]),
            ..ScreenFilter::default()
        };
        let hits = filter.apply(&stocks);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol, "A");
    }

    #[test]
    fn pe_and_bias_filters() {
        let stocks = vec![
            scored("A", 70.0, 45.0, "IT", 22.0),
            scored("B", 70.0, 45.0, "IT", 40.0),
        ];
        let filter = ScreenFilter {
            max_pe: Some(30.0),
            macd_bias: Some(Bias::Bullish),
            ..ScreenFilter::default()
        };
        assert_eq!(filter.apply(&stocks).len(), 1);

        let filter = ScreenFilter {
            macd_bias: Some(Bias::Bearish),
            ..ScreenFilter::default()
        };
        assert!(filter.apply(&stocks).is_empty());
    }
}
