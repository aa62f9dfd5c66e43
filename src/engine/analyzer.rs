//! Scoring pipeline: per-symbol analysis and whole-universe scans on
//! top of the fetch orchestrator, with cache-aside result reuse.

use crate::adapters::sqlite_price_store::SqlitePriceStore;
use crate::cache::{CacheStats, ScanSlotStatus, TtlCache, SCAN_CACHE_VALIDITY};
use crate::domain::error::EquiscoreError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::indicator::signals::{signals, Bias, SignalSummary};
use crate::domain::indicator::IndicatorFrame;
use crate::domain::price::PricePoint;
use crate::domain::scoring::{
    momentum_score, rank_stocks, recommend, recommendation_summary, technical_score, trend_score,
    volume_score, RecommendationSummary, ScoreBreakdown, ScoredStock,
};
use crate::domain::screen::ScreenFilter;
use crate::domain::timeframe::Timeframe;
use crate::domain::universe::StockUniverse;
use crate::domain::valuation::{evaluate, ValuationResult};
use crate::engine::fetch::{FetchOrchestrator, FetchSettings, SymbolData, TimeframeCache};
use crate::engine::progress::ProgressTracker;
use crate::ports::config_port::ConfigPort;
use crate::ports::provider_port::MarketDataPort;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const RESULT_CACHE_SIZE: usize = 512;
const FUNDAMENTALS_TTL: Duration = Duration::from_secs(3600);

/// Everything the analyze operation emits for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct StockAnalysis {
    pub stock: ScoredStock,
    pub signals: Option<SignalSummary>,
    pub points: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub results: CacheStats,
    pub scan: Vec<ScanSlotStatus>,
}

pub struct Analyzer<P> {
    fetcher: FetchOrchestrator<P>,
    universe: StockUniverse,
    scan_cache: Arc<TimeframeCache>,
    results: TtlCache<StockAnalysis>,
    fundamentals: TtlCache<Fundamentals>,
}

impl<P: MarketDataPort + Sync> Analyzer<P> {
    pub fn new(store: SqlitePriceStore, provider: P, config: &dyn ConfigPort) -> Self {
        let result_ttl = Duration::from_secs(config.get_int("cache", "ttl_seconds", 300).max(1) as u64);
        let scan_cache = Arc::new(TimeframeCache::new(SCAN_CACHE_VALIDITY));
        let settings = FetchSettings::from_config(config);
        Self {
            fetcher: FetchOrchestrator::new(store, provider, settings, Arc::clone(&scan_cache)),
            universe: StockUniverse,
            scan_cache,
            results: TtlCache::new(RESULT_CACHE_SIZE, result_ttl),
            fundamentals: TtlCache::new(RESULT_CACHE_SIZE, FUNDAMENTALS_TTL),
        }
    }

    pub fn store(&self) -> &SqlitePriceStore {
        self.fetcher.store()
    }

    pub fn universe(&self) -> &StockUniverse {
        &self.universe
    }

    /// Full analysis for one symbol: fetch, indicators, valuation, score
    /// and signal summary. Results are cached per symbol and timeframe.
    pub fn analyze_symbol(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<StockAnalysis, EquiscoreError> {
        let key = format!("analyze:{symbol}:{timeframe}");
        if let Some(hit) = self.results.get(&key) {
            return Ok(hit);
        }

        let data = self.fetcher.fetch_symbol(symbol, timeframe)?;
        let frame = IndicatorFrame::compute(&data.points);
        let analysis = StockAnalysis {
            stock: self.score_symbol(&data, &frame),
            signals: signals(&frame),
            points: data.points.len(),
        };
        self.results.set(&key, analysis.clone());
        Ok(analysis)
    }

    /// Score every universe symbol for a timeframe, ranked best first.
    /// Symbols without data are skipped; a valid cached scan is served
    /// without touching the provider.
    pub fn scan(&self, timeframe: Timeframe, progress: &ProgressTracker) -> Vec<ScoredStock> {
        if let Some(cached) = self.scan_cache.scored(timeframe) {
            debug!(%timeframe, stocks = cached.len(), "serving cached scan");
            return cached;
        }

        let symbols = self.universe.symbols();
        let series = self.fetcher.fetch_batch(&symbols, timeframe, progress);

        let mut stocks: Vec<ScoredStock> = symbols
            .iter()
            .filter_map(|symbol| {
                let data = series.get(symbol)?;
                if data.points.is_empty() {
                    return None;
                }
                let frame = IndicatorFrame::compute(&data.points);
                Some(self.score_symbol(data, &frame))
            })
            .collect();

        rank_stocks(&mut stocks);
        info!(%timeframe, scored = stocks.len(), of = symbols.len(), "scan complete");
        self.scan_cache.store_scored(timeframe, stocks.clone());
        stocks
    }

    /// Scan, then summarize: action histogram plus the most confident
    /// buys and sells.
    pub fn recommendations(
        &self,
        timeframe: Timeframe,
        progress: &ProgressTracker,
    ) -> RecommendationSummary {
        recommendation_summary(&self.scan(timeframe, progress))
    }

    /// Scan, then keep only stocks passing the filter, in rank order.
    pub fn screen(
        &self,
        filter: &ScreenFilter,
        timeframe: Timeframe,
        progress: &ProgressTracker,
    ) -> Vec<ScoredStock> {
        filter.apply(&self.scan(timeframe, progress))
    }

    /// Drop every cached result mentioning the symbol, plus the scan
    /// slots they fed into. Answers how many per-symbol entries fell.
    pub fn invalidate_symbol(&self, symbol: &str) -> usize {
        let dropped =
            self.results.invalidate_pattern(symbol) + self.fundamentals.invalidate_pattern(symbol);
        self.scan_cache.clear();
        dropped
    }

    pub fn cache_report(&self) -> CacheReport {
        CacheReport {
            results: self.results.stats(),
            scan: self.scan_cache.status(),
        }
    }

    fn score_symbol(&self, data: &SymbolData, frame: &IndicatorFrame) -> ScoredStock {
        let symbol = data.symbol.as_str();
        let fundamentals = self.fundamentals_for(symbol, &data.points);
        let sector = self.universe.sector_of(symbol);

        let ValuationResult {
            valuation,
            market_cap_category,
            market_cap,
            pe_score,
            dcf,
            hurdle,
            targets,
        } = evaluate(&fundamentals, sector, frame);

        let closes = data.closes();
        let scores = ScoreBreakdown::blend(
            momentum_score(&closes, &data.returns),
            technical_score(frame),
            volume_score(frame),
            trend_score(frame),
            valuation.score,
            pe_score,
        );

        let latest = frame.latest();
        let rsi = latest.map_or(50.0, |row| row.rsi);
        let macd_bias = latest.map_or(Bias::Bearish, |row| {
            if row.macd > row.macd_signal {
                Bias::Bullish
            } else {
                Bias::Bearish
            }
        });

        let change_percent = if fundamentals.previous_close > 0.0 {
            (fundamentals.price - fundamentals.previous_close) / fundamentals.previous_close * 100.0
        } else {
            0.0
        };

        let dcf_margin = dcf.margin_of_safety.unwrap_or(0.0);
        let recommendation = recommend(scores.composite, dcf_margin, targets.as_ref());

        ScoredStock {
            symbol: symbol.to_owned(),
            name: self.universe.name_of(symbol).to_owned(),
            sector: sector.to_owned(),
            price: fundamentals.price,
            change_percent,
            scores,
            returns: data.returns,
            rsi,
            macd_bias,
            valuation_status: valuation.status,
            market_cap_category,
            market_cap,
            fundamentals,
            dcf,
            hurdle,
            targets,
            recommendation,
            rank: 0,
        }
    }

    /// Cached fundamentals lookup. A provider that cannot answer costs
    /// the valuation its inputs but never the analysis: price falls back
    /// to the latest close.
    fn fundamentals_for(&self, symbol: &str, points: &[PricePoint]) -> Fundamentals {
        let key = format!("fundamentals:{symbol}");
        let fetched = self.fundamentals.get_or_compute(&key, || {
            match self.fetcher.fetch_fundamentals(symbol) {
                Ok(found) => found,
                Err(err) => {
                    debug!(symbol, error = %err, "fundamentals unavailable");
                    None
                }
            }
        });

        let mut fundamentals = fetched.unwrap_or_default();
        if fundamentals.price <= 0.0 {
            if let Some(last) = points.last() {
                fundamentals.price = last.close;
            }
        }
        if fundamentals.previous_close <= 0.0 && points.len() >= 2 {
            fundamentals.previous_close = points[points.len() - 2].close;
        }
        fundamentals
    }
}
