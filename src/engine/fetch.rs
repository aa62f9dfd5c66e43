//! Fetch orchestrator: store-first per-symbol fetches with exchange
//! suffix fallback, and pooled whole-universe batches.

use crate::adapters::sqlite_price_store::SqlitePriceStore;
use crate::cache::ScanCache;
use crate::domain::error::EquiscoreError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::price::{PricePoint, TrailingReturns};
use crate::domain::scoring::ScoredStock;
use crate::domain::timeframe::Timeframe;
use crate::engine::pool;
use crate::engine::progress::ProgressTracker;
use crate::ports::config_port::ConfigPort;
use crate::ports::provider_port::{MarketDataPort, ProviderBar};
use chrono::{Duration as ChronoDuration, Local};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fewer stored points than this and a non-stale symbol is refetched
/// anyway; the window is too thin to score.
pub const MIN_STORED_POINTS: usize = 5;

const PROGRESS_EVERY: usize = 10;

/// Price series plus trailing returns for one symbol.
#[derive(Debug, Clone)]
pub struct SymbolData {
    pub symbol: String,
    pub points: Vec<PricePoint>,
    pub returns: TrailingReturns,
}

impl SymbolData {
    pub fn new(symbol: &str, points: Vec<PricePoint>) -> Self {
        let returns = TrailingReturns::from_points(&points);
        Self {
            symbol: symbol.to_owned(),
            points,
            returns,
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}

/// Batch fetch output, keyed by plain (unsuffixed) symbol.
pub type SeriesMap = HashMap<String, SymbolData>;

/// Per-timeframe slots shared between the fetch and scoring stages.
pub type TimeframeCache = ScanCache<SeriesMap, Vec<ScoredStock>>;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub workers: usize,
    pub max_age_hours: i64,
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub primary_suffix: String,
    pub secondary_suffix: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            workers: 15,
            max_age_hours: 6,
            chunk_size: 20,
            chunk_delay: Duration::from_millis(500),
            primary_suffix: ".NS".into(),
            secondary_suffix: ".BO".into(),
        }
    }
}

impl FetchSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        Self {
            workers: config.get_int("fetch", "workers", defaults.workers as i64) as usize,
            max_age_hours: config.get_int("fetch", "max_age_hours", defaults.max_age_hours),
            chunk_size: config.get_int("fetch", "chunk_size", defaults.chunk_size as i64) as usize,
            chunk_delay: Duration::from_millis(
                config.get_int("fetch", "chunk_delay_ms", 500).max(0) as u64,
            ),
            primary_suffix: config
                .get_string("provider", "primary_suffix")
                .unwrap_or(defaults.primary_suffix),
            secondary_suffix: config
                .get_string("provider", "secondary_suffix")
                .unwrap_or(defaults.secondary_suffix),
        }
    }
}

/// Store-first market-data access. Remote fetches go through the
/// provider port with primary/secondary exchange suffix fallback and are
/// written through to the price store; a failing provider degrades to
/// whatever the store already holds.
pub struct FetchOrchestrator<P> {
    store: SqlitePriceStore,
    provider: P,
    settings: FetchSettings,
    cache: Arc<TimeframeCache>,
}

impl<P: MarketDataPort + Sync> FetchOrchestrator<P> {
    pub fn new(
        store: SqlitePriceStore,
        provider: P,
        settings: FetchSettings,
        cache: Arc<TimeframeCache>,
    ) -> Self {
        Self {
            store,
            provider,
            settings,
            cache,
        }
    }

    pub fn store(&self) -> &SqlitePriceStore {
        &self.store
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Price series for one symbol over the timeframe's lookback window.
    ///
    /// Fresh-enough stored data with at least [`MIN_STORED_POINTS`] rows
    /// is served directly. Otherwise the provider is asked and the reply
    /// written through; if the provider fails, stored data of any age is
    /// better than nothing.
    pub fn fetch_symbol(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<SymbolData, EquiscoreError> {
        let today = Local::now().date_naive();
        let start = today - ChronoDuration::days(timeframe.lookback_days());

        if !self.store.is_stale(symbol, self.settings.max_age_hours)? {
            let stored = self.store.stored_prices(symbol, start, today)?;
            if stored.len() >= MIN_STORED_POINTS {
                debug!(symbol, points = stored.len(), "serving stored prices");
                return Ok(SymbolData::new(symbol, stored));
            }
        }

        match self.fetch_remote(symbol, timeframe.lookback_days()) {
            Ok(points) => {
                self.store.store_prices(symbol, &points)?;
                // The provider over-fetches; trim back to the window
                let window: Vec<PricePoint> =
                    points.iter().filter(|p| p.date >= start).cloned().collect();
                let kept = if window.is_empty() { points } else { window };
                Ok(SymbolData::new(symbol, kept))
            }
            Err(err) => {
                warn!(symbol, error = %err, "remote fetch failed, trying stored data");
                let stored = self.store.stored_prices(symbol, start, today)?;
                if stored.is_empty() {
                    Err(EquiscoreError::NoData {
                        symbol: symbol.to_owned(),
                    })
                } else {
                    Ok(SymbolData::new(symbol, stored))
                }
            }
        }
    }

    fn fetch_remote(&self, symbol: &str, lookback_days: i64) -> Result<Vec<PricePoint>, EquiscoreError> {
        let listings = [
            format!("{symbol}{}", self.settings.primary_suffix),
            format!("{symbol}{}", self.settings.secondary_suffix),
        ];

        let mut last_err = EquiscoreError::NoData {
            symbol: symbol.to_owned(),
        };
        for listing in &listings {
            match self.provider.fetch_history(listing, lookback_days) {
                Ok(bars) if !bars.is_empty() => return Ok(to_points(symbol, bars)),
                Ok(_) => {
                    last_err = EquiscoreError::NoData {
                        symbol: symbol.to_owned(),
                    };
                }
                Err(err) => {
                    debug!(listing, error = %err, "listing fetch failed");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    /// Fundamentals with the same suffix fallback as price history.
    pub fn fetch_fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, EquiscoreError> {
        let primary = format!("{symbol}{}", self.settings.primary_suffix);
        match self.provider.fetch_fundamentals(&primary) {
            Ok(Some(fundamentals)) => return Ok(Some(fundamentals)),
            Ok(None) => {}
            Err(err) => debug!(symbol, error = %err, "primary fundamentals fetch failed"),
        }
        let secondary = format!("{symbol}{}", self.settings.secondary_suffix);
        self.provider.fetch_fundamentals(&secondary)
    }

    /// Fetch every symbol through the worker pool, in chunks with an
    /// inter-chunk delay. Failing symbols are logged and skipped; the
    /// survivors land in the per-timeframe cache.
    pub fn fetch_batch(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        progress: &ProgressTracker,
    ) -> SeriesMap {
        if let Some(cached) = self.cache.series(timeframe) {
            debug!(%timeframe, stocks = cached.len(), "serving cached series");
            return cached;
        }

        progress.begin(
            symbols.len(),
            format!("fetching {} symbols ({timeframe})", symbols.len()),
            Some(timeframe),
        );
        let completed = AtomicUsize::new(0);

        let results = pool::map_chunked(
            symbols.to_vec(),
            self.settings.workers,
            self.settings.chunk_size,
            self.settings.chunk_delay,
            |symbol| {
                let outcome = self.fetch_symbol(&symbol, timeframe);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if done % PROGRESS_EVERY == 0 {
                    progress.update(done);
                }
                match outcome {
                    Ok(data) => Some((symbol, data)),
                    Err(err) => {
                        warn!(symbol, error = %err, "skipping symbol");
                        progress.log(format!("{symbol}: {err}"));
                        None
                    }
                }
            },
        );

        let series: SeriesMap = results.into_iter().flatten().collect();
        progress.finish(format!(
            "fetched {} of {} symbols",
            series.len(),
            symbols.len()
        ));
        self.cache.store_series(timeframe, series.clone());
        series
    }
}

fn to_points(symbol: &str, bars: Vec<ProviderBar>) -> Vec<PricePoint> {
    bars.into_iter()
        .map(|bar| PricePoint {
            symbol: symbol.to_owned(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
        .collect()
}
