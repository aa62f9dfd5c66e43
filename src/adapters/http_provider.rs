//! Yahoo Finance HTTP provider over the unofficial chart and
//! quoteSummary endpoints.

use crate::domain::error::EquiscoreError;
use crate::domain::fundamentals::{safe_f64, Fundamentals};
use crate::ports::config_port::ConfigPort;
use crate::ports::provider_port::{MarketDataPort, ProviderBar};
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

pub struct HttpMarketDataAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpMarketDataAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EquiscoreError> {
        let base_url = config
            .get_string("provider", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = config.get_int("provider", "timeout_secs", 10) as u64;
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: String, timeout: Duration) -> Result<Self, EquiscoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; equiscore)")
            .build()
            .map_err(|e| EquiscoreError::Provider {
                symbol: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    fn get_body(&self, url: &str, symbol: &str) -> Result<String, EquiscoreError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| EquiscoreError::Provider {
                symbol: symbol.to_owned(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EquiscoreError::Provider {
                symbol: symbol.to_owned(),
                reason: format!("upstream returned status {status}"),
            });
        }

        response.text().map_err(|e| EquiscoreError::Provider {
            symbol: symbol.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Map a lookback window onto Yahoo's coarse range parameter, always
/// over-fetching so the store fills in beyond the requested window.
fn range_for_lookback(lookback_days: i64) -> &'static str {
    if lookback_days > 365 {
        "2y"
    } else if lookback_days > 180 {
        "1y"
    } else {
        "6mo"
    }
}

impl MarketDataPort for HttpMarketDataAdapter {
    fn fetch_history(
        &self,
        listing: &str,
        lookback_days: i64,
    ) -> Result<Vec<ProviderBar>, EquiscoreError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url,
            listing,
            range_for_lookback(lookback_days)
        );
        debug!(listing, url, "fetching price history");
        let body = self.get_body(&url, listing)?;
        parse_chart_body(&body, listing)
    }

    fn fetch_fundamentals(&self, listing: &str) -> Result<Option<Fundamentals>, EquiscoreError> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=price,summaryDetail,financialData,defaultKeyStatistics",
            self.base_url, listing
        );
        debug!(listing, url, "fetching fundamentals");
        let body = self.get_body(&url, listing)?;
        parse_summary_body(&body, listing)
    }
}

pub(crate) fn parse_chart_body(
    body: &str,
    symbol: &str,
) -> Result<Vec<ProviderBar>, EquiscoreError> {
    let parsed: ChartResponse =
        serde_json::from_str(body).map_err(|e| EquiscoreError::Provider {
            symbol: symbol.to_owned(),
            reason: format!("malformed chart response: {e}"),
        })?;

    if let Some(error) = parsed.chart.error {
        return Err(EquiscoreError::Provider {
            symbol: symbol.to_owned(),
            reason: error.description,
        });
    }

    let result = parsed
        .chart
        .result
        .into_iter()
        .next()
        .ok_or_else(|| EquiscoreError::NoData {
            symbol: symbol.to_owned(),
        })?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| EquiscoreError::NoData {
            symbol: symbol.to_owned(),
        })?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        // Rows with any missing OHLC value are holidays or half-days
        // upstream marks with nulls; skip them.
        let (open, high, low, close) = match (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        ) {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => continue,
        };
        let date = match DateTime::from_timestamp(ts, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        bars.push(ProviderBar {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    if bars.is_empty() {
        return Err(EquiscoreError::NoData {
            symbol: symbol.to_owned(),
        });
    }
    Ok(bars)
}

pub(crate) fn parse_summary_body(
    body: &str,
    symbol: &str,
) -> Result<Option<Fundamentals>, EquiscoreError> {
    let parsed: SummaryResponse =
        serde_json::from_str(body).map_err(|e| EquiscoreError::Provider {
            symbol: symbol.to_owned(),
            reason: format!("malformed quoteSummary response: {e}"),
        })?;

    if let Some(error) = parsed.quote_summary.error {
        return Err(EquiscoreError::Provider {
            symbol: symbol.to_owned(),
            reason: error.description,
        });
    }

    let result = match parsed.quote_summary.result.into_iter().next() {
        Some(r) => r,
        None => return Ok(None),
    };

    let price_mod = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();

    let prev_close_raw = detail.previous_close.and_then(|v| v.raw);
    let price = safe_f64(
        price_mod
            .regular_market_price
            .and_then(|v| v.raw)
            .or(financial.current_price.and_then(|v| v.raw))
            .or(prev_close_raw),
        0.0,
    );
    let previous_close = safe_f64(prev_close_raw, price);

    Ok(Some(Fundamentals {
        price,
        previous_close,
        market_cap: safe_f64(
            price_mod
                .market_cap
                .and_then(|v| v.raw)
                .or(detail.market_cap.and_then(|v| v.raw)),
            0.0,
        ),
        pe_ratio: safe_f64(detail.trailing_pe.and_then(|v| v.raw), 0.0),
        pb_ratio: safe_f64(stats.price_to_book.and_then(|v| v.raw), 0.0),
        eps: safe_f64(stats.trailing_eps.and_then(|v| v.raw), 0.0),
        roe: safe_f64(financial.return_on_equity.and_then(|v| v.raw), 0.0) * 100.0,
        beta: safe_f64(stats.beta.and_then(|v| v.raw), 1.0),
        dividend_yield: safe_f64(detail.dividend_yield.and_then(|v| v.raw), 0.0) * 100.0,
        high_52w: safe_f64(detail.fifty_two_week_high.and_then(|v| v.raw), 0.0),
        low_52w: safe_f64(detail.fifty_two_week_low.and_then(|v| v.raw), 0.0),
    }))
}

// Upstream wire shapes. Numeric fields arrive wrapped in {raw, fmt}
// objects; only raw matters here.

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Vec<ChartResult>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryData,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(default)]
    result: Vec<SummaryResult>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(rename = "summaryDetail", default)]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(rename = "financialData", default)]
    financial_data: Option<FinancialDataModule>,
    #[serde(rename = "defaultKeyStatistics", default)]
    default_key_statistics: Option<KeyStatisticsModule>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<RawValue>,
    #[serde(rename = "marketCap", default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetailModule {
    #[serde(rename = "previousClose", default)]
    previous_close: Option<RawValue>,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "dividendYield", default)]
    dividend_yield: Option<RawValue>,
    #[serde(rename = "fiftyTwoWeekHigh", default)]
    fifty_two_week_high: Option<RawValue>,
    #[serde(rename = "fiftyTwoWeekLow", default)]
    fifty_two_week_low: Option<RawValue>,
    #[serde(rename = "marketCap", default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct FinancialDataModule {
    #[serde(rename = "currentPrice", default)]
    current_price: Option<RawValue>,
    #[serde(rename = "returnOnEquity", default)]
    return_on_equity: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatisticsModule {
    #[serde(rename = "trailingEps", default)]
    trailing_eps: Option<RawValue>,
    #[serde(rename = "priceToBook", default)]
    price_to_book: Option<RawValue>,
    #[serde(default)]
    beta: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}
