//! Command-line surface. Every command loads the INI config, runs one
//! pipeline operation and prints JSON to stdout; diagnostics go to
//! stderr through the tracing subscriber.

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::http_provider::HttpMarketDataAdapter;
use crate::adapters::sqlite_price_store::SqlitePriceStore;
use crate::adapters::sqlite_snapshot_store::SqliteSnapshotStore;
use crate::domain::error::EquiscoreError;
use crate::domain::indicator::signals::Bias;
use crate::domain::screen::ScreenFilter;
use crate::domain::timeframe::Timeframe;
use crate::domain::valuation::ValuationBand;
use crate::engine::{self, Analyzer, ProgressTracker};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Parser)]
#[command(
    name = "equiscore",
    about = "Ranked, explainable investment scores for an equity universe",
    version
)]
pub struct Cli {
    /// INI configuration file.
    #[arg(long, global = true, default_value = "equiscore.ini")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full analysis for one symbol.
    Analyze {
        #[arg(long)]
        symbol: String,
        #[arg(long, value_enum, default_value_t = Timeframe::Daily)]
        timeframe: Timeframe,
    },
    /// Score and rank the whole universe.
    Scan {
        #[arg(long, value_enum, default_value_t = Timeframe::Daily)]
        timeframe: Timeframe,
        /// Emit only the N best-ranked stocks.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Scan, then keep only stocks passing every given filter.
    Screen {
        #[arg(long, value_enum, default_value_t = Timeframe::Daily)]
        timeframe: Timeframe,
        #[arg(long)]
        min_score: Option<f64>,
        #[arg(long)]
        min_rsi: Option<f64>,
        #[arg(long)]
        max_rsi: Option<f64>,
        /// May repeat; a stock passes on any match.
        #[arg(long = "sector")]
        sectors: Vec<String>,
        /// bullish or bearish.
        #[arg(long, value_parser = parse_bias)]
        macd: Option<Bias>,
        /// undervalued, slightly-undervalued, fair, slightly-overvalued
        /// or overvalued.
        #[arg(long, value_parser = parse_band)]
        valuation: Option<ValuationBand>,
        #[arg(long)]
        min_upside: Option<f64>,
        #[arg(long)]
        max_pe: Option<f64>,
    },
    /// Recorded recommendations, newest first.
    History {
        #[arg(long, default_value_t = 30)]
        days: i64,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Realized returns of the recommendations made N days ago.
    Returns {
        #[arg(long)]
        days: i64,
    },
    /// Scan and record today's snapshot for later return tracking.
    Snapshot {
        #[arg(long, value_enum, default_value_t = Timeframe::Daily)]
        timeframe: Timeframe,
    },
    /// Warm every timeframe end to end; a pipeline smoke run.
    Prefetch,
    /// Store, cache and tracking statistics.
    Stats,
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "command failed");
            ExitCode::from(&err)
        }
    }
}

fn execute(cli: Cli) -> Result<(), EquiscoreError> {
    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Analyze { symbol, timeframe } => {
            let analyzer = build_analyzer(&config)?;
            let analysis = analyzer.analyze_symbol(&symbol.to_uppercase(), timeframe)?;
            print_json(&analysis)
        }
        Command::Scan { timeframe, top } => {
            let analyzer = build_analyzer(&config)?;
            let progress = ProgressTracker::new();
            let mut stocks = analyzer.scan(timeframe, &progress);
            let recommendations = crate::domain::scoring::recommendation_summary(&stocks);
            let scored = stocks.len();
            if let Some(n) = top {
                stocks.truncate(n);
            }
            print_json(&json!({
                "timeframe": timeframe,
                "scored": scored,
                "recommendations": recommendations,
                "stocks": stocks,
            }))
        }
        Command::Screen {
            timeframe,
            min_score,
            min_rsi,
            max_rsi,
            sectors,
            macd,
            valuation,
            min_upside,
            max_pe,
        } => {
            let filter = ScreenFilter {
                min_score,
                min_rsi,
                max_rsi,
                sectors: if sectors.is_empty() {
                    None
                } else {
                    Some(sectors)
                },
                macd_bias: macd,
                valuation_status: valuation,
                min_upside,
                max_pe,
            };
            let analyzer = build_analyzer(&config)?;
            let progress = ProgressTracker::new();
            let passed = analyzer.screen(&filter, timeframe, &progress);
            print_json(&json!({
                "timeframe": timeframe,
                "matched": passed.len(),
                "stocks": passed,
            }))
        }
        Command::History { days, symbol } => {
            let snapshots = SqliteSnapshotStore::from_config(&config)?;
            let today = Local::now().date_naive();
            let records = snapshots.history(days, symbol.as_deref(), today)?;
            print_json(&records)
        }
        Command::Returns { days } => {
            let snapshots = SqliteSnapshotStore::from_config(&config)?;
            let today = Local::now().date_naive();
            match snapshots.compute_returns(days, today)? {
                Some(report) => {
                    snapshots.save_run(&report)?;
                    print_json(&report)
                }
                None => print_json(&json!({
                    "status": "no data yet",
                    "days": days,
                })),
            }
        }
        Command::Snapshot { timeframe } => {
            let analyzer = Arc::new(build_analyzer(&config)?);
            let snapshots = Arc::new(SqliteSnapshotStore::from_config(&config)?);
            let handle = engine::spawn_snapshot(analyzer, snapshots, timeframe)?;
            let recorded = handle
                .join()
                .ok_or_else(|| EquiscoreError::Io(std::io::Error::other("snapshot task panicked")))??;
            print_json(&json!({
                "timeframe": timeframe,
                "recorded": recorded,
            }))
        }
        Command::Prefetch => {
            let analyzer = Arc::new(build_analyzer(&config)?);
            let handle = engine::spawn_prefetch(analyzer)?;
            let counts = handle
                .join()
                .ok_or_else(|| EquiscoreError::Io(std::io::Error::other("prefetch task panicked")))?;
            let passes: Vec<_> = counts
                .iter()
                .map(|(timeframe, scored)| json!({ "timeframe": timeframe, "scored": scored }))
                .collect();
            print_json(&passes)
        }
        Command::Stats => {
            let analyzer = build_analyzer(&config)?;
            let snapshots = SqliteSnapshotStore::from_config(&config)?;
            print_json(&json!({
                "store": analyzer.store().stats()?,
                "tracking": snapshots.tracking_stats()?,
                "cache": analyzer.cache_report(),
            }))
        }
    }
}

fn load_config(path: &Path) -> Result<FileConfigAdapter, EquiscoreError> {
    if path.exists() {
        FileConfigAdapter::from_file(path)
    } else {
        debug!(path = %path.display(), "config file not found, using defaults");
        Ok(FileConfigAdapter::empty())
    }
}

fn build_analyzer(
    config: &FileConfigAdapter,
) -> Result<Analyzer<HttpMarketDataAdapter>, EquiscoreError> {
    let store = SqlitePriceStore::from_config(config)?;
    let provider = HttpMarketDataAdapter::from_config(config)?;
    Ok(Analyzer::new(store, provider, config))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), EquiscoreError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| EquiscoreError::Io(e.into()))?;
    println!("{rendered}");
    Ok(())
}

fn parse_bias(input: &str) -> Result<Bias, String> {
    match input.to_lowercase().as_str() {
        "bullish" => Ok(Bias::Bullish),
        "bearish" => Ok(Bias::Bearish),
        other => Err(format!("unknown MACD bias: {other}")),
    }
}

fn parse_band(input: &str) -> Result<ValuationBand, String> {
    match input.to_lowercase().as_str() {
        "undervalued" => Ok(ValuationBand::Undervalued),
        "slightly-undervalued" => Ok(ValuationBand::SlightlyUndervalued),
        "fair" | "fair-value" => Ok(ValuationBand::FairValue),
        "slightly-overvalued" => Ok(ValuationBand::SlightlyOvervalued),
        "overvalued" => Ok(ValuationBand::Overvalued),
        other => Err(format!("unknown valuation band: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_analyze() {
        let cli = Cli::try_parse_from(["equiscore", "analyze", "--symbol", "infy"]).unwrap();
        match cli.command {
            Command::Analyze { symbol, timeframe } => {
                assert_eq!(symbol, "infy");
                assert_eq!(timeframe, Timeframe::Daily);
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn cli_parses_screen_filters() {
        let cli = Cli::try_parse_from([
            "equiscore",
            "screen",
            "--timeframe",
            "weekly",
            "--min-score",
            "60",
            "--sector",
            "IT",
            "--sector",
            "Banking",
            "--macd",
            "bullish",
            "--valuation",
            "undervalued",
        ])
        .unwrap();
        match cli.command {
            Command::Screen {
                timeframe,
                min_score,
                sectors,
                macd,
                valuation,
                ..
            } => {
                assert_eq!(timeframe, Timeframe::Weekly);
                assert_eq!(min_score, Some(60.0));
                assert_eq!(sectors, vec!["IT", "Banking"]);
                assert_eq!(macd, Some(Bias::Bullish));
                assert_eq!(valuation, Some(ValuationBand::Undervalued));
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_bad_bias() {
        assert!(Cli::try_parse_from(["equiscore", "screen", "--macd", "sideways"]).is_err());
    }

    #[test]
    fn cli_global_config_flag() {
        let cli =
            Cli::try_parse_from(["equiscore", "stats", "--config", "/tmp/alt.ini"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/alt.ini"));
    }

    #[test]
    fn band_parser_accepts_hyphenated_names() {
        assert_eq!(
            parse_band("Slightly-Undervalued"),
            Ok(ValuationBand::SlightlyUndervalued)
        );
        assert!(parse_band("cheap").is_err());
    }
}
