//! Pipeline orchestration: bounded worker pools, batch fetching, the
//! scoring pipeline and background tasks.

pub mod pool;
pub mod progress;
pub mod fetch;
pub mod analyzer;
pub mod tasks;

pub use analyzer::{Analyzer, CacheReport, StockAnalysis};
pub use fetch::{FetchOrchestrator, FetchSettings, SeriesMap, SymbolData, TimeframeCache};
pub use progress::{Phase, ProgressSnapshot, ProgressTracker};
pub use tasks::{spawn_prefetch, spawn_snapshot, spawn_task, TaskHandle};
