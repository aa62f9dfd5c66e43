//! Core domain types and analysis logic.

pub mod error;
pub mod price;
pub mod fundamentals;
pub mod timeframe;
pub mod universe;
pub mod indicator;
pub mod valuation;
pub mod scoring;
pub mod screen;
