//! equiscore — ranked, explainable investment scores for a fixed equity universe.
//!
//! Hexagonal architecture: pure analysis logic in [`domain`], trait seams in
//! [`ports`], concrete storage/provider implementations in [`adapters`],
//! pipeline orchestration in [`engine`], shared caching in [`cache`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod engine;
pub mod cache;
pub mod cli;
