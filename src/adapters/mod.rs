//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod http_provider;
pub mod sqlite_price_store;
pub mod sqlite_snapshot_store;
