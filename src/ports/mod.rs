//! Port traits decoupling the engine from config and market-data
//! providers.

pub mod config_port;
pub mod provider_port;

pub use config_port::ConfigPort;
pub use provider_port::{MarketDataPort, ProviderBar};
