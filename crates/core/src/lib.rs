//! Core types, provider capability traits, and configuration shared by the
//! wheel strategy advisor crates.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod polling;
pub mod provider_types;
pub mod traits;
pub mod types;

pub use config::{AppConfig, BrokerConfig, PollingConfig, SnapshotConfig};
pub use config_loader::ConfigLoader;
pub use error::{Result, WheelError};
pub use polling::{poll_until, PollPolicy, Sleeper, TokioSleeper};
pub use provider_types::{
    AccountValue, ChainRow, ChainSnapshot, ContractSpec, MarketDataType, ModelGreeks,
    OptionChainParams, PortfolioItem, SecType, SnapshotInfo, TickerSnapshot,
};
pub use traits::{BrokerProvider, SnapshotProvider};
pub use types::{
    usable_price, AccountSummary, OptionContract, OptionGreeks, OptionRight, OptionSelection,
    Portfolio, Position, PositionProvenance, Quote, QuoteSource, Recommendation, WheelAction,
    CONTRACT_MULTIPLIER,
};
