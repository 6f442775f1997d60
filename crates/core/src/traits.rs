//! Capability interfaces of the two quote providers.
//!
//! The engine only ever talks to providers through these traits, so tests
//! substitute scripted fakes with no network.

use async_trait::async_trait;

use crate::error::Result;
use crate::provider_types::{
    AccountValue, ChainSnapshot, ContractSpec, MarketDataType, OptionChainParams, PortfolioItem,
    SecType, SnapshotInfo, TickerSnapshot,
};

/// Session-based broker: live or delayed market data, greeks, positions.
#[async_trait]
pub trait BrokerProvider: Send + Sync {
    /// Opens a session. `Ok(false)` means the gateway refused it.
    async fn connect(&self, host: &str, port: u16, client_id: i32, readonly: bool)
        -> Result<bool>;

    fn is_connected(&self) -> bool;

    async fn disconnect(&self);

    /// Resolves a contract specification. Empty means unresolvable.
    async fn qualify_contracts(&self, contract: &ContractSpec) -> Result<Vec<ContractSpec>>;

    async fn req_market_data_type(&self, mode: MarketDataType) -> Result<()>;

    /// Starts a market-data subscription on a qualified contract.
    async fn req_mkt_data(&self, contract: &ContractSpec, generic_ticks: &str) -> Result<()>;

    /// Reads the latest state of a subscription.
    async fn ticker(&self, contract: &ContractSpec) -> Result<TickerSnapshot>;

    async fn cancel_mkt_data(&self, contract: &ContractSpec) -> Result<()>;

    async fn sec_def_opt_params(
        &self,
        symbol: &str,
        exchange: &str,
        sec_type: &SecType,
        con_id: i64,
    ) -> Result<Vec<OptionChainParams>>;

    async fn managed_accounts(&self) -> Result<Vec<String>>;

    async fn account_summary(&self, account_id: &str) -> Result<Vec<AccountValue>>;

    async fn portfolio(&self) -> Result<Vec<PortfolioItem>>;
}

/// Stateless delayed snapshot API. No session, no greeks for spot.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn fetch_info(&self, symbol: &str) -> Result<SnapshotInfo>;

    /// Full chain for the nearest upcoming expiration.
    async fn fetch_option_chain(&self, symbol: &str) -> Result<ChainSnapshot>;
}
