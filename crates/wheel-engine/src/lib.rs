//! Dual-source market data resolution and wheel strategy decisions.
//!
//! Prices come from the broker of record when it answers and from a delayed
//! snapshot API otherwise. Chains come from the snapshot API; positions come
//! from the broker only.

pub mod broker_quote;
pub mod chain;
pub mod decision;
pub mod portfolio;
pub mod price;
pub mod service;
pub mod session;

#[cfg(test)]
mod testing;

pub use broker_quote::BrokerOptionQuoter;
pub use chain::{mid_price, nearest_strike_index, target_strike, OptionChainResolver};
pub use decision::{max_contracts, WheelDecisionEngine, WHEEL_OTM_PCT};
pub use portfolio::PortfolioResolver;
pub use price::PriceResolver;
pub use service::{normalize_symbol, WheelService};
pub use session::BrokerSession;
