//! Interactive Brokers integration over the Client Portal gateway.
//!
//! Provides session management, stock and option contract resolution,
//! market data snapshots with model greeks, and account queries. The
//! [`IBClient`] implements [`wheel_advisor_core::BrokerProvider`].

pub mod account;
pub mod client;
pub mod error;
pub mod market_data;
pub mod options_chain;
pub mod provider;
pub mod types;

pub use client::{IBClient, IBConfig};
pub use error::IbError;
