//! Yahoo Finance snapshot integration.
//!
//! Stateless delayed quotes and option chains, used as the fallback price
//! source and the primary chain source. [`YahooClient`] implements
//! [`wheel_advisor_core::SnapshotProvider`].

pub mod client;
pub mod error;
pub mod types;

pub use client::{validate_symbol, YahooClient, YahooConfig, YAHOO_URL};
pub use error::YahooError;
