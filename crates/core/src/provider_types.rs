//! Records exchanged with the two quote providers.
//!
//! These mirror what the providers hand back, including their gaps:
//! broker prices are `f64` with NaN for "not yet known", snapshot rows
//! use `Option` for fields the API omitted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::OptionRight;

/// Security type of a broker contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecType {
    Stock,
    Option,
    /// Anything else the broker reports (futures, cash, bonds, ...).
    Other(String),
}

impl SecType {
    /// Broker code ("STK", "OPT", ...).
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Stock => "STK",
            Self::Option => "OPT",
            Self::Other(code) => code,
        }
    }

    /// Parses a broker asset-class code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "STK" => Self::Stock,
            "OPT" => Self::Option,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A broker contract, either a request to qualify or a qualified result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub symbol: String,
    pub sec_type: SecType,
    /// Routing exchange ("SMART", "CBOE", ...).
    pub exchange: String,
    pub currency: String,
    /// Broker contract id, present once qualified.
    pub con_id: Option<i64>,
    /// Options only: expiration as `YYYYMMDD`.
    pub last_trade_date: Option<String>,
    pub strike: Option<f64>,
    pub right: Option<OptionRight>,
    pub multiplier: Option<u32>,
}

impl ContractSpec {
    /// US stock routed through SMART.
    pub fn stock(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            sec_type: SecType::Stock,
            exchange: "SMART".to_string(),
            currency: "USD".to_string(),
            con_id: None,
            last_trade_date: None,
            strike: None,
            right: None,
            multiplier: None,
        }
    }

    /// Standard 100-share US equity option.
    pub fn option(
        symbol: &str,
        last_trade_date: &str,
        strike: f64,
        right: OptionRight,
        exchange: &str,
    ) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            sec_type: SecType::Option,
            exchange: exchange.to_string(),
            currency: "USD".to_string(),
            con_id: None,
            last_trade_date: Some(last_trade_date.to_string()),
            strike: Some(strike),
            right: Some(right),
            multiplier: Some(100),
        }
    }

    /// Copy of this contract carrying a broker id.
    #[must_use]
    pub fn qualified(mut self, con_id: i64) -> Self {
        self.con_id = Some(con_id);
        self
    }
}

/// Market data mode requested from the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketDataType {
    Live,
    Frozen,
    Delayed,
    DelayedFrozen,
}

impl MarketDataType {
    /// Numeric code used by the broker API.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Live => 1,
            Self::Frozen => 2,
            Self::Delayed => 3,
            Self::DelayedFrozen => 4,
        }
    }
}

/// Model greeks computed by the broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelGreeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// Latest state of a market-data subscription. NaN means "no tick yet".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickerSnapshot {
    pub market_price: f64,
    pub close: f64,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub implied_volatility: Option<f64>,
    pub model_greeks: Option<ModelGreeks>,
}

impl Default for TickerSnapshot {
    fn default() -> Self {
        Self {
            market_price: f64::NAN,
            close: f64::NAN,
            bid: f64::NAN,
            ask: f64::NAN,
            last: f64::NAN,
            implied_volatility: None,
            model_greeks: None,
        }
    }
}

/// Option chain parameters for one exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionChainParams {
    pub exchange: String,
    /// Expirations as `YYYYMMDD`.
    pub expirations: Vec<String>,
    pub strikes: Vec<f64>,
}

/// One account summary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountValue {
    pub tag: String,
    pub value: String,
}

impl AccountValue {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// One portfolio entry as reported by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub contract: ContractSpec,
    pub position: f64,
    pub average_cost: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

/// Spot fields from the snapshot provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
}

/// One row of a snapshot option chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub strike: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last_price: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub theta: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub contract_identifier: String,
    pub expiration: Option<NaiveDate>,
}

/// Puts and calls for the nearest expiration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub puts: Vec<ChainRow>,
    pub calls: Vec<ChainRow>,
}

impl ChainSnapshot {
    /// Rows for one side of the chain.
    #[must_use]
    pub fn side(&self, right: OptionRight) -> &[ChainRow] {
        match right {
            OptionRight::Put => &self.puts,
            OptionRight::Call => &self.calls,
        }
    }
}
