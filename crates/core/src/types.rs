//! Domain records produced by the resolvers and the decision engine.
//!
//! All of these are ephemeral: built per request, returned, never stored.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::WheelError;

/// Shares controlled by one standard US equity option contract.
pub const CONTRACT_MULTIPLIER: Decimal = Decimal::ONE_HUNDRED;

/// Option contract right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionRight {
    Call,
    Put,
}

impl OptionRight {
    /// Single-letter broker code ("C" / "P").
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

impl FromStr for OptionRight {
    type Err = WheelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "C" | "CALL" => Ok(Self::Call),
            "P" | "PUT" => Ok(Self::Put),
            other => Err(WheelError::InvalidInput(format!(
                "unknown option type '{other}', expected CALL or PUT"
            ))),
        }
    }
}

/// Which provider answered a price request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Session-based broker gateway.
    Broker,
    /// Stateless delayed snapshot API.
    Snapshot,
}

impl std::fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Broker => write!(f, "broker"),
            Self::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Underlying spot price with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    /// Always positive and finite.
    pub price: Decimal,
    pub source: QuoteSource,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, price: Decimal, source: QuoteSource) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            source,
        }
    }
}

/// Converts a raw provider price into a usable one.
///
/// Returns `None` for NaN, infinities, zero and negative values.
#[must_use]
pub fn usable_price(raw: f64) -> Option<Decimal> {
    if raw.is_finite() && raw > 0.0 {
        Decimal::try_from(raw).ok().filter(|p| *p > Decimal::ZERO)
    } else {
        None
    }
}

/// Option greeks snapshot. Zero when the provider has no model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionGreeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// A priced option contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying symbol.
    pub symbol: String,
    /// Provider contract identifier (OCC symbol or broker conid).
    pub contract_id: String,
    /// Structured expiration, when the provider sent one.
    pub expiration: Option<NaiveDate>,
    /// Display-only expiration text. Never parse this for date math.
    pub expiration_label: String,
    pub strike: Decimal,
    pub right: OptionRight,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub mid: Decimal,
    /// `mid * CONTRACT_MULTIPLIER`.
    pub premium: Decimal,
    pub implied_volatility: f64,
    pub greeks: OptionGreeks,
}

impl OptionContract {
    /// True when at least one of bid/ask/last produced a price.
    #[must_use]
    pub fn is_priced(&self) -> bool {
        self.premium > Decimal::ZERO
    }

    /// Human-readable contract description (e.g., "NVDA 140 PUT 2026-03-20").
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {} {}",
            self.symbol, self.strike, self.right, self.expiration_label
        )
    }
}

/// Result of an option-chain lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSelection {
    /// Spot price read from the chain provider's own snapshot.
    pub spot_price: Decimal,
    pub target_strike: Decimal,
    pub contract: OptionContract,
}

/// An equity position reported by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed share count; positive means long.
    pub shares: Decimal,
    pub average_cost: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}

impl Position {
    #[must_use]
    pub fn is_long(&self) -> bool {
        self.shares > Decimal::ZERO
    }
}

/// Account balances. Each field is absent when the broker omitted the tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub net_liquidation: Option<Decimal>,
    pub cash: Option<Decimal>,
    pub excess_liquidity: Option<Decimal>,
    pub initial_margin: Option<Decimal>,
}

/// Account summary plus stock positions for the first managed account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub account_id: String,
    pub account: AccountSummary,
    pub positions: Vec<Position>,
}

impl Portfolio {
    /// True when the account is strictly long `symbol`.
    #[must_use]
    pub fn holds_long(&self, symbol: &str) -> bool {
        self.positions
            .iter()
            .any(|p| p.symbol.eq_ignore_ascii_case(symbol) && p.is_long())
    }
}

/// The two wheel recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WheelAction {
    SellPut,
    SellCall,
}

impl std::fmt::Display for WheelAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SellPut => write!(f, "SELL_PUT"),
            Self::SellCall => write!(f, "SELL_CALL"),
        }
    }
}

/// Where the position state behind a recommendation came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionProvenance {
    /// Read from the broker of record.
    Broker,
    /// Broker unavailable; the symbol was assumed not held.
    Unavailable { reason: String },
}

/// A wheel strategy recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: WheelAction,
    pub symbol: String,
    pub spot_price: Decimal,
    pub price_source: QuoteSource,
    pub strike: Decimal,
    pub expiration_label: String,
    /// Premium per contract, rounded to cents.
    pub premium: Decimal,
    /// Return in percent, rounded to two places.
    pub return_pct: Decimal,
    /// Cash reserved per contract (puts only).
    pub collateral: Option<Decimal>,
    pub max_contracts: Option<u32>,
    pub max_premium: Option<Decimal>,
    pub position_source: PositionProvenance,
    pub description: String,
}
