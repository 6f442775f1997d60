//! Yahoo Finance API response structures.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use wheel_advisor_core::ChainRow;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResponse {
    pub quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
pub struct QuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResult {
    #[serde(default)]
    pub financial_data: Option<FinancialData>,
    #[serde(default)]
    pub price: Option<PriceModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialData {
    #[serde(default)]
    pub current_price: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceModule {
    #[serde(default)]
    pub regular_market_price: Option<RawValue>,
}

/// Formatted number: `{"raw": 101.5, "fmt": "101.50"}`. Empty objects mean
/// the value is unknown.
#[derive(Debug, Deserialize)]
pub struct RawValue {
    #[serde(default)]
    pub raw: Option<f64>,
}

impl RawValue {
    pub fn value(field: &Option<Self>) -> Option<f64> {
        field.as_ref().and_then(|v| v.raw)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("error"),
            self.description.as_deref().unwrap_or("unknown")
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsResponse {
    pub option_chain: OptionChain,
}

#[derive(Debug, Deserialize)]
pub struct OptionChain {
    #[serde(default)]
    pub result: Vec<OptionChainResult>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainResult {
    #[serde(default)]
    pub underlying_symbol: Option<String>,
    #[serde(default)]
    pub expiration_dates: Vec<i64>,
    #[serde(default)]
    pub options: Vec<OptionExpiry>,
}

/// Calls and puts for one expiration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionExpiry {
    #[serde(default)]
    pub expiration_date: Option<i64>,
    #[serde(default)]
    pub calls: Vec<OptionRow>,
    #[serde(default)]
    pub puts: Vec<OptionRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRow {
    #[serde(default)]
    pub contract_symbol: Option<String>,
    pub strike: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub implied_volatility: Option<f64>,
    /// Unix seconds.
    #[serde(default)]
    pub expiration: Option<i64>,
    // Greeks are not published on this endpoint; kept for completeness.
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub gamma: Option<f64>,
    #[serde(default)]
    pub theta: Option<f64>,
    #[serde(default)]
    pub vega: Option<f64>,
}

fn date_from_unix(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

impl OptionRow {
    /// Converts to a chain row. Rows without a strike are dropped.
    pub fn into_chain_row(self, fallback_expiration: Option<i64>) -> Option<ChainRow> {
        let strike = self.strike.filter(|s| s.is_finite())?;
        Some(ChainRow {
            strike,
            bid: self.bid,
            ask: self.ask,
            last_price: self.last_price,
            implied_volatility: self.implied_volatility,
            delta: self.delta,
            theta: self.theta,
            gamma: self.gamma,
            vega: self.vega,
            contract_identifier: self.contract_symbol.unwrap_or_default(),
            expiration: self.expiration.or(fallback_expiration).and_then(date_from_unix),
        })
    }
}
