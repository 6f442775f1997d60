//! Raw gateway response shapes.
//!
//! The gateway is loose about types (conids arrive as numbers or strings,
//! prices as strings with prefixes), so most fields are optional here and
//! normalised by the callers.

use serde::Deserialize;
use serde_json::Value;

/// `POST /iserver/auth/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub competing: bool,
}

/// One entry of `GET /trsrv/stocks`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStockEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contracts: Vec<RawStockContract>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStockContract {
    pub conid: i64,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(rename = "isUS", default)]
    pub is_us: bool,
}

/// One result of `GET /iserver/secdef/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub conid: Value,
    #[serde(default)]
    pub sections: Vec<RawSearchSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchSection {
    pub sec_type: String,
    #[serde(default)]
    pub months: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
}

/// `GET /iserver/secdef/strikes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStrikes {
    #[serde(default)]
    pub call: Vec<f64>,
    #[serde(default)]
    pub put: Vec<f64>,
}

/// One contract of `GET /iserver/secdef/info`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSecdefInfo {
    pub conid: i64,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub strike: Option<f64>,
    #[serde(default)]
    pub right: Option<String>,
    #[serde(default)]
    pub maturity_date: Option<String>,
    #[serde(default)]
    pub multiplier: Option<Value>,
}

/// One entry of `GET /portfolio/accounts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// One value of `GET /portfolio/{id}/summary`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSummaryEntry {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub value: Option<String>,
}

/// One entry of `GET /portfolio/{id}/positions/0`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPosition {
    pub conid: i64,
    #[serde(default)]
    pub contract_desc: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub avg_cost: f64,
    #[serde(default)]
    pub mkt_value: f64,
    #[serde(default)]
    pub unrealized_pnl: f64,
    #[serde(default)]
    pub asset_class: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RawPosition {
    /// Underlying symbol: the ticker, or the first word of the description.
    pub fn symbol(&self) -> String {
        self.ticker
            .clone()
            .or_else(|| {
                self.contract_desc
                    .as_deref()
                    .and_then(|d| d.split_whitespace().next())
                    .map(str::to_string)
            })
            .unwrap_or_default()
    }
}

/// Reads a conid the gateway sent either as a number or a string.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
