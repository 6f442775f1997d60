//! Yahoo Finance REST client.
//!
//! Delayed (~15 minutes) quotes and option chains. No session, no
//! authentication; every call is a single bounded HTTP request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use wheel_advisor_core::{ChainSnapshot, SnapshotConfig, SnapshotInfo, SnapshotProvider};

use crate::error::{Result, YahooError};
use crate::types::{OptionsResponse, QuoteSummaryResponse, RawValue};

/// Yahoo Finance API base URL.
pub const YAHOO_URL: &str = "https://query2.finance.yahoo.com";

const MAX_SYMBOL_LEN: usize = 20;

/// Configuration for the Yahoo client.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self::from(&SnapshotConfig::default())
    }
}

impl From<&SnapshotConfig> for YahooConfig {
    fn from(config: &SnapshotConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Yahoo Finance API client
#[derive(Debug, Clone)]
pub struct YahooClient {
    config: YahooConfig,
    http: Client,
}

impl YahooClient {
    /// Creates a new client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: YahooConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| YahooError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Get the configuration.
    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    /// Current and regular-market price for a symbol.
    pub async fn quote_summary(&self, symbol: &str) -> Result<SnapshotInfo> {
        let symbol = validate_symbol(symbol)?;
        let url = format!(
            "{}/v10/finance/quoteSummary/{}",
            self.config.base_url, symbol
        );

        let response: QuoteSummaryResponse = self
            .get(&url, &[("modules", "financialData,price")])
            .await?;

        if let Some(error) = &response.quote_summary.error {
            warn!(symbol = %symbol, error = %error, "Quote summary error");
        }

        let info = response
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|result| SnapshotInfo {
                current_price: result
                    .financial_data
                    .as_ref()
                    .and_then(|d| RawValue::value(&d.current_price)),
                regular_market_price: result
                    .price
                    .as_ref()
                    .and_then(|p| RawValue::value(&p.regular_market_price)),
            })
            .unwrap_or_default();

        debug!(symbol = %symbol, ?info, "Snapshot info");
        Ok(info)
    }

    /// Full chain for the nearest upcoming expiration.
    pub async fn option_chain(&self, symbol: &str) -> Result<ChainSnapshot> {
        let symbol = validate_symbol(symbol)?;
        let url = format!("{}/v7/finance/options/{}", self.config.base_url, symbol);

        let response: OptionsResponse = self.get(&url, &[]).await?;

        if let Some(error) = &response.option_chain.error {
            warn!(symbol = %symbol, error = %error, "Option chain error");
        }

        let Some(expiry) = response
            .option_chain
            .result
            .into_iter()
            .next()
            .and_then(|result| result.options.into_iter().next())
        else {
            return Ok(ChainSnapshot::default());
        };

        let fallback = expiry.expiration_date;
        let chain = ChainSnapshot {
            puts: expiry
                .puts
                .into_iter()
                .filter_map(|row| row.into_chain_row(fallback))
                .collect(),
            calls: expiry
                .calls
                .into_iter()
                .filter_map(|row| row.into_chain_row(fallback))
                .collect(),
        };

        debug!(
            symbol = %symbol,
            puts = chain.puts.len(),
            calls = chain.calls.len(),
            "Option chain retrieved"
        );
        Ok(chain)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(YahooError::api(status.as_u16(), text));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Validates a ticker before it is placed in a URL path.
pub fn validate_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return Err(YahooError::InvalidSymbol(symbol));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
    {
        return Err(YahooError::InvalidSymbol(symbol));
    }
    Ok(symbol)
}

#[async_trait]
impl SnapshotProvider for YahooClient {
    async fn fetch_info(&self, symbol: &str) -> wheel_advisor_core::Result<SnapshotInfo> {
        Ok(self.quote_summary(symbol).await?)
    }

    async fn fetch_option_chain(&self, symbol: &str) -> wheel_advisor_core::Result<ChainSnapshot> {
        Ok(self.option_chain(symbol).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wheel_advisor_core::{OptionRight, WheelError};
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> YahooClient {
        YahooClient::new(YahooConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            user_agent: "wheel-test".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_validate_symbol() {
        assert_eq!(validate_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(validate_symbol("BRK-B").unwrap(), "BRK-B");
        assert_eq!(validate_symbol("^GSPC").unwrap(), "^GSPC");
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("../etc").is_err());
        assert!(validate_symbol("A B").is_err());
    }

    #[test]
    fn test_config_from_snapshot_config() {
        let config = YahooConfig::default();
        assert_eq!(config.base_url, YAHOO_URL);
        assert_eq!(config.timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_quote_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/XYZ"))
            .and(query_param("modules", "financialData,price"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quoteSummary": {
                    "result": [{
                        "financialData": {"currentPrice": {"raw": 101.5, "fmt": "101.50"}},
                        "price": {"regularMarketPrice": {"raw": 101.25, "fmt": "101.25"}}
                    }],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let info = client_for(&server).fetch_info("xyz").await.unwrap();
        assert_eq!(info.current_price, Some(101.5));
        assert_eq!(info.regular_market_price, Some(101.25));
    }

    #[tokio::test]
    async fn test_quote_summary_missing_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/XYZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quoteSummary": {
                    "result": [{"financialData": {"currentPrice": {}}, "price": {}}],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let info = client_for(&server).fetch_info("XYZ").await.unwrap();
        assert_eq!(info, SnapshotInfo::default());
    }

    #[tokio::test]
    async fn test_http_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/NOPE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "quoteSummary": {
                    "result": null,
                    "error": {"code": "Not Found", "description": "Quote not found"}
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_info("NOPE").await.unwrap_err();
        assert!(matches!(err, WheelError::Provider(_)));
    }

    #[tokio::test]
    async fn test_option_chain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/options/XYZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "optionChain": {
                    "result": [{
                        "underlyingSymbol": "XYZ",
                        "expirationDates": [1773964800],
                        "options": [{
                            "expirationDate": 1773964800,
                            "calls": [
                                {"contractSymbol": "XYZ260320C00110000", "strike": 110.0, "bid": 0.9, "ask": 1.1}
                            ],
                            "puts": [
                                {"contractSymbol": "XYZ260320P00090000", "strike": 90.0, "bid": 1.8, "ask": 2.2},
                                {"contractSymbol": "XYZ260320P00095000", "strike": 95.0, "lastPrice": 3.1}
                            ]
                        }]
                    }],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let chain = client_for(&server).fetch_option_chain("XYZ").await.unwrap();
        assert_eq!(chain.side(OptionRight::Put).len(), 2);
        assert_eq!(chain.side(OptionRight::Call).len(), 1);
        assert_eq!(
            chain.puts[0].expiration,
            chrono::NaiveDate::from_ymd_opt(2026, 3, 20)
        );
        assert_eq!(chain.puts[1].last_price, Some(3.1));
    }

    #[tokio::test]
    async fn test_option_chain_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/options/XYZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "optionChain": {"result": [], "error": null}
            })))
            .mount(&server)
            .await;

        let chain = client_for(&server).fetch_option_chain("XYZ").await.unwrap();
        assert!(chain.puts.is_empty() && chain.calls.is_empty());
    }
}
