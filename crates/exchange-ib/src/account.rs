//! IB account queries: managed accounts, balances, positions.

use std::collections::BTreeMap;

use tracing::debug;
use wheel_advisor_core::{AccountValue, ContractSpec, PortfolioItem, SecType};

use crate::client::{validate_identifier, IBClient};
use crate::error::{IbError, Result};
use crate::types::{RawAccount, RawPosition, RawSummaryEntry};

/// Gateway summary keys and the account tags they are reported as.
const SUMMARY_TAGS: &[(&str, &str)] = &[
    ("netliquidation", "NetLiquidation"),
    ("totalcashvalue", "TotalCashValue"),
    ("excessliquidity", "ExcessLiquidity"),
    ("fullinitmarginreq", "FullInitMarginReq"),
    ("initmarginreq", "InitMarginReq"),
    ("buyingpower", "BuyingPower"),
    ("availablefunds", "AvailableFunds"),
    ("maintmarginreq", "MaintMarginReq"),
];

/// Account tag for a gateway summary key. Unknown keys pass through.
pub fn canonical_tag(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    SUMMARY_TAGS
        .iter()
        .find(|(raw, _)| *raw == lower)
        .map_or_else(|| key.to_string(), |(_, tag)| (*tag).to_string())
}

impl IBClient {
    /// Accounts managed by the logged-in user.
    pub async fn accounts(&self) -> Result<Vec<String>> {
        let accounts: Vec<RawAccount> = self.get("/portfolio/accounts", &[]).await?;
        let ids: Vec<String> = accounts
            .into_iter()
            .filter_map(|a| a.account_id.or(a.id))
            .collect();

        debug!(count = ids.len(), "Managed accounts retrieved");
        if let Some(first) = ids.first() {
            self.cache_account(first);
        }
        Ok(ids)
    }

    /// Balance and margin values for one account.
    pub async fn account_values(&self, account_id: &str) -> Result<Vec<AccountValue>> {
        let account_id = validate_identifier(account_id)?;
        let summary: BTreeMap<String, RawSummaryEntry> = self
            .get(&format!("/portfolio/{account_id}/summary"), &[])
            .await?;

        let values: Vec<AccountValue> = summary
            .into_iter()
            .filter_map(|(key, entry)| {
                let value = entry
                    .amount
                    .map(|a| a.to_string())
                    .or(entry.value)?;
                Some(AccountValue::new(canonical_tag(&key), value))
            })
            .collect();

        debug!(account_id, count = values.len(), "Account summary retrieved");
        Ok(values)
    }

    /// Positions of the first managed account.
    pub async fn positions(&self) -> Result<Vec<PortfolioItem>> {
        let account_id = match self.cached_account() {
            Some(id) => id,
            None => self
                .accounts()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| IbError::api(200, "no managed accounts"))?,
        };
        let account_id = validate_identifier(&account_id)?;

        let raw: Vec<RawPosition> = self
            .get(&format!("/portfolio/{account_id}/positions/0"), &[])
            .await?;

        Ok(raw.into_iter().map(portfolio_item).collect())
    }
}

fn portfolio_item(raw: RawPosition) -> PortfolioItem {
    let sec_type = SecType::from_code(raw.asset_class.as_deref().unwrap_or("STK"));
    let mut contract = ContractSpec::stock(&raw.symbol()).qualified(raw.conid);
    contract.sec_type = sec_type;
    if let Some(currency) = raw.currency {
        contract.currency = currency;
    }

    PortfolioItem {
        contract,
        position: raw.position,
        average_cost: raw.avg_cost,
        market_value: raw.mkt_value,
        unrealized_pnl: raw.unrealized_pnl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::connected_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_accounts(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/api/portfolio/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "DU111", "accountId": "DU111"},
                {"id": "DU222", "accountId": "DU222"}
            ])))
            .mount(server)
            .await;
    }

    #[test]
    fn test_canonical_tag() {
        assert_eq!(canonical_tag("netliquidation"), "NetLiquidation");
        assert_eq!(canonical_tag("TotalCashValue"), "TotalCashValue");
        assert_eq!(canonical_tag("fullinitmarginreq"), "FullInitMarginReq");
        assert_eq!(canonical_tag("accountcode"), "accountcode");
    }

    #[tokio::test]
    async fn test_accounts() {
        let server = MockServer::start().await;
        mount_accounts(&server).await;

        let client = connected_client(&server).await;
        assert_eq!(client.accounts().await.unwrap(), vec!["DU111", "DU222"]);
    }

    #[tokio::test]
    async fn test_account_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/portfolio/DU111/summary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "netliquidation": {"amount": 25000.5, "currency": "USD"},
                "totalcashvalue": {"amount": 20000.0, "currency": "USD"},
                "accountcode": {"amount": null, "value": "DU111"},
                "cushion": {"amount": null, "value": null}
            })))
            .mount(&server)
            .await;

        let client = connected_client(&server).await;
        let values = client.account_values("DU111").await.unwrap();

        assert!(values.contains(&AccountValue::new("NetLiquidation", "25000.5")));
        assert!(values.contains(&AccountValue::new("TotalCashValue", "20000")));
        assert!(values.contains(&AccountValue::new("accountcode", "DU111")));
        assert_eq!(values.len(), 3);
    }

    #[tokio::test]
    async fn test_positions_use_first_account() {
        let server = MockServer::start().await;
        mount_accounts(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/api/portfolio/DU111/positions/0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"conid": 4242, "ticker": "XYZ", "position": 50.0, "avgCost": 95.5,
                 "mktValue": 5000.0, "unrealizedPnl": 225.0, "assetClass": "STK", "currency": "USD"},
                {"conid": 777, "contractDesc": "XYZ MAR2026 90 P", "position": -1.0,
                 "assetClass": "OPT"}
            ])))
            .mount(&server)
            .await;

        let client = connected_client(&server).await;
        let items = client.positions().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].contract.symbol, "XYZ");
        assert_eq!(items[0].contract.sec_type, SecType::Stock);
        assert_eq!(items[0].position, 50.0);
        assert_eq!(items[1].contract.sec_type, SecType::Option);
    }

    #[test]
    fn test_invalid_account_id_rejected() {
        assert!(validate_identifier("DU1/../x").is_err());
    }
}
