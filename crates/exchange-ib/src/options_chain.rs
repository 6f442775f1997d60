//! Contract resolution: stocks, option contracts and chain parameters.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{debug, warn};
use wheel_advisor_core::{ContractSpec, OptionChainParams, OptionRight};

use crate::client::IBClient;
use crate::error::{IbError, Result};
use crate::types::{value_as_i64, RawSearchResult, RawSecdefInfo, RawStockEntry, RawStrikes};

/// Months whose strikes and expirations are expanded into chain parameters.
const CHAIN_MONTHS: usize = 2;

impl IBClient {
    /// Resolves a stock symbol to its contract id, preferring US listings.
    pub async fn stock_conid(&self, symbol: &str) -> Result<Option<i64>> {
        let symbol = symbol.to_uppercase();
        debug!(symbol = %symbol, "Qualifying stock");

        let listings: HashMap<String, Vec<RawStockEntry>> = self
            .get("/trsrv/stocks", &[("symbols", symbol.clone())])
            .await?;

        let contracts: Vec<_> = listings
            .get(&symbol)
            .into_iter()
            .flatten()
            .flat_map(|entry| entry.contracts.iter())
            .collect();

        Ok(contracts
            .iter()
            .find(|c| c.is_us)
            .or_else(|| contracts.first())
            .map(|c| c.conid))
    }

    /// Resolves one option contract (symbol, expiration, strike, right) to
    /// its contract id.
    pub async fn option_conid(&self, spec: &ContractSpec) -> Result<Option<i64>> {
        let (Some(expiry), Some(strike), Some(right)) =
            (spec.last_trade_date.as_deref(), spec.strike, spec.right)
        else {
            return Err(IbError::Contract(format!(
                "option {} needs expiration, strike and right",
                spec.symbol
            )));
        };

        let Some(underlying) = self.stock_conid(&spec.symbol).await? else {
            return Ok(None);
        };

        let infos = self
            .secdef_info(underlying, &contract_month(expiry)?, strike, right)
            .await?;

        let found = infos
            .iter()
            .find(|info| info.maturity_date.as_deref() == Some(expiry))
            .map(|info| info.conid);

        if found.is_none() {
            warn!(symbol = %spec.symbol, expiry, strike, right = %right, "Option contract not listed");
        }
        Ok(found)
    }

    /// Expirations and strikes of the options listed on an underlying.
    pub async fn option_chain_params(
        &self,
        symbol: &str,
        underlying: i64,
    ) -> Result<Vec<OptionChainParams>> {
        debug!(symbol, underlying, "Fetching option chain parameters");

        let results: Vec<RawSearchResult> = self
            .get("/iserver/secdef/search", &[("symbol", symbol.to_uppercase())])
            .await?;

        let result = results
            .iter()
            .find(|r| value_as_i64(&r.conid) == Some(underlying))
            .or_else(|| results.first());

        let Some(section) = result
            .into_iter()
            .flat_map(|r| r.sections.iter())
            .find(|s| s.sec_type == "OPT")
        else {
            return Ok(Vec::new());
        };

        let months: Vec<&str> = section
            .months
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .filter(|m| !m.is_empty())
            .take(CHAIN_MONTHS)
            .collect();

        let exchange = section
            .exchange
            .as_deref()
            .and_then(|e| e.split(';').find(|x| *x == "SMART").or_else(|| e.split(';').next()))
            .unwrap_or("SMART")
            .to_string();

        let mut strikes = BTreeSet::new();
        let mut expirations = BTreeSet::new();

        for month in months {
            let listed: RawStrikes = self
                .get(
                    "/iserver/secdef/strikes",
                    &[
                        ("conid", underlying.to_string()),
                        ("sectype", "OPT".to_string()),
                        ("month", month.to_string()),
                    ],
                )
                .await?;

            let month_strikes: Vec<f64> = listed
                .call
                .iter()
                .chain(listed.put.iter())
                .copied()
                .filter(|s| s.is_finite())
                .collect();

            let Some(probe) = middle_strike(&month_strikes) else {
                continue;
            };

            for info in self
                .secdef_info(underlying, month, probe, OptionRight::Call)
                .await?
            {
                if let Some(date) = info.maturity_date {
                    expirations.insert(date);
                }
            }
            strikes.extend(month_strikes.into_iter().map(StrikeKey::from));
        }

        if expirations.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![OptionChainParams {
            exchange,
            expirations: expirations.into_iter().collect(),
            strikes: strikes.into_iter().map(|k| k.0).collect(),
        }])
    }

    async fn secdef_info(
        &self,
        underlying: i64,
        month: &str,
        strike: f64,
        right: OptionRight,
    ) -> Result<Vec<RawSecdefInfo>> {
        self.get(
            "/iserver/secdef/info",
            &[
                ("conid", underlying.to_string()),
                ("sectype", "OPT".to_string()),
                ("month", month.to_string()),
                ("strike", strike.to_string()),
                ("right", right.code().to_string()),
            ],
        )
        .await
    }
}

/// Gateway month code for a `YYYYMMDD` expiration ("20250117" -> "JAN25").
pub fn contract_month(expiry: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(expiry, "%Y%m%d")
        .map_err(|_| IbError::Contract(format!("invalid expiration: {expiry}")))?;
    Ok(date.format("%b%y").to_string().to_uppercase())
}

fn middle_strike(strikes: &[f64]) -> Option<f64> {
    let mut sorted = strikes.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.get(sorted.len() / 2).copied()
}

/// Orders strikes for de-duplication.
#[derive(Debug, Clone, Copy)]
struct StrikeKey(f64);

impl From<f64> for StrikeKey {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl PartialEq for StrikeKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for StrikeKey {}

impl PartialOrd for StrikeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StrikeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}
