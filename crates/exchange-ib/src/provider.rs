//! [`BrokerProvider`] over the IB gateway.

use async_trait::async_trait;
use tracing::debug;
use wheel_advisor_core::{
    AccountValue, BrokerProvider, ContractSpec, MarketDataType, OptionChainParams, PortfolioItem,
    Result, SecType, TickerSnapshot, WheelError,
};

use crate::client::IBClient;

fn require_con_id(contract: &ContractSpec) -> Result<i64> {
    contract
        .con_id
        .ok_or_else(|| WheelError::Unqualified(format!("{} has no contract id", contract.symbol)))
}

#[async_trait]
impl BrokerProvider for IBClient {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        client_id: i32,
        readonly: bool,
    ) -> Result<bool> {
        self.open_session(host, port, client_id, readonly)
            .await
            .map_err(WheelError::connection_failed)
    }

    fn is_connected(&self) -> bool {
        IBClient::is_connected(self)
    }

    async fn disconnect(&self) {
        self.close_session().await;
    }

    async fn qualify_contracts(&self, contract: &ContractSpec) -> Result<Vec<ContractSpec>> {
        let con_id = match &contract.sec_type {
            SecType::Stock => self.stock_conid(&contract.symbol).await?,
            SecType::Option => self.option_conid(contract).await?,
            SecType::Other(code) => {
                return Err(WheelError::Unqualified(format!(
                    "unsupported security type {code} for {}",
                    contract.symbol
                )))
            }
        };

        Ok(con_id
            .map(|id| contract.clone().qualified(id))
            .into_iter()
            .collect())
    }

    async fn req_market_data_type(&self, mode: MarketDataType) -> Result<()> {
        debug!(mode = ?mode, code = mode.code(), "Market data type");
        self.set_market_data_type(mode);
        Ok(())
    }

    async fn req_mkt_data(&self, contract: &ContractSpec, generic_ticks: &str) -> Result<()> {
        let con_id = require_con_id(contract)?;
        debug!(symbol = %contract.symbol, con_id, generic_ticks, "Subscribing to market data");
        // The first snapshot request opens the stream; its payload is empty.
        self.request_snapshot(con_id).await?;
        Ok(())
    }

    async fn ticker(&self, contract: &ContractSpec) -> Result<TickerSnapshot> {
        Ok(self.ticker_snapshot(require_con_id(contract)?).await?)
    }

    async fn cancel_mkt_data(&self, contract: &ContractSpec) -> Result<()> {
        Ok(self.unsubscribe(require_con_id(contract)?).await?)
    }

    async fn sec_def_opt_params(
        &self,
        symbol: &str,
        _exchange: &str,
        sec_type: &SecType,
        con_id: i64,
    ) -> Result<Vec<OptionChainParams>> {
        if *sec_type != SecType::Stock {
            return Ok(Vec::new());
        }
        Ok(self.option_chain_params(symbol, con_id).await?)
    }

    async fn managed_accounts(&self) -> Result<Vec<String>> {
        Ok(self.accounts().await?)
    }

    async fn account_summary(&self, account_id: &str) -> Result<Vec<AccountValue>> {
        Ok(self.account_values(account_id).await?)
    }

    async fn portfolio(&self) -> Result<Vec<PortfolioItem>> {
        Ok(self.positions().await?)
    }
}
