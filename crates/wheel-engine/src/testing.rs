//! Scripted providers for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use wheel_advisor_core::{
    AccountValue, BrokerProvider, ChainRow, ChainSnapshot, ContractSpec, MarketDataType,
    OptionChainParams, PortfolioItem, Result, SecType, Sleeper, SnapshotInfo, SnapshotProvider,
    TickerSnapshot, WheelError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectBehavior {
    Accept,
    Refuse,
    Unreachable,
}

#[derive(Debug, Clone)]
struct TickerScript {
    /// Reads that return an empty ticker before `ready` shows up.
    ready_after: u32,
    ready: TickerSnapshot,
    reads: u32,
}

pub struct FakeBroker {
    behavior: ConnectBehavior,
    connected: AtomicBool,
    connects: AtomicU32,
    disconnects: AtomicU32,
    subscriptions: AtomicU32,
    cancels: AtomicU32,
    mode: Mutex<MarketDataType>,
    stocks: HashMap<String, i64>,
    option_con_id: Option<i64>,
    qualified_options: Mutex<Vec<ContractSpec>>,
    tickers: Mutex<HashMap<(i64, MarketDataType), TickerScript>>,
    ticker_error: Option<WheelError>,
    chains: Vec<OptionChainParams>,
    accounts: Vec<String>,
    summary: Vec<AccountValue>,
    portfolio: Option<Vec<PortfolioItem>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self {
            behavior: ConnectBehavior::Accept,
            connected: AtomicBool::new(false),
            connects: AtomicU32::new(0),
            disconnects: AtomicU32::new(0),
            subscriptions: AtomicU32::new(0),
            cancels: AtomicU32::new(0),
            mode: Mutex::new(MarketDataType::Live),
            stocks: HashMap::new(),
            option_con_id: None,
            qualified_options: Mutex::new(Vec::new()),
            tickers: Mutex::new(HashMap::new()),
            ticker_error: None,
            chains: Vec::new(),
            accounts: vec!["DU111".to_string()],
            summary: Vec::new(),
            portfolio: Some(Vec::new()),
        }
    }

    pub fn refusing(mut self) -> Self {
        self.behavior = ConnectBehavior::Refuse;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.behavior = ConnectBehavior::Unreachable;
        self
    }

    pub fn with_stock(mut self, symbol: &str, con_id: i64) -> Self {
        self.stocks.insert(symbol.to_string(), con_id);
        self
    }

    pub fn with_ticker(
        self,
        con_id: i64,
        mode: MarketDataType,
        ready_after: u32,
        ready: TickerSnapshot,
    ) -> Self {
        self.tickers.lock().insert(
            (con_id, mode),
            TickerScript {
                ready_after,
                ready,
                reads: 0,
            },
        );
        self
    }

    pub fn with_live_price(self, con_id: i64, ready_after: u32, price: f64) -> Self {
        let ready = TickerSnapshot {
            market_price: price,
            last: price,
            ..TickerSnapshot::default()
        };
        self.with_ticker(con_id, MarketDataType::Live, ready_after, ready)
    }

    pub fn with_frozen_close(self, con_id: i64, ready_after: u32, close: f64) -> Self {
        let ready = TickerSnapshot {
            close,
            ..TickerSnapshot::default()
        };
        self.with_ticker(con_id, MarketDataType::Frozen, ready_after, ready)
    }

    pub fn with_ticker_error(mut self, err: WheelError) -> Self {
        self.ticker_error = Some(err);
        self
    }

    pub fn with_option(mut self, con_id: i64) -> Self {
        self.option_con_id = Some(con_id);
        self
    }

    pub fn with_chains(mut self, chains: Vec<OptionChainParams>) -> Self {
        self.chains = chains;
        self
    }

    pub fn with_accounts(mut self, accounts: Vec<&str>) -> Self {
        self.accounts = accounts.into_iter().map(str::to_string).collect();
        self
    }

    pub fn with_summary(mut self, summary: Vec<AccountValue>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_portfolio(mut self, items: Vec<PortfolioItem>) -> Self {
        self.portfolio = Some(items);
        self
    }

    pub fn with_failing_portfolio(mut self) -> Self {
        self.portfolio = None;
        self
    }

    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn subscriptions(&self) -> u32 {
        self.subscriptions.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> u32 {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn qualified_options(&self) -> Vec<ContractSpec> {
        self.qualified_options.lock().clone()
    }
}

#[async_trait]
impl BrokerProvider for FakeBroker {
    async fn connect(&self, _host: &str, _port: u16, _client_id: i32, _readonly: bool) -> Result<bool> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            ConnectBehavior::Accept => {
                self.connected.store(true, Ordering::SeqCst);
                Ok(true)
            }
            ConnectBehavior::Refuse => Ok(false),
            ConnectBehavior::Unreachable => {
                Err(WheelError::ConnectionFailed("connection refused".into()))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn qualify_contracts(&self, contract: &ContractSpec) -> Result<Vec<ContractSpec>> {
        match contract.sec_type {
            SecType::Stock => Ok(self
                .stocks
                .get(&contract.symbol)
                .map(|id| contract.clone().qualified(*id))
                .into_iter()
                .collect()),
            SecType::Option => {
                self.qualified_options.lock().push(contract.clone());
                Ok(self
                    .option_con_id
                    .map(|id| contract.clone().qualified(id))
                    .into_iter()
                    .collect())
            }
            SecType::Other(_) => Err(WheelError::Unqualified(contract.symbol.clone())),
        }
    }

    async fn req_market_data_type(&self, mode: MarketDataType) -> Result<()> {
        *self.mode.lock() = mode;
        Ok(())
    }

    async fn req_mkt_data(&self, _contract: &ContractSpec, _generic_ticks: &str) -> Result<()> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ticker(&self, contract: &ContractSpec) -> Result<TickerSnapshot> {
        if let Some(err) = &self.ticker_error {
            return Err(err.clone());
        }
        let key = (contract.con_id.unwrap_or_default(), *self.mode.lock());
        let mut tickers = self.tickers.lock();
        let Some(script) = tickers.get_mut(&key) else {
            return Ok(TickerSnapshot::default());
        };
        script.reads += 1;
        if script.reads > script.ready_after {
            Ok(script.ready)
        } else {
            Ok(TickerSnapshot::default())
        }
    }

    async fn cancel_mkt_data(&self, _contract: &ContractSpec) -> Result<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sec_def_opt_params(
        &self,
        _symbol: &str,
        _exchange: &str,
        _sec_type: &SecType,
        _con_id: i64,
    ) -> Result<Vec<OptionChainParams>> {
        Ok(self.chains.clone())
    }

    async fn managed_accounts(&self) -> Result<Vec<String>> {
        Ok(self.accounts.clone())
    }

    async fn account_summary(&self, _account_id: &str) -> Result<Vec<AccountValue>> {
        Ok(self.summary.clone())
    }

    async fn portfolio(&self) -> Result<Vec<PortfolioItem>> {
        self.portfolio
            .clone()
            .ok_or_else(|| WheelError::Provider("portfolio request timed out".into()))
    }
}

/// Snapshot provider with fixed answers.
pub struct FakeSnapshot {
    info: Result<SnapshotInfo>,
    chain: Result<ChainSnapshot>,
    info_calls: AtomicU32,
}

impl FakeSnapshot {
    pub fn new() -> Self {
        Self {
            info: Ok(SnapshotInfo::default()),
            chain: Ok(ChainSnapshot::default()),
            info_calls: AtomicU32::new(0),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.info = Ok(SnapshotInfo {
            current_price: Some(price),
            regular_market_price: None,
        });
        self
    }

    pub fn with_info(mut self, info: SnapshotInfo) -> Self {
        self.info = Ok(info);
        self
    }

    pub fn with_info_error(mut self, err: WheelError) -> Self {
        self.info = Err(err);
        self
    }

    pub fn with_chain(mut self, chain: ChainSnapshot) -> Self {
        self.chain = Ok(chain);
        self
    }

    pub fn with_chain_error(mut self, err: WheelError) -> Self {
        self.chain = Err(err);
        self
    }

    pub fn info_calls(&self) -> u32 {
        self.info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotProvider for FakeSnapshot {
    async fn fetch_info(&self, _symbol: &str) -> Result<SnapshotInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.info.clone()
    }

    async fn fetch_option_chain(&self, _symbol: &str) -> Result<ChainSnapshot> {
        self.chain.clone()
    }
}

/// Returns immediately, counting calls.
#[derive(Default)]
pub struct NoWait {
    calls: AtomicU32,
}

impl NoWait {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sleeper for NoWait {
    async fn sleep(&self, _duration: Duration) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Chain row with a strike and quotes; `None` quotes are omitted fields.
pub fn row(strike: f64, bid: Option<f64>, ask: Option<f64>, last: Option<f64>) -> ChainRow {
    ChainRow {
        strike,
        bid,
        ask,
        last_price: last,
        contract_identifier: format!("XYZ260320P{:08}", (strike * 1000.0) as u64),
        ..ChainRow::default()
    }
}

/// Stock position entry.
pub fn stock_item(symbol: &str, shares: f64) -> PortfolioItem {
    PortfolioItem {
        contract: ContractSpec::stock(symbol).qualified(1),
        position: shares,
        average_cost: 90.0,
        market_value: shares * 100.0,
        unrealized_pnl: 0.0,
    }
}
