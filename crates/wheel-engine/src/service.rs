//! Request-scoped entry points.
//!
//! Each call opens its own broker session and closes it before returning,
//! whatever the outcome.

use std::future::Future;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{info, instrument};
use wheel_advisor_core::{
    AppConfig, BrokerProvider, OptionRight, OptionSelection, PollPolicy, Portfolio, Quote,
    Recommendation, Result, Sleeper, SnapshotProvider, TokioSleeper, WheelError,
};

use crate::broker_quote::BrokerOptionQuoter;
use crate::chain::OptionChainResolver;
use crate::decision::WheelDecisionEngine;
use crate::portfolio::PortfolioResolver;
use crate::price::PriceResolver;
use crate::session::BrokerSession;

/// Trims and uppercases a ticker symbol.
///
/// # Errors
/// Returns [`WheelError::InvalidInput`] for an empty symbol.
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(WheelError::InvalidInput("symbol is required".into()));
    }
    Ok(symbol.to_uppercase())
}

pub struct WheelService {
    broker: Arc<dyn BrokerProvider>,
    snapshot: Arc<dyn SnapshotProvider>,
    sleeper: Arc<dyn Sleeper>,
    config: AppConfig,
}

impl WheelService {
    pub fn new(
        broker: Arc<dyn BrokerProvider>,
        snapshot: Arc<dyn SnapshotProvider>,
        config: AppConfig,
    ) -> Self {
        Self::with_sleeper(broker, snapshot, Arc::new(TokioSleeper), config)
    }

    pub fn with_sleeper(
        broker: Arc<dyn BrokerProvider>,
        snapshot: Arc<dyn SnapshotProvider>,
        sleeper: Arc<dyn Sleeper>,
        config: AppConfig,
    ) -> Self {
        Self {
            broker,
            snapshot,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn prices(&self) -> PriceResolver<'_> {
        PriceResolver::new(
            self.snapshot.as_ref(),
            self.sleeper.as_ref(),
            PollPolicy::price(&self.config.polling),
        )
    }

    fn chains(&self) -> OptionChainResolver<'_> {
        OptionChainResolver::new(self.snapshot.as_ref())
    }

    async fn with_session<'s, T, F, Fut>(&'s self, f: F) -> Result<T>
    where
        F: FnOnce(BrokerSession) -> Fut,
        Fut: Future<Output = (BrokerSession, Result<T>)> + 's,
    {
        let session = BrokerSession::new(self.broker.clone(), self.config.broker.clone());
        let (mut session, result) = f(session).await;
        session.close().await;
        result
    }

    /// Current spot price, broker first.
    #[instrument(skip(self))]
    pub async fn get_price(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)?;
        let prices = self.prices();
        self.with_session(|mut session| async move {
            let result = prices.resolve(&mut session, &symbol).await;
            (session, result)
        })
        .await
    }

    /// Nearest-strike option from the snapshot chain. No broker session is
    /// opened.
    #[instrument(skip(self))]
    pub async fn get_options(
        &self,
        symbol: &str,
        otm_pct: Decimal,
        right: OptionRight,
    ) -> Result<OptionSelection> {
        let symbol = normalize_symbol(symbol)?;
        self.chains().resolve(&symbol, otm_pct, right).await
    }

    /// Wheel recommendation. `cash` sizes the put branch; without it one
    /// contract is assumed.
    #[instrument(skip(self))]
    pub async fn recommend(&self, symbol: &str, cash: Option<Decimal>) -> Result<Recommendation> {
        let symbol = normalize_symbol(symbol)?;
        let engine = WheelDecisionEngine::new(self.prices(), self.chains());
        let recommendation = self
            .with_session(|mut session| async move {
                let result = engine.recommend(&mut session, &symbol, cash).await;
                (session, result)
            })
            .await?;
        info!(description = %recommendation.description, "Recommendation ready");
        Ok(recommendation)
    }

    /// Balances and stock positions of the first managed account.
    #[instrument(skip(self))]
    pub async fn get_portfolio(&self) -> Result<Portfolio> {
        self.with_session(|mut session| async move {
            let result = PortfolioResolver.resolve(&mut session).await;
            (session, result)
        })
        .await
    }

    /// Option quote with model greeks, straight from the broker.
    #[instrument(skip(self))]
    pub async fn quote_option_via_broker(
        &self,
        symbol: &str,
        otm_pct: Decimal,
        right: OptionRight,
    ) -> Result<OptionSelection> {
        self.quote_option_via_broker_on(symbol, otm_pct, right, Local::now().date_naive())
            .await
    }

    /// [`Self::quote_option_via_broker`] with an explicit trading date.
    pub async fn quote_option_via_broker_on(
        &self,
        symbol: &str,
        otm_pct: Decimal,
        right: OptionRight,
        today: NaiveDate,
    ) -> Result<OptionSelection> {
        let symbol = normalize_symbol(symbol)?;
        let quoter = BrokerOptionQuoter::new(
            self.prices(),
            self.sleeper.as_ref(),
            PollPolicy::greeks(&self.config.polling),
        );
        self.with_session(|mut session| async move {
            let result = quoter
                .quote(&mut session, &symbol, otm_pct, right, today)
                .await;
            (session, result)
        })
        .await
    }
}
