//! Spot price resolution: broker first, snapshot fallback.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use wheel_advisor_core::{
    poll_until, usable_price, BrokerProvider, ContractSpec, MarketDataType, PollPolicy, Quote,
    QuoteSource, Result, Sleeper, SnapshotProvider, SnapshotInfo, WheelError,
};

use crate::session::BrokerSession;

/// Qualifies a contract, taking the first match.
pub(crate) async fn qualify_first(
    broker: &dyn BrokerProvider,
    spec: &ContractSpec,
) -> Result<ContractSpec> {
    broker
        .qualify_contracts(spec)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            WheelError::Unqualified(format!("{} {}", spec.symbol, spec.sec_type.code()))
        })
}

/// Best usable price from a snapshot: current price, else regular-market price.
pub fn snapshot_spot(info: &SnapshotInfo) -> Option<Decimal> {
    info.current_price
        .and_then(usable_price)
        .or_else(|| info.regular_market_price.and_then(usable_price))
}

/// Resolves the current underlying price.
///
/// The broker is polled for a live market price, then for a frozen close;
/// any broker failure falls through to the snapshot provider. The result
/// is always positive and finite.
pub struct PriceResolver<'a> {
    snapshot: &'a dyn SnapshotProvider,
    sleeper: &'a dyn Sleeper,
    policy: PollPolicy,
}

impl<'a> PriceResolver<'a> {
    pub fn new(
        snapshot: &'a dyn SnapshotProvider,
        sleeper: &'a dyn Sleeper,
        policy: PollPolicy,
    ) -> Self {
        Self {
            snapshot,
            sleeper,
            policy,
        }
    }

    /// # Errors
    /// Returns [`WheelError::NoPriceData`] when neither provider has a price.
    pub async fn resolve(&self, session: &mut BrokerSession, symbol: &str) -> Result<Quote> {
        match session.ensure_connected().await {
            Ok(broker) => match self.broker_price(broker, symbol).await {
                Ok(Some(price)) => {
                    debug!(symbol, %price, "Broker price");
                    return Ok(Quote::new(symbol, price, QuoteSource::Broker));
                }
                Ok(None) => info!(symbol, "Broker has no price, using snapshot"),
                Err(e) => warn!(symbol, error = %e, "Broker price failed, using snapshot"),
            },
            Err(e) => warn!(symbol, error = %e, "Broker unavailable, using snapshot"),
        }

        self.snapshot_price(symbol).await
    }

    /// Snapshot-only price.
    ///
    /// # Errors
    /// Returns [`WheelError::NoPriceData`] when the snapshot has no usable
    /// price or cannot be fetched.
    pub async fn snapshot_price(&self, symbol: &str) -> Result<Quote> {
        let info = match self.snapshot.fetch_info(symbol).await {
            Ok(info) => info,
            Err(e) => {
                warn!(symbol, error = %e, "Snapshot price failed");
                return Err(WheelError::no_price(symbol));
            }
        };

        snapshot_spot(&info)
            .map(|price| Quote::new(symbol, price, QuoteSource::Snapshot))
            .ok_or_else(|| WheelError::no_price(symbol))
    }

    async fn broker_price(
        &self,
        broker: &dyn BrokerProvider,
        symbol: &str,
    ) -> Result<Option<Decimal>> {
        let contract = qualify_first(broker, &ContractSpec::stock(symbol)).await?;

        broker.req_market_data_type(MarketDataType::Live).await?;
        broker.req_mkt_data(&contract, "").await?;

        let outcome = self.poll_live_then_frozen(broker, &contract).await;

        if let Err(e) = broker.cancel_mkt_data(&contract).await {
            warn!(symbol, error = %e, "Failed to cancel market data");
        }
        outcome
    }

    async fn poll_live_then_frozen(
        &self,
        broker: &dyn BrokerProvider,
        contract: &ContractSpec,
    ) -> Result<Option<Decimal>> {
        let live = poll_until(self.policy, self.sleeper, move || async move {
            Ok::<_, WheelError>(usable_price(broker.ticker(contract).await?.market_price))
        })
        .await?;
        if live.is_some() {
            return Ok(live);
        }

        debug!(symbol = %contract.symbol, "No live price, requesting frozen data");
        broker.req_market_data_type(MarketDataType::Frozen).await?;
        broker.req_mkt_data(contract, "").await?;

        poll_until(self.policy, self.sleeper, move || async move {
            Ok::<_, WheelError>(usable_price(broker.ticker(contract).await?.close))
        })
        .await
    }
}
