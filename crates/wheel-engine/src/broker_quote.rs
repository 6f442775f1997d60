//! Single-contract option quote straight from the broker, with model greeks.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use wheel_advisor_core::{
    poll_until, BrokerProvider, ContractSpec, OptionChainParams, OptionContract, OptionGreeks,
    OptionRight, OptionSelection, PollPolicy, Result, SecType, Sleeper, TickerSnapshot, WheelError,
};

use crate::chain::{
    finite_or_zero, nearest_strike_index, price_or_zero, priced_contract, target_strike,
};
use crate::price::{qualify_first, PriceResolver};
use crate::session::BrokerSession;

/// Generic tick list for option implied volatility and model greeks.
pub const GREEKS_TICKS: &str = "106";

/// Strike multiples of spot used when a chain lists no strikes.
const SYNTHETIC_STRIKE_FACTORS: [&str; 9] =
    ["0.7", "0.8", "0.9", "0.95", "1.0", "1.05", "1.1", "1.2", "1.3"];

/// Earliest `YYYYMMDD` expiration on or after `today`.
pub fn next_expiration(expirations: &[String], today: NaiveDate) -> Option<String> {
    let today = today.format("%Y%m%d").to_string();
    expirations
        .iter()
        .filter(|e| e.len() == 8 && e.as_str() >= today.as_str())
        .min()
        .cloned()
}

/// Candidate strikes from the chain with the most strikes, or synthetic
/// multiples of spot when it lists none.
pub fn candidate_strikes(chains: &[OptionChainParams], spot: Decimal) -> (Vec<Decimal>, String) {
    let richest = chains.iter().max_by_key(|c| c.strikes.len());
    let exchange = richest
        .map(|c| c.exchange.clone())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "SMART".to_string());

    let listed: Vec<Decimal> = richest
        .map(|c| {
            c.strikes
                .iter()
                .filter(|s| s.is_finite() && **s > 0.0)
                .filter_map(|s| Decimal::try_from(*s).ok())
                .collect()
        })
        .unwrap_or_default();

    if !listed.is_empty() {
        return (listed, exchange);
    }

    let synthetic = SYNTHETIC_STRIKE_FACTORS
        .iter()
        .filter_map(|f| f.parse::<Decimal>().ok())
        .map(|f| spot * f)
        .collect();
    (synthetic, exchange)
}

fn contract_from_ticker(
    symbol: &str,
    qualified: &ContractSpec,
    strike: Decimal,
    right: OptionRight,
    ticker: &TickerSnapshot,
) -> OptionContract {
    let quote = |raw: f64| Some(raw).filter(|v| v.is_finite() && *v > 0.0);
    let greeks = ticker
        .model_greeks
        .map(|g| OptionGreeks {
            delta: finite_or_zero(Some(g.delta)),
            gamma: finite_or_zero(Some(g.gamma)),
            theta: finite_or_zero(Some(g.theta)),
            vega: finite_or_zero(Some(g.vega)),
        })
        .unwrap_or_default();

    let expiry = qualified.last_trade_date.clone().unwrap_or_default();
    let expiration = NaiveDate::parse_from_str(&expiry, "%Y%m%d").ok();
    let contract_id = qualified
        .con_id
        .map_or_else(|| format!("{symbol}{expiry}"), |id| id.to_string());

    let mut contract = priced_contract(
        symbol,
        contract_id,
        expiration,
        strike,
        right,
        price_or_zero(quote(ticker.bid)),
        price_or_zero(quote(ticker.ask)),
        price_or_zero(quote(ticker.last)),
        finite_or_zero(ticker.implied_volatility),
        greeks,
    );
    if expiration.is_none() {
        contract.expiration_label = expiry;
    }
    contract
}

/// Quotes one option through the broker: nearest listed strike in the next
/// expiration, with model greeks.
pub struct BrokerOptionQuoter<'a> {
    prices: PriceResolver<'a>,
    sleeper: &'a dyn Sleeper,
    policy: PollPolicy,
}

impl<'a> BrokerOptionQuoter<'a> {
    pub fn new(prices: PriceResolver<'a>, sleeper: &'a dyn Sleeper, policy: PollPolicy) -> Self {
        Self {
            prices,
            sleeper,
            policy,
        }
    }

    /// # Errors
    /// - [`WheelError::ConnectionFailed`] without a broker session
    /// - [`WheelError::Unqualified`] if the stock or option is unknown
    /// - [`WheelError::NoPriceData`] if no spot price is available
    /// - [`WheelError::NoOptionData`] if no chain or expiration is listed
    pub async fn quote(
        &self,
        session: &mut BrokerSession,
        symbol: &str,
        otm_pct: Decimal,
        right: OptionRight,
        today: NaiveDate,
    ) -> Result<OptionSelection> {
        let stock = {
            let broker = session.ensure_connected().await?;
            qualify_first(broker, &ContractSpec::stock(symbol)).await?
        };
        let con_id = stock
            .con_id
            .ok_or_else(|| WheelError::Unqualified(format!("{symbol} has no contract id")))?;

        let spot = self.prices.resolve(session, symbol).await?.price;
        let target = target_strike(spot, otm_pct, right);

        let broker = session.ensure_connected().await?;
        let chains = broker
            .sec_def_opt_params(symbol, "", &SecType::Stock, con_id)
            .await?;
        let Some(first) = chains.first() else {
            return Err(WheelError::no_option_data(symbol, "broker lists no option chains"));
        };
        let expiration = next_expiration(&first.expirations, today).ok_or_else(|| {
            WheelError::no_option_data(symbol, format!("no expiration on or after {today}"))
        })?;

        let (strikes, exchange) = candidate_strikes(&chains, spot);
        let strike = nearest_strike_index(&strikes, target)
            .map(|i| strikes[i])
            .ok_or_else(|| WheelError::no_option_data(symbol, "no strikes listed"))?;
        let strike_f64 = strike
            .to_f64()
            .ok_or_else(|| WheelError::InvalidInput(format!("strike {strike} out of range")))?;

        let spec = ContractSpec::option(symbol, &expiration, strike_f64, right, &exchange);
        let option = qualify_first(broker, &spec).await?;
        debug!(
            symbol,
            expiration = %expiration,
            %strike,
            exchange = %exchange,
            "Quoting option through broker"
        );

        broker.req_mkt_data(&option, GREEKS_TICKS).await?;
        let ticker = self.wait_for_greeks(broker, &option).await;
        if let Err(e) = broker.cancel_mkt_data(&option).await {
            warn!(symbol, error = %e, "Failed to cancel option market data");
        }
        let ticker = ticker?;

        Ok(OptionSelection {
            spot_price: spot,
            target_strike: target,
            contract: contract_from_ticker(symbol, &option, strike, right, &ticker),
        })
    }

    /// Polls until model greeks arrive, then returns the latest ticker
    /// whether or not they did.
    async fn wait_for_greeks(
        &self,
        broker: &dyn BrokerProvider,
        option: &ContractSpec,
    ) -> Result<TickerSnapshot> {
        let ready = poll_until(self.policy, self.sleeper, move || async move {
            let ticker = broker.ticker(option).await?;
            Ok::<_, WheelError>(ticker.model_greeks.is_some().then_some(ticker))
        })
        .await?;

        match ready {
            Some(ticker) => Ok(ticker),
            None => {
                debug!(symbol = %option.symbol, "Model greeks did not arrive");
                broker.ticker(option).await
            }
        }
    }
}
