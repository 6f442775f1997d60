//! Wheel strategy decision: cash-secured put when flat, covered call when long.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};
use wheel_advisor_core::{
    OptionRight, OptionSelection, PositionProvenance, Quote, Recommendation, Result, WheelAction,
    CONTRACT_MULTIPLIER,
};

use crate::chain::OptionChainResolver;
use crate::portfolio::PortfolioResolver;
use crate::price::PriceResolver;
use crate::session::BrokerSession;

/// Moneyness of every recommended contract.
pub const WHEEL_OTM_PCT: Decimal = Decimal::TEN;

/// Contracts the available cash can secure at the current spot. One when
/// no cash figure is given.
pub fn max_contracts(cash: Option<Decimal>, spot: Decimal) -> u32 {
    let Some(cash) = cash else {
        return 1;
    };
    let per_contract = spot * CONTRACT_MULTIPLIER;
    if per_contract <= Decimal::ZERO || cash <= Decimal::ZERO {
        return 0;
    }
    (cash / per_contract).floor().to_u32().unwrap_or(u32::MAX)
}

/// Put return on collateral, in percent. Zero without collateral.
pub fn put_return_pct(premium: Decimal, strike: Decimal) -> Decimal {
    let collateral = strike * CONTRACT_MULTIPLIER;
    if collateral <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    premium / collateral * Decimal::ONE_HUNDRED
}

/// Call return on spot, in percent. Zero for a non-positive spot.
pub fn call_return_pct(premium: Decimal, spot: Decimal) -> Decimal {
    if spot <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    premium / spot * Decimal::ONE_HUNDRED
}

/// Combines spot, position and chain into one recommendation.
pub struct WheelDecisionEngine<'a> {
    prices: PriceResolver<'a>,
    chains: OptionChainResolver<'a>,
    portfolio: PortfolioResolver,
}

impl<'a> WheelDecisionEngine<'a> {
    pub fn new(prices: PriceResolver<'a>, chains: OptionChainResolver<'a>) -> Self {
        Self {
            prices,
            chains,
            portfolio: PortfolioResolver,
        }
    }

    /// Recommends a trade for `symbol`.
    ///
    /// An unreachable portfolio is treated as "not held" and reported via
    /// [`PositionProvenance::Unavailable`]. Every other error is returned
    /// unchanged.
    pub async fn recommend(
        &self,
        session: &mut BrokerSession,
        symbol: &str,
        cash: Option<Decimal>,
    ) -> Result<Recommendation> {
        let quote = self.prices.resolve(session, symbol).await?;

        let (held_long, position_source) = match self.portfolio.resolve(session).await {
            Ok(portfolio) => (portfolio.holds_long(symbol), PositionProvenance::Broker),
            Err(e) => {
                warn!(symbol, error = %e, "Portfolio unavailable, assuming no position");
                (
                    false,
                    PositionProvenance::Unavailable {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let recommendation = if held_long {
            let selection = self
                .chains
                .resolve(symbol, WHEEL_OTM_PCT, OptionRight::Call)
                .await?;
            covered_call(&quote, &selection, position_source)
        } else {
            let selection = self
                .chains
                .resolve(symbol, WHEEL_OTM_PCT, OptionRight::Put)
                .await?;
            cash_secured_put(&quote, &selection, cash, position_source)
        };

        if recommendation.premium <= Decimal::ZERO {
            warn!(symbol, strike = %recommendation.strike, "Selected contract has no price");
        }
        info!(
            symbol,
            action = %recommendation.action,
            strike = %recommendation.strike,
            premium = %recommendation.premium,
            "Wheel recommendation"
        );
        Ok(recommendation)
    }
}

/// Sell-put branch.
pub fn cash_secured_put(
    quote: &Quote,
    selection: &OptionSelection,
    cash: Option<Decimal>,
    position_source: PositionProvenance,
) -> Recommendation {
    let contract = &selection.contract;
    let spot = quote.price;
    let collateral = contract.strike * CONTRACT_MULTIPLIER;
    let premium = contract.premium.round_dp(2);
    let return_pct = put_return_pct(contract.premium, contract.strike).round_dp(2);
    let contracts = max_contracts(cash, spot);
    let max_premium = (contract.premium * Decimal::from(contracts)).round_dp(2);

    Recommendation {
        action: WheelAction::SellPut,
        symbol: quote.symbol.clone(),
        spot_price: spot,
        price_source: quote.source,
        strike: contract.strike,
        expiration_label: contract.expiration_label.clone(),
        premium,
        return_pct,
        collateral: Some(collateral),
        max_contracts: Some(contracts),
        max_premium: Some(max_premium),
        position_source,
        description: format!(
            "Spot ${:.2}, sell {} Put, collect ${:.2}/contract ({:.2}% return)",
            spot.round_dp(2),
            contract.strike.normalize(),
            premium,
            return_pct
        ),
    }
}

/// Sell-call branch.
pub fn covered_call(
    quote: &Quote,
    selection: &OptionSelection,
    position_source: PositionProvenance,
) -> Recommendation {
    let contract = &selection.contract;
    let spot = quote.price;
    let premium = contract.premium.round_dp(2);
    let return_pct = call_return_pct(contract.premium, spot).round_dp(2);

    Recommendation {
        action: WheelAction::SellCall,
        symbol: quote.symbol.clone(),
        spot_price: spot,
        price_source: quote.source,
        strike: contract.strike,
        expiration_label: contract.expiration_label.clone(),
        premium,
        return_pct,
        collateral: None,
        max_contracts: None,
        max_premium: None,
        position_source,
        description: format!(
            "Spot ${:.2}, sell {} Call, collect ${:.2}/contract ({:.2}% monthly return)",
            spot.round_dp(2),
            contract.strike.normalize(),
            premium,
            return_pct
        ),
    }
}
