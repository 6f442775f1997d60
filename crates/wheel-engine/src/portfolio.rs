//! Account balances and stock positions from the broker of record.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, warn};
use wheel_advisor_core::{
    AccountSummary, AccountValue, Portfolio, PortfolioItem, Position, Result, SecType, WheelError,
};

use crate::session::BrokerSession;

/// Folds account summary tags into an [`AccountSummary`]. Unknown tags and
/// unparseable values are ignored.
pub fn summarize(values: &[AccountValue]) -> AccountSummary {
    let mut summary = AccountSummary::default();
    for value in values {
        let slot = match value.tag.as_str() {
            "NetLiquidation" => &mut summary.net_liquidation,
            "TotalCashValue" => &mut summary.cash,
            "ExcessLiquidity" => &mut summary.excess_liquidity,
            "FullInitMarginReq" => &mut summary.initial_margin,
            _ => continue,
        };
        match Decimal::from_str(value.value.trim()) {
            Ok(amount) => *slot = Some(amount),
            Err(_) => warn!(tag = %value.tag, value = %value.value, "Unparseable account value"),
        }
    }
    summary
}

fn decimal(raw: f64) -> Decimal {
    if raw.is_finite() {
        Decimal::try_from(raw).unwrap_or_default()
    } else {
        Decimal::ZERO
    }
}

/// Stock positions only; options and other derivatives are dropped.
pub fn stock_positions(items: &[PortfolioItem]) -> Vec<Position> {
    items
        .iter()
        .filter(|item| item.contract.sec_type == SecType::Stock)
        .map(|item| Position {
            symbol: item.contract.symbol.clone(),
            shares: decimal(item.position),
            average_cost: decimal(item.average_cost),
            market_value: decimal(item.market_value),
            unrealized_pnl: decimal(item.unrealized_pnl),
        })
        .collect()
}

/// Reads the first managed account. No fallback provider exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortfolioResolver;

impl PortfolioResolver {
    /// # Errors
    /// - [`WheelError::ConnectionFailed`] if no session can be opened
    /// - [`WheelError::Provider`] if the broker has no managed account or
    ///   a request fails
    pub async fn resolve(&self, session: &mut BrokerSession) -> Result<Portfolio> {
        let broker = session.ensure_connected().await?;

        let account_id = broker
            .managed_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WheelError::Provider("broker reported no managed accounts".into()))?;

        let account = summarize(&broker.account_summary(&account_id).await?);
        let positions = stock_positions(&broker.portfolio().await?);

        debug!(
            account_id = %account_id,
            positions = positions.len(),
            "Portfolio resolved"
        );

        Ok(Portfolio {
            account_id,
            account,
            positions,
        })
    }
}
