//! Option chain lookup: target strike, nearest contract, mid-price ladder.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;
use wheel_advisor_core::{
    usable_price, ChainRow, OptionContract, OptionGreeks, OptionRight, OptionSelection, Result,
    SnapshotProvider, WheelError, CONTRACT_MULTIPLIER,
};

use crate::price::snapshot_spot;

/// Strike `otm_pct` percent out of the money, rounded to a whole dollar.
///
/// Exact halves round to the even dollar (97.5 -> 98, 96.5 -> 96).
pub fn target_strike(spot: Decimal, otm_pct: Decimal, right: OptionRight) -> Decimal {
    let shift = otm_pct / Decimal::ONE_HUNDRED;
    let raw = match right {
        OptionRight::Put => spot * (Decimal::ONE - shift),
        OptionRight::Call => spot * (Decimal::ONE + shift),
    };
    raw.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Index of the strike closest to `target`. Ties go to the lowest strike.
pub fn nearest_strike_index(strikes: &[Decimal], target: Decimal) -> Option<usize> {
    let mut order: Vec<usize> = (0..strikes.len()).collect();
    order.sort_by(|a, b| strikes[*a].cmp(&strikes[*b]));

    // min_by_key keeps the first minimum.
    order
        .into_iter()
        .min_by_key(|i| (strikes[*i] - target).abs())
}

/// Mid price ladder: both sides, bid, ask, last, else zero.
pub fn mid_price(bid: Decimal, ask: Decimal, last: Decimal) -> Decimal {
    let zero = Decimal::ZERO;
    if bid > zero && ask > zero {
        (bid + ask) / Decimal::TWO
    } else if bid > zero {
        bid
    } else if ask > zero {
        ask
    } else if last > zero {
        last
    } else {
        zero
    }
}

/// Display expiration for a contract: the structured date when present,
/// else the identifier's trailing eight characters.
pub fn expiration_label(expiration: Option<NaiveDate>, contract_id: &str) -> String {
    if let Some(date) = expiration {
        return date.format("%Y-%m-%d").to_string();
    }
    let chars: Vec<char> = contract_id.chars().collect();
    if chars.len() >= 8 {
        chars[chars.len() - 8..].iter().collect()
    } else {
        String::new()
    }
}

/// Provider quote or zero.
pub(crate) fn price_or_zero(raw: Option<f64>) -> Decimal {
    raw.and_then(usable_price).unwrap_or(Decimal::ZERO)
}

/// Greek or IV value, zero when absent or not a number.
pub(crate) fn finite_or_zero(raw: Option<f64>) -> f64 {
    raw.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Builds a priced contract from raw quotes.
#[allow(clippy::too_many_arguments)]
pub(crate) fn priced_contract(
    symbol: &str,
    contract_id: String,
    expiration: Option<NaiveDate>,
    strike: Decimal,
    right: OptionRight,
    bid: Decimal,
    ask: Decimal,
    last: Decimal,
    implied_volatility: f64,
    greeks: OptionGreeks,
) -> OptionContract {
    let mid = mid_price(bid, ask, last);
    OptionContract {
        symbol: symbol.to_string(),
        expiration_label: expiration_label(expiration, &contract_id),
        contract_id,
        expiration,
        strike,
        right,
        bid,
        ask,
        last,
        mid,
        premium: mid * CONTRACT_MULTIPLIER,
        implied_volatility,
        greeks,
    }
}

fn contract_from_row(symbol: &str, row: &ChainRow, strike: Decimal, right: OptionRight) -> OptionContract {
    priced_contract(
        symbol,
        row.contract_identifier.clone(),
        row.expiration,
        strike,
        right,
        price_or_zero(row.bid),
        price_or_zero(row.ask),
        price_or_zero(row.last_price),
        finite_or_zero(row.implied_volatility),
        OptionGreeks {
            delta: finite_or_zero(row.delta),
            gamma: finite_or_zero(row.gamma),
            theta: finite_or_zero(row.theta),
            vega: finite_or_zero(row.vega),
        },
    )
}

/// Picks the contract nearest a target strike from the snapshot chain.
///
/// Chains come only from the snapshot provider. The spot used for the
/// strike math is read from the same provider, not from [`crate::PriceResolver`].
pub struct OptionChainResolver<'a> {
    snapshot: &'a dyn SnapshotProvider,
}

impl<'a> OptionChainResolver<'a> {
    pub fn new(snapshot: &'a dyn SnapshotProvider) -> Self {
        Self { snapshot }
    }

    /// # Errors
    /// - [`WheelError::InvalidInput`] for a negative OTM percent, or a put
    ///   at 100% or more
    /// - [`WheelError::Provider`] if the snapshot cannot be fetched
    /// - [`WheelError::NoPriceData`] if it has no usable spot price
    /// - [`WheelError::NoOptionData`] if the chain side is empty
    pub async fn resolve(
        &self,
        symbol: &str,
        otm_pct: Decimal,
        right: OptionRight,
    ) -> Result<OptionSelection> {
        if otm_pct < Decimal::ZERO {
            return Err(WheelError::InvalidInput(format!(
                "OTM percent must not be negative, got {otm_pct}"
            )));
        }
        // A put 100% or more below spot has no positive strike.
        if right == OptionRight::Put && otm_pct >= Decimal::ONE_HUNDRED {
            return Err(WheelError::InvalidInput(format!(
                "put OTM percent must be below 100, got {otm_pct}"
            )));
        }

        let info = self
            .snapshot
            .fetch_info(symbol)
            .await
            .map_err(|e| match e {
                WheelError::Provider(_) | WheelError::InvalidInput(_) => e,
                other => WheelError::provider(other),
            })?;
        let spot = snapshot_spot(&info).ok_or_else(|| WheelError::no_price(symbol))?;
        let target = target_strike(spot, otm_pct, right);

        let chain = self.snapshot.fetch_option_chain(symbol).await?;
        let rows: Vec<(&ChainRow, Decimal)> = chain
            .side(right)
            .iter()
            .filter_map(|row| usable_price(row.strike).map(|strike| (row, strike)))
            .collect();

        if rows.is_empty() {
            return Err(WheelError::no_option_data(
                symbol,
                format!("no {right} contracts in nearest expiration"),
            ));
        }

        let strikes: Vec<Decimal> = rows.iter().map(|(_, strike)| *strike).collect();
        let Some(index) = nearest_strike_index(&strikes, target) else {
            return Err(WheelError::no_option_data(symbol, "no strike near target"));
        };
        let (row, strike) = rows[index];

        let contract = contract_from_row(symbol, row, strike, right);
        debug!(
            symbol,
            %spot,
            %target,
            strike = %contract.strike,
            premium = %contract.premium,
            "Selected option"
        );

        Ok(OptionSelection {
            spot_price: spot,
            target_strike: target,
            contract,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, FakeSnapshot};
    use rust_decimal_macros::dec;
    use wheel_advisor_core::{ChainSnapshot, SnapshotInfo};

    #[test]
    fn test_target_strike() {
        assert_eq!(target_strike(dec!(100), dec!(10), OptionRight::Put), dec!(90));
        assert_eq!(target_strike(dec!(100), dec!(10), OptionRight::Call), dec!(110));
        assert_eq!(target_strike(dec!(45), dec!(10), OptionRight::Put), dec!(40));
        assert_eq!(target_strike(dec!(187.3), dec!(5), OptionRight::Put), dec!(178));
    }

    #[test]
    fn test_target_strike_half_rounds_to_even() {
        assert_eq!(target_strike(dec!(97.5), dec!(0), OptionRight::Put), dec!(98));
        assert_eq!(target_strike(dec!(96.5), dec!(0), OptionRight::Put), dec!(96));
    }

    #[test]
    fn test_nearest_strike() {
        let strikes = [dec!(90), dec!(95), dec!(100), dec!(105), dec!(110)];
        assert_eq!(nearest_strike_index(&strikes, dec!(97)), Some(1));
        assert_eq!(nearest_strike_index(&strikes, dec!(200)), Some(4));
        assert_eq!(nearest_strike_index(&[], dec!(97)), None);
    }

    #[test]
    fn test_nearest_strike_tie_takes_lower() {
        assert_eq!(nearest_strike_index(&[dec!(95), dec!(100)], dec!(97.5)), Some(0));
        assert_eq!(nearest_strike_index(&[dec!(100), dec!(95)], dec!(97.5)), Some(1));
    }

    #[test]
    fn test_mid_price_ladder() {
        assert_eq!(mid_price(dec!(1.0), dec!(1.4), dec!(0)), dec!(1.2));
        assert_eq!(mid_price(dec!(1.0), dec!(0), dec!(3)), dec!(1.0));
        assert_eq!(mid_price(dec!(0), dec!(1.4), dec!(3)), dec!(1.4));
        assert_eq!(mid_price(dec!(0), dec!(0), dec!(2.0)), dec!(2.0));
        assert_eq!(mid_price(dec!(0), dec!(0), dec!(0)), dec!(0));
    }

    #[test]
    fn test_expiration_label() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 20);
        assert_eq!(expiration_label(date, "XYZ260320P00090000"), "2026-03-20");
        assert_eq!(expiration_label(None, "XYZ260320P00090000"), "00090000");
        assert_eq!(expiration_label(None, "XYZ"), "");
    }

    fn chain(puts: Vec<ChainRow>) -> ChainSnapshot {
        ChainSnapshot {
            puts,
            calls: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_resolve_selects_nearest_put() {
        let snapshot = FakeSnapshot::new().with_price(108.0).with_chain(chain(vec![
            row(110.0, Some(5.0), Some(5.4), None),
            row(90.0, Some(0.5), Some(0.7), None),
            row(95.0, Some(1.0), Some(1.4), None),
            row(100.0, Some(2.0), Some(2.4), None),
        ]));

        let selection = OptionChainResolver::new(&snapshot)
            .resolve("XYZ", dec!(10), OptionRight::Put)
            .await
            .unwrap();

        // 108 * 0.9 = 97.2 -> 97
        assert_eq!(selection.target_strike, dec!(97));
        assert_eq!(selection.spot_price, dec!(108));
        assert_eq!(selection.contract.strike, dec!(95));
        assert_eq!(selection.contract.mid, dec!(1.2));
        assert_eq!(selection.contract.premium, dec!(120));
        assert_eq!(selection.contract.greeks, OptionGreeks::default());
        assert_eq!(selection.contract.expiration_label, "00095000");
    }

    #[tokio::test]
    async fn test_unpriced_contract_still_returned() {
        let snapshot = FakeSnapshot::new()
            .with_price(100.0)
            .with_chain(chain(vec![row(90.0, Some(f64::NAN), None, Some(0.0))]));

        let selection = OptionChainResolver::new(&snapshot)
            .resolve("XYZ", dec!(10), OptionRight::Put)
            .await
            .unwrap();

        assert_eq!(selection.contract.premium, dec!(0));
        assert!(!selection.contract.is_priced());
    }

    #[tokio::test]
    async fn test_empty_side_is_no_option_data() {
        let snapshot = FakeSnapshot::new()
            .with_price(100.0)
            .with_chain(chain(vec![row(90.0, Some(1.0), None, None)]));

        let err = OptionChainResolver::new(&snapshot)
            .resolve("XYZ", dec!(10), OptionRight::Call)
            .await
            .unwrap_err();

        assert!(matches!(err, WheelError::NoOptionData { .. }));
    }

    #[tokio::test]
    async fn test_missing_spot_is_no_price() {
        let snapshot = FakeSnapshot::new()
            .with_info(SnapshotInfo::default())
            .with_chain(chain(vec![row(90.0, Some(1.0), None, None)]));

        let err = OptionChainResolver::new(&snapshot)
            .resolve("XYZ", dec!(10), OptionRight::Put)
            .await
            .unwrap_err();

        assert_eq!(err, WheelError::no_price("XYZ"));
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_provider_error() {
        let snapshot = FakeSnapshot::new().with_info_error(WheelError::ConnectionFailed("dns".into()));

        let err = OptionChainResolver::new(&snapshot)
            .resolve("XYZ", dec!(10), OptionRight::Put)
            .await
            .unwrap_err();

        assert!(matches!(err, WheelError::Provider(_)));
    }

    #[tokio::test]
    async fn test_rejects_put_at_or_beyond_full_otm() {
        let snapshot = FakeSnapshot::new().with_price(100.0);
        let resolver = OptionChainResolver::new(&snapshot);

        for otm in [dec!(100), dec!(150)] {
            let err = resolver
                .resolve("XYZ", otm, OptionRight::Put)
                .await
                .unwrap_err();
            assert!(matches!(err, WheelError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_rejects_negative_otm() {
        let snapshot = FakeSnapshot::new().with_price(100.0);

        let err = OptionChainResolver::new(&snapshot)
            .resolve("XYZ", dec!(-5), OptionRight::Call)
            .await
            .unwrap_err();

        assert!(matches!(err, WheelError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_far_otm_call_resolves() {
        let snapshot = FakeSnapshot::new().with_price(100.0).with_chain(ChainSnapshot {
            puts: Vec::new(),
            calls: vec![
                row(250.0, Some(0.05), Some(0.15), None),
                row(110.0, Some(1.0), Some(1.2), None),
            ],
        });
        let resolver = OptionChainResolver::new(&snapshot);

        let selection = resolver
            .resolve("XYZ", dec!(150), OptionRight::Call)
            .await
            .unwrap();
        assert_eq!(selection.target_strike, dec!(250));
        assert_eq!(selection.contract.strike, dec!(250));
        assert_eq!(selection.contract.premium, dec!(10));

        let selection = resolver
            .resolve("XYZ", dec!(100), OptionRight::Call)
            .await
            .unwrap();
        assert_eq!(selection.target_strike, dec!(200));
        assert_eq!(selection.contract.strike, dec!(250));
    }
}
