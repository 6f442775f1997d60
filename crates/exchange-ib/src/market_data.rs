//! Market data: snapshot subscriptions and tick decoding.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;
use wheel_advisor_core::{MarketDataType, ModelGreeks, TickerSnapshot};

use crate::client::IBClient;
use crate::error::{IbError, Result};

/// Last price.
pub const FIELD_LAST: &str = "31";
pub const FIELD_BID: &str = "84";
pub const FIELD_ASK: &str = "86";
/// Prior session close.
pub const FIELD_PRIOR_CLOSE: &str = "7741";
pub const FIELD_DELTA: &str = "7308";
pub const FIELD_GAMMA: &str = "7309";
pub const FIELD_THETA: &str = "7310";
pub const FIELD_VEGA: &str = "7311";
/// Option implied volatility, in percent.
pub const FIELD_IMPLIED_VOL: &str = "7633";
/// Market data availability. First letter R = realtime, D = delayed, Z = frozen.
pub const FIELD_AVAILABILITY: &str = "6509";

/// Every field requested on a snapshot.
pub const SNAPSHOT_FIELDS: &str = "31,84,86,7741,7308,7309,7310,7311,7633,6509";

/// Raw field map of one snapshot row.
pub type SnapshotFields = HashMap<String, Value>;

impl IBClient {
    /// Requests (or refreshes) a snapshot for a contract id.
    ///
    /// The first call opens the subscription and usually returns only the
    /// contract id; later calls carry the ticks received so far.
    pub async fn request_snapshot(&self, con_id: i64) -> Result<SnapshotFields> {
        debug!(con_id, "Requesting market data snapshot");
        let rows: Vec<SnapshotFields> = self
            .get(
                "/iserver/marketdata/snapshot",
                &[
                    ("conids", con_id.to_string()),
                    ("fields", SNAPSHOT_FIELDS.to_string()),
                ],
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| IbError::api(200, format!("empty snapshot for conid {con_id}")))
    }

    /// Reads the current state of a subscription as a ticker.
    pub async fn ticker_snapshot(&self, con_id: i64) -> Result<TickerSnapshot> {
        let fields = self.request_snapshot(con_id).await?;
        Ok(ticker_from_fields(&fields, self.market_data_type()))
    }

    /// Stops streaming for one contract id.
    pub async fn unsubscribe(&self, con_id: i64) -> Result<()> {
        debug!(con_id, "Cancelling market data");
        let _: Value = self
            .post(
                "/iserver/marketdata/unsubscribe",
                &serde_json::json!({ "conid": con_id }),
            )
            .await?;
        Ok(())
    }
}

/// Parses a snapshot value. The gateway prefixes prices with status letters
/// ("C" closing, "H" halted) and formats volumes and percentages as text.
pub fn parse_field(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let cleaned: String = s
                .trim_start_matches(|c: char| c.is_ascii_alphabetic())
                .chars()
                .filter(|c| *c != ',' && *c != '%')
                .collect();
            cleaned.trim().parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

fn field(fields: &SnapshotFields, key: &str) -> f64 {
    fields.get(key).map_or(f64::NAN, parse_field)
}

/// Best single price: last if it sits inside the spread, else the midpoint,
/// else whatever last is.
pub fn market_price(last: f64, bid: f64, ask: f64) -> f64 {
    let spread_known = bid.is_finite() && ask.is_finite() && bid > 0.0 && ask > 0.0;
    if last.is_finite() && (!spread_known || (bid <= last && last <= ask)) {
        last
    } else if spread_known {
        (bid + ask) / 2.0
    } else {
        last
    }
}

/// Decodes a snapshot row. In live mode a row without realtime
/// availability has no market price.
pub fn ticker_from_fields(fields: &SnapshotFields, mode: MarketDataType) -> TickerSnapshot {
    let last = field(fields, FIELD_LAST);
    let bid = field(fields, FIELD_BID);
    let ask = field(fields, FIELD_ASK);

    let realtime = fields
        .get(FIELD_AVAILABILITY)
        .and_then(Value::as_str)
        .map_or(false, |a| a.starts_with('R'));

    let market_price = if mode == MarketDataType::Live && !realtime {
        f64::NAN
    } else {
        market_price(last, bid, ask)
    };

    let implied_volatility = Some(field(fields, FIELD_IMPLIED_VOL) / 100.0).filter(|v| v.is_finite());

    let model_greeks = fields.contains_key(FIELD_DELTA).then(|| ModelGreeks {
        delta: field(fields, FIELD_DELTA),
        gamma: field(fields, FIELD_GAMMA),
        theta: field(fields, FIELD_THETA),
        vega: field(fields, FIELD_VEGA),
    });

    TickerSnapshot {
        market_price,
        close: field(fields, FIELD_PRIOR_CLOSE),
        bid,
        ask,
        last,
        implied_volatility,
        model_greeks,
    }
}
