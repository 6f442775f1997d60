//! Engine requests and their rendering, shared by subcommands and chat.

use rust_decimal::Decimal;
use wheel_advisor_core::{OptionRight, Result};
use wheel_advisor_engine::WheelService;

use crate::format;

/// One engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Price {
        symbol: String,
    },
    Options {
        symbol: String,
        otm_pct: Decimal,
        right: OptionRight,
    },
    Wheel {
        symbol: String,
        cash: Option<Decimal>,
    },
    Portfolio,
    BrokerOption {
        symbol: String,
        otm_pct: Decimal,
        right: OptionRight,
    },
}

/// Runs a request and renders its result, as pretty JSON when `json` is set.
pub async fn execute(service: &WheelService, request: Request, json: bool) -> Result<String> {
    let rendered = match request {
        Request::Price { symbol } => {
            let quote = service.get_price(&symbol).await?;
            render(json, &quote, || format::price(&quote))
        }
        Request::Options {
            symbol,
            otm_pct,
            right,
        } => {
            let selection = service.get_options(&symbol, otm_pct, right).await?;
            render(json, &selection, || format::selection(&selection, otm_pct))
        }
        Request::Wheel { symbol, cash } => {
            let rec = service.recommend(&symbol, cash).await?;
            render(json, &rec, || format::recommendation(&rec))
        }
        Request::Portfolio => {
            let portfolio = service.get_portfolio().await?;
            render(json, &portfolio, || format::portfolio(&portfolio))
        }
        Request::BrokerOption {
            symbol,
            otm_pct,
            right,
        } => {
            let selection = service
                .quote_option_via_broker(&symbol, otm_pct, right)
                .await?;
            render(json, &selection, || format::selection(&selection, otm_pct))
        }
    };
    Ok(rendered)
}

fn render<T: serde::Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> String {
    if json {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    } else {
        text()
    }
}
