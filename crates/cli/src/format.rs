//! Human-readable rendering of engine results.

use rust_decimal::Decimal;
use wheel_advisor_core::{
    OptionSelection, Portfolio, PositionProvenance, Quote, Recommendation, WheelError,
};

fn money(value: Decimal) -> String {
    let fixed = format!("{:.2}", value.abs().round_dp(2));
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < Decimal::ZERO { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

fn optional_money(value: Option<Decimal>) -> String {
    value.map_or_else(|| "n/a".to_string(), money)
}

pub fn price(quote: &Quote) -> String {
    format!(
        "**{}** current price: **{}** (source: {})",
        quote.symbol,
        money(quote.price),
        quote.source
    )
}

pub fn selection(selection: &OptionSelection, otm_pct: Decimal) -> String {
    let contract = &selection.contract;
    let mut lines = vec![
        format!(
            "**{}** option data (OTM {}% {}):",
            contract.symbol,
            otm_pct.normalize(),
            contract.right
        ),
        format!("• Spot: {}", money(selection.spot_price)),
        format!(
            "• Strike: {} (target {})",
            money(contract.strike),
            money(selection.target_strike)
        ),
        format!("• Expiration: {}", contract.expiration_label),
        format!(
            "• Bid: {} | Ask: {} | Last: {}",
            money(contract.bid),
            money(contract.ask),
            money(contract.last)
        ),
        format!("• IV: {:.1}%", contract.implied_volatility * 100.0),
        format!(
            "• Delta: {:.3} | Theta: {:.3}",
            contract.greeks.delta, contract.greeks.theta
        ),
        format!("• Premium: {}/contract", money(contract.premium)),
    ];
    if !contract.is_priced() {
        lines.push("• No bid, ask or last price; contract is unpriced".to_string());
    }
    lines.join("\n")
}

pub fn recommendation(rec: &Recommendation) -> String {
    let mut lines = vec![
        format!("**{}** wheel recommendation:", rec.symbol),
        format!("• Action: **{}**", rec.action),
        format!("• {}", rec.description),
        format!("• Expiration: {}", rec.expiration_label),
    ];
    if let (Some(collateral), Some(contracts), Some(max_premium)) =
        (rec.collateral, rec.max_contracts, rec.max_premium)
    {
        lines.push(format!("• Collateral: {}/contract", money(collateral)));
        lines.push(format!(
            "• Max contracts: {contracts} (up to {} premium)",
            money(max_premium)
        ));
    }
    lines.push(format!("• Price source: {}", rec.price_source));
    if let PositionProvenance::Unavailable { reason } = &rec.position_source {
        lines.push(format!("• Positions unavailable, assumed none ({reason})"));
    }
    lines.join("\n")
}

pub fn portfolio(portfolio: &Portfolio) -> String {
    let account = &portfolio.account;
    let mut lines = vec![
        format!("**Account {}:**", portfolio.account_id),
        format!("• Net liquidation: {}", optional_money(account.net_liquidation)),
        format!("• Cash: {}", optional_money(account.cash)),
        format!("• Excess liquidity: {}", optional_money(account.excess_liquidity)),
        format!("• Initial margin: {}", optional_money(account.initial_margin)),
    ];

    if portfolio.positions.is_empty() {
        lines.push(String::new());
        lines.push("No stock positions".to_string());
    } else {
        lines.push(String::new());
        lines.push(format!("**Positions ({}):**", portfolio.positions.len()));
        for p in &portfolio.positions {
            lines.push(format!(
                "• {}: {} shares @ {} (value {}, PnL {})",
                p.symbol,
                p.shares.normalize(),
                money(p.average_cost),
                money(p.market_value),
                money(p.unrealized_pnl)
            ));
        }
    }
    lines.join("\n")
}

pub fn error(err: &WheelError) -> String {
    format!("Error: {err}")
}
