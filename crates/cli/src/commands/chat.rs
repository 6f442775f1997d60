//! Free-text command dispatch, e.g. `option NVDA 15 call`.

use rust_decimal::Decimal;
use thiserror::Error;
use wheel_advisor_core::OptionRight;

use super::Request;

const DEFAULT_OTM_PCT: Decimal = Decimal::TEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Please provide a ticker symbol, e.g. `wheel NVDA`")]
    MissingSymbol,

    #[error("Unknown command: {0}. Available: price, options, wheel, portfolio")]
    UnknownCommand(String),
}

/// Maps a free-text command and its arguments to a [`Request`].
///
/// The first argument is always the symbol. Keywords are matched as
/// substrings in a fixed order, so `options` hits `option` and `wheelie`
/// hits `wheel`.
pub fn parse_chat(command: &str, args: &[String]) -> std::result::Result<Request, ChatError> {
    let Some(symbol) = args.first().map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty())
    else {
        return Err(ChatError::MissingSymbol);
    };
    let command_lower = command.to_lowercase();
    let has = |keywords: &[&str]| keywords.iter().any(|k| command_lower.contains(k));

    if has(&["price", "股價"]) {
        Ok(Request::Price { symbol })
    } else if has(&["option", "期權"]) {
        let mut otm_pct = DEFAULT_OTM_PCT;
        let mut right = OptionRight::Put;
        for arg in &args[1..] {
            if !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(value) = arg.parse::<Decimal>() {
                    otm_pct = value;
                }
            } else if let Ok(parsed) = arg.parse::<OptionRight>() {
                right = parsed;
            }
        }
        Ok(Request::Options {
            symbol,
            otm_pct,
            right,
        })
    } else if has(&["wheel"]) {
        Ok(Request::Wheel { symbol, cash: None })
    } else if has(&["portfolio", "持倉", "帳戶"]) {
        Ok(Request::Portfolio)
    } else {
        Err(ChatError::UnknownCommand(command.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_missing_symbol() {
        assert_eq!(parse_chat("price", &[]), Err(ChatError::MissingSymbol));
        assert_eq!(parse_chat("price", &args(&[" "])), Err(ChatError::MissingSymbol));
    }

    #[test]
    fn test_price_keywords() {
        let expected = Request::Price {
            symbol: "NVDA".to_string(),
        };
        assert_eq!(parse_chat("price", &args(&["nvda"])), Ok(expected.clone()));
        assert_eq!(parse_chat("股價", &args(&["nvda"])), Ok(expected));
    }

    #[test]
    fn test_option_defaults() {
        assert_eq!(
            parse_chat("options", &args(&["aapl"])),
            Ok(Request::Options {
                symbol: "AAPL".to_string(),
                otm_pct: dec!(10),
                right: OptionRight::Put,
            })
        );
    }

    #[test]
    fn test_option_arguments() {
        assert_eq!(
            parse_chat("期權", &args(&["aapl", "15", "c"])),
            Ok(Request::Options {
                symbol: "AAPL".to_string(),
                otm_pct: dec!(15),
                right: OptionRight::Call,
            })
        );
        // Non-integer OTM values and unknown words are ignored.
        assert_eq!(
            parse_chat("option", &args(&["aapl", "7.5", "weekly", "PUT"])),
            Ok(Request::Options {
                symbol: "AAPL".to_string(),
                otm_pct: dec!(10),
                right: OptionRight::Put,
            })
        );
    }

    #[test]
    fn test_far_otm_call() {
        assert_eq!(
            parse_chat("option", &args(&["nvda", "150", "call"])),
            Ok(Request::Options {
                symbol: "NVDA".to_string(),
                otm_pct: dec!(150),
                right: OptionRight::Call,
            })
        );
    }

    #[test]
    fn test_wheel_and_portfolio() {
        assert_eq!(
            parse_chat("wheel", &args(&["tsla"])),
            Ok(Request::Wheel {
                symbol: "TSLA".to_string(),
                cash: None,
            })
        );
        assert_eq!(parse_chat("portfolio", &args(&["tsla"])), Ok(Request::Portfolio));
        assert_eq!(parse_chat("帳戶", &args(&["tsla"])), Ok(Request::Portfolio));
    }

    #[test]
    fn test_keyword_order() {
        // "price" wins over "option" when both appear.
        assert_eq!(
            parse_chat("option-price", &args(&["x"])),
            Ok(Request::Price {
                symbol: "X".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_chat("buy", &args(&["tsla"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown command: buy. Available: price, options, wheel, portfolio"
        );
    }
}
