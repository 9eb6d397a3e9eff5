//! Ticker symbols: validation and search results.

use serde::Serialize;

use crate::providers::{ProviderError, ValidationSnafu};

const MAX_SYMBOL_LEN: usize = 15;

/// Checks a ticker before it is interpolated into a vendor URL path.
///
/// Accepts the characters used by equities, indices and FX pairs on the
/// supported vendors (`BRK.B`, `^GSPC`, `BTC-USD`, `EURUSD=X`).
pub fn validate_symbol(symbol: &str) -> Result<String, ProviderError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return ValidationSnafu {
            message: "symbol must not be empty",
        }
        .fail();
    }
    if trimmed.len() > MAX_SYMBOL_LEN {
        return ValidationSnafu {
            message: format!("symbol longer than {MAX_SYMBOL_LEN} characters: {trimmed}"),
        }
        .fail();
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return ValidationSnafu {
            message: format!("invalid character {bad:?} in symbol {trimmed}"),
        }
        .fail();
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// One autocomplete hit from a symbol search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub exchange: Option<String>,
    pub quote_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_tickers() {
        assert_eq!(validate_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(validate_symbol("BRK.B").unwrap(), "BRK.B");
        assert_eq!(validate_symbol("^gspc").unwrap(), "^GSPC");
        assert_eq!(validate_symbol("EURUSD=X").unwrap(), "EURUSD=X");
    }

    #[test]
    fn rejects_path_tricks() {
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("AAPL/../x").is_err());
        assert!(validate_symbol("A?B").is_err());
        assert!(validate_symbol("ABCDEFGHIJKLMNOP").is_err());
    }
}
