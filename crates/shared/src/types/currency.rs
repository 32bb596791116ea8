//! Supported currency codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A currency an account can be denominated in.
///
/// Balances are always stored in the smallest unit of the currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
    /// Canadian dollar.
    Cad,
}

/// Returned when a currency code is not supported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported currency: {0}")]
pub struct UnsupportedCurrency(pub String);

impl Currency {
    /// All supported currencies.
    pub const ALL: [Self; 3] = [Self::Usd, Self::Eur, Self::Cad];

    /// Returns the ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Cad => "CAD",
        }
    }

    /// Returns true if `code` names a supported currency.
    #[must_use]
    pub fn is_supported(code: &str) -> bool {
        code.parse::<Self>().is_ok()
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "CAD" => Ok(Self::Cad),
            other => Err(UnsupportedCurrency(other.to_string())),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = UnsupportedCurrency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("USD", Currency::Usd)]
    #[case("EUR", Currency::Eur)]
    #[case("CAD", Currency::Cad)]
    fn test_parse_supported(#[case] code: &str, #[case] expected: Currency) {
        assert_eq!(code.parse::<Currency>().unwrap(), expected);
        assert_eq!(expected.to_string(), code);
    }

    #[rstest]
    #[case("usd")]
    #[case("GBP")]
    #[case("")]
    fn test_parse_unsupported(#[case] code: &str) {
        assert_eq!(
            code.parse::<Currency>(),
            Err(UnsupportedCurrency(code.to_string()))
        );
        assert!(!Currency::is_supported(code));
    }

    #[test]
    fn test_all_codes_round_trip() {
        for currency in Currency::ALL {
            assert!(Currency::is_supported(currency.code()));
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
    }

    #[test]
    fn test_serde_uses_code() {
        assert_eq!(serde_json::to_string(&Currency::Eur).unwrap(), "\"EUR\"");
        assert!(serde_json::from_str::<Currency>("\"JPY\"").is_err());
    }
}
