use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Code of the home-denomination balance every wallet carries.
pub const BASE_CURRENCY: &str = "PLN";

/// Normalized ISO-4217-style currency code (three ASCII letters, uppercase).
///
/// The engine keeps the code open-ended on purpose: which currencies actually
/// have quotes is decided by the rate store, not by this type. Construction
/// normalizes case and whitespace, so two codes naming the same currency
/// always compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Canonical uppercase code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a code and additionally rejects the base currency.
    ///
    /// Exchange operations trade against the base balance, so "exchanging"
    /// the base currency for itself is a caller mistake.
    pub fn foreign(value: &str) -> ResultEngine<Self> {
        let code = CurrencyCode::try_from(value)?;
        if code.as_str() == BASE_CURRENCY {
            return Err(EngineError::InvalidCurrency(format!(
                "{BASE_CURRENCY} is the base currency, use a deposit instead"
            )));
        }
        Ok(code)
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        if normalized.len() != 3 || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EngineError::InvalidCurrency(format!(
                "invalid currency code: {value}"
            )));
        }
        Ok(CurrencyCode(normalized))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::try_from(value.as_str())
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(CurrencyCode::try_from(" usd ").unwrap().as_str(), "USD");
        assert_eq!(CurrencyCode::try_from("Eur").unwrap().as_str(), "EUR");
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(CurrencyCode::try_from("").is_err());
        assert!(CurrencyCode::try_from("US").is_err());
        assert!(CurrencyCode::try_from("USDX").is_err());
        assert!(CurrencyCode::try_from("U5D").is_err());
    }

    #[test]
    fn foreign_rejects_base_currency() {
        assert!(CurrencyCode::foreign("PLN").is_err());
        assert!(CurrencyCode::foreign("pln").is_err());
        assert!(CurrencyCode::foreign("USD").is_ok());
    }
}
