//! Fixed-point money helpers.
//!
//! Balances and amounts are stored as **integer hundredths** (2 fraction
//! digits), rates as **integer millionths** (6 fraction digits). All
//! arithmetic on stored values happens in integer space, so the conditional
//! `balance + delta >= 0` guards the storage engine evaluates are exact.
//! [`Decimal`] appears only at the boundary, converting user input and
//! rendering stored values back out.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{EngineError, ResultEngine};

/// Fraction digits carried by currency amounts.
pub(crate) const AMOUNT_SCALE: u32 = 2;
/// Fraction digits carried by exchange rates.
pub(crate) const RATE_SCALE: u32 = 6;

const RATE_UNIT: i128 = 1_000_000;

/// Converts a decimal amount to integer hundredths.
///
/// Rejects sub-cent precision instead of rounding it away: an amount the
/// caller sends is a contract, not an approximation.
pub(crate) fn amount_to_minor(value: Decimal) -> ResultEngine<i64> {
    let normalized = value.normalize();
    if normalized.scale() > AMOUNT_SCALE {
        return Err(EngineError::InvalidAmount(format!(
            "amount {value} has more than {AMOUNT_SCALE} decimal places"
        )));
    }
    (normalized * Decimal::from(100))
        .to_i64()
        .ok_or_else(|| EngineError::InvalidAmount(format!("amount {value} out of range")))
}

/// Converts and additionally requires a strictly positive amount.
pub(crate) fn require_positive_amount(value: Decimal) -> ResultEngine<i64> {
    let minor = amount_to_minor(value)?;
    if minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(minor)
}

pub(crate) fn minor_to_amount(minor: i64) -> Decimal {
    Decimal::new(minor, AMOUNT_SCALE)
}

/// Converts a quoted rate to integer millionths, rounding half-up to the
/// stored precision. Rates must be strictly positive.
pub(crate) fn rate_to_micro(value: Decimal) -> ResultEngine<i64> {
    if value <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(format!(
            "rate {value} must be > 0"
        )));
    }
    let scaled = value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    (scaled * Decimal::from(1_000_000))
        .to_i64()
        .ok_or_else(|| EngineError::InvalidAmount(format!("rate {value} out of range")))
}

pub(crate) fn micro_to_rate(micro: i64) -> Decimal {
    Decimal::new(micro, RATE_SCALE)
}

/// `round_half_up(amount × rate, 2)` evaluated exactly in integer space.
///
/// Both operands must be non-negative (amounts are validated positive and
/// rates positive before they get here).
pub(crate) fn mul_rate_half_up(amount_minor: i64, rate_micro: i64) -> ResultEngine<i64> {
    let product = i128::from(amount_minor) * i128::from(rate_micro);
    let rounded = (product + RATE_UNIT / 2) / RATE_UNIT;
    i64::try_from(rounded)
        .map_err(|_| EngineError::InvalidAmount("amount out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn amount_conversion_round_trips() {
        assert_eq!(amount_to_minor(dec!(10.50)).unwrap(), 1050);
        assert_eq!(amount_to_minor(dec!(10.5)).unwrap(), 1050);
        assert_eq!(amount_to_minor(dec!(100)).unwrap(), 10000);
        assert_eq!(minor_to_amount(1050), dec!(10.50));
    }

    #[test]
    fn amount_rejects_sub_cent_precision() {
        assert!(amount_to_minor(dec!(12.345)).is_err());
        assert!(amount_to_minor(dec!(0.001)).is_err());
        // Trailing zeros beyond the scale are fine.
        assert_eq!(amount_to_minor(dec!(12.3400)).unwrap(), 1234);
    }

    #[test]
    fn positive_amount_guard() {
        assert!(require_positive_amount(dec!(0)).is_err());
        assert!(require_positive_amount(dec!(-1.00)).is_err());
        assert_eq!(require_positive_amount(dec!(0.01)).unwrap(), 1);
    }

    #[test]
    fn rate_conversion() {
        assert_eq!(rate_to_micro(dec!(4.000000)).unwrap(), 4_000_000);
        assert_eq!(rate_to_micro(dec!(3.9354)).unwrap(), 3_935_400);
        // More than 6 decimals rounds half-up to the stored precision.
        assert_eq!(rate_to_micro(dec!(1.0000005)).unwrap(), 1_000_001);
        assert!(rate_to_micro(dec!(0)).is_err());
        assert!(rate_to_micro(dec!(-1)).is_err());
        assert_eq!(micro_to_rate(3_935_400), dec!(3.935400));
    }

    #[test]
    fn cost_rounds_half_up_to_cents() {
        // 100.00 × 4.000000 = 400.00
        assert_eq!(mul_rate_half_up(10000, 4_000_000).unwrap(), 40000);
        // 1.00 × 0.005000 = 0.005 → 0.01
        assert_eq!(mul_rate_half_up(100, 5_000).unwrap(), 1);
        // 1.00 × 0.004999 = 0.004999 → 0.00
        assert_eq!(mul_rate_half_up(100, 4_999).unwrap(), 0);
        // 10.00 × 3.935449 = 39.35449 → 39.35
        assert_eq!(mul_rate_half_up(1000, 3_935_449).unwrap(), 3935);
        // 10.00 × 3.935450 = 39.3545 → 39.36 (midpoint goes up)
        assert_eq!(mul_rate_half_up(1000, 3_935_450).unwrap(), 3936);
    }
}
