//! Validation and rounding of money amounts.

use crate::Error;

/// Check that an amount sent by a client is a positive, finite number.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` is missing, zero, negative, NaN
/// or infinite.
pub fn validate_amount(amount: Option<f64>) -> Result<f64, Error> {
    match amount {
        Some(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(Error::InvalidAmount),
    }
}

/// Round `value` to two decimal places.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        amount::{round_to_cents, validate_amount},
    };

    #[test]
    fn accepts_positive_amount() {
        assert_eq!(validate_amount(Some(42.5)), Ok(42.5));
    }

    #[test]
    fn rejects_missing_zero_and_negative_amounts() {
        for amount in [None, Some(0.0), Some(-1.0), Some(f64::NAN), Some(f64::INFINITY)] {
            assert_eq!(
                validate_amount(amount),
                Err(Error::InvalidAmount),
                "{amount:?} should be rejected"
            );
        }
    }

    #[test]
    fn rounds_to_two_decimal_places() {
        assert_eq!(round_to_cents(1.0 / 3.0), 0.33);
        assert_eq!(round_to_cents(66.666_666), 66.67);
        assert_eq!(round_to_cents(-42.5), -42.5);
    }
}
