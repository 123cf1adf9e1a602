//! Money helpers. Amounts are `DECIMAL(12,2)` in storage.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::DomainError;

pub const MONEY_SCALE: u32 = 2;

/// Largest value a `DECIMAL(12,2)` column holds: 9999999999.99
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, MONEY_SCALE);

/// Rounds to cents, half away from zero.
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn ensure_non_negative(field: &str, value: Decimal) -> Result<(), DomainError> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(format!("{}: must not be negative", field)));
    }
    Ok(())
}

pub fn ensure_positive(field: &str, value: Decimal) -> Result<(), DomainError> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(format!("{}: must be greater than zero", field)));
    }
    Ok(())
}

pub fn ensure_within_limit(field: &str, value: Decimal) -> Result<(), DomainError> {
    if value.abs() > MAX_AMOUNT {
        return Err(out_of_range(field));
    }
    Ok(())
}

/// `price * quantity` rounded to cents, rejected past [`MAX_AMOUNT`].
pub fn checked_mul(field: &str, price: Decimal, quantity: Decimal) -> Result<Decimal, DomainError> {
    price
        .checked_mul(quantity)
        .map(round)
        .filter(|v| v.abs() <= MAX_AMOUNT)
        .ok_or_else(|| out_of_range(field))
}

pub fn checked_sum<I>(field: &str, values: I) -> Result<Decimal, DomainError>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .filter(|v| v.abs() <= MAX_AMOUNT)
        .ok_or_else(|| out_of_range(field))
}

fn out_of_range(field: &str) -> DomainError {
    DomainError::validation(format!("{}: must not exceed {}", field, MAX_AMOUNT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(dec!(10.005)), dec!(10.01));
        assert_eq!(round(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round(dec!(3.14159)), dec!(3.14));
    }

    #[test]
    fn test_sign_checks() {
        assert!(ensure_non_negative("price", dec!(0)).is_ok());
        assert!(ensure_non_negative("price", dec!(-0.01)).is_err());
        assert!(ensure_positive("amount", dec!(0)).is_err());
        assert!(ensure_positive("amount", dec!(0.01)).is_ok());
    }

    #[test]
    fn test_limit_matches_column() {
        assert_eq!(MAX_AMOUNT, dec!(9999999999.99));
        assert!(ensure_within_limit("price", dec!(9999999999.99)).is_ok());
        assert!(ensure_within_limit("price", dec!(10000000000.00)).is_err());
        assert!(ensure_within_limit("price", dec!(-10000000000.00)).is_err());
        assert!(ensure_within_limit("price", Decimal::MAX).is_err());
    }

    #[test]
    fn test_checked_arithmetic_rejects_overflow() {
        assert_eq!(checked_mul("total", dec!(19.999), dec!(3)).unwrap(), dec!(60.00));
        assert!(matches!(
            checked_mul("total", Decimal::MAX, dec!(2)),
            Err(DomainError::ValidationError(_))
        ));
        assert!(checked_mul("total", dec!(5000000000), dec!(2)).is_err());

        assert_eq!(checked_sum("paid", [dec!(1.50), dec!(2.25)]).unwrap(), dec!(3.75));
        assert_eq!(checked_sum("paid", Vec::new()).unwrap(), Decimal::ZERO);
        assert!(matches!(
            checked_sum("paid", [Decimal::MAX, Decimal::MAX]),
            Err(DomainError::ValidationError(_))
        ));
    }
}
