/*
[INPUT]:  Human decimal prices/sizes and market decimals
[OUTPUT]: Fixed-point u64 values for intents (and back)
[POS]:    Intent layer - unit scaling without floating point
[UPDATE]: When market precision rules change
*/

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::http::{EkidenError, Result};

/// Largest scale where 10^decimals still fits the u64 range
const MAX_DECIMALS: u32 = 19;

/// Scale `value` by `10^decimals` into an integer.
///
/// Rejects negative values, values that overflow u64 and values with more
/// fractional digits than `decimals` allows.
pub fn to_fixed_point(value: Decimal, decimals: u32) -> Result<u64> {
    if decimals > MAX_DECIMALS {
        return Err(EkidenError::validation(
            "decimals",
            format!("at most {MAX_DECIMALS} decimals are supported"),
        ));
    }
    let factor = Decimal::from(10u64.pow(decimals));
    let scaled = value
        .checked_mul(factor)
        .ok_or_else(|| EkidenError::validation("value", format!("{value} overflows")))?;

    if !scaled.fract().is_zero() {
        return Err(EkidenError::validation(
            "value",
            format!("{value} has more than {decimals} decimal places"),
        ));
    }

    scaled
        .to_u64()
        .ok_or_else(|| EkidenError::validation("value", format!("{value} is out of range")))
}

/// Inverse of [`to_fixed_point`]
pub fn from_fixed_point(raw: u64, decimals: u32) -> Result<Decimal> {
    Decimal::try_from_i128_with_scale(raw as i128, decimals)
        .map_err(|e| EkidenError::validation("decimals", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("65000.5", 6, 65_000_500_000)]
    #[case("0.001", 3, 1)]
    #[case("12", 0, 12)]
    fn test_to_fixed_point(#[case] value: &str, #[case] decimals: u32, #[case] expected: u64) {
        let value: Decimal = value.parse().unwrap();
        assert_eq!(to_fixed_point(value, decimals).unwrap(), expected);
    }

    #[test]
    fn test_excess_precision_rejected() {
        let value: Decimal = "0.0015".parse().unwrap();
        assert!(matches!(
            to_fixed_point(value, 3),
            Err(EkidenError::Validation { .. })
        ));
    }

    #[test]
    fn test_negative_rejected() {
        let value: Decimal = "-1".parse().unwrap();
        assert!(to_fixed_point(value, 2).is_err());
    }

    #[test]
    fn test_from_fixed_point() {
        let value = from_fixed_point(65_000_500_000, 6).unwrap();
        assert_eq!(value, "65000.5".parse::<Decimal>().unwrap());
    }
}
