// 4.0: option price derivation. price[i] = pool[i] / sum(pool).
// pure functions over the pool vector, nothing here is ever stored.
// an empty total falls back to a uniform 1/N so callers never divide by zero.

use crate::option::MarketOption;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// largest mantissa a Decimal can carry (96 bits)
const DECIMAL_MANTISSA_MAX: u128 = (1u128 << 96) - 1;

/// Exact rational price, always stored in lowest terms with a non-zero denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawOptionPrice")]
pub struct OptionPrice {
    numerator: u128,
    denominator: u128,
}

// wire shape, reduced through OptionPrice::new on the way in
#[derive(Deserialize)]
struct RawOptionPrice {
    numerator: u128,
    denominator: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Price denominator must be non-zero")]
pub struct ZeroDenominator;

impl TryFrom<RawOptionPrice> for OptionPrice {
    type Error = ZeroDenominator;

    fn try_from(raw: RawOptionPrice) -> Result<Self, Self::Error> {
        OptionPrice::new(raw.numerator, raw.denominator).ok_or(ZeroDenominator)
    }
}

impl OptionPrice {
    /// Returns `None` for a zero denominator.
    #[must_use]
    pub fn new(numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let divisor = gcd(numerator, denominator);
        Some(Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    pub fn numerator(&self) -> u128 {
        self.numerator
    }

    pub fn denominator(&self) -> u128 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    // lossy past 28 significant digits. saturates at Decimal::MAX
    pub fn to_decimal(&self) -> Decimal {
        let whole = self.numerator / self.denominator;
        if whole > DECIMAL_MANTISSA_MAX {
            return Decimal::MAX;
        }

        // rem < den, so shifting both keeps den non-zero
        let (mut rem, mut den) = (self.numerator % self.denominator, self.denominator);
        while den > DECIMAL_MANTISSA_MAX {
            rem >>= 1;
            den >>= 1;
        }

        let whole = Decimal::from_i128_with_scale(whole as i128, 0);
        let fraction = Decimal::from_i128_with_scale(rem as i128, 0) / Decimal::from_i128_with_scale(den as i128, 0);
        whole.checked_add(fraction).unwrap_or(Decimal::MAX)
    }
}

impl fmt::Display for OptionPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    // gcd(0, 0) counts as 1
    a.max(1)
}

pub fn total_pool(options: &[MarketOption]) -> u128 {
    options.iter().map(|o| o.pool().value() as u128).sum()
}

/// Price of one pool given the market total and option count.
pub fn calculate_price(pool: u64, total: u128, option_count: usize) -> Option<OptionPrice> {
    if total == 0 {
        // uniform fallback
        return OptionPrice::new(1, option_count as u128);
    }
    OptionPrice::new(pool as u128, total)
}

/// Prices for every option, in option order. Empty input yields an empty vector.
pub fn calculate_prices(options: &[MarketOption]) -> Vec<OptionPrice> {
    let total = total_pool(options);
    options
        .iter()
        .filter_map(|o| calculate_price(o.pool().value(), total, options.len()))
        .collect()
}

pub fn price_sum(prices: &[OptionPrice]) -> Decimal {
    prices.iter().map(OptionPrice::to_decimal).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Amount;
    use rust_decimal_macros::dec;

    fn options(pools: &[u64]) -> Vec<MarketOption> {
        pools
            .iter()
            .enumerate()
            .map(|(i, p)| MarketOption::new(format!("opt{}", i), Amount::new(*p)))
            .collect()
    }

    #[test]
    fn prices_follow_pool_share() {
        let prices = calculate_prices(&options(&[500, 700]));
        assert_eq!(prices[0], OptionPrice::new(5, 12).unwrap());
        assert_eq!(prices[1], OptionPrice::new(7, 12).unwrap());
        assert_eq!(prices[0].to_string(), "5/12");
    }

    #[test]
    fn prices_are_reduced() {
        let price = OptionPrice::new(1000, 1700).unwrap();
        assert_eq!(price.numerator(), 10);
        assert_eq!(price.denominator(), 17);
    }

    #[test]
    fn zero_total_falls_back_to_uniform() {
        let prices = calculate_prices(&options(&[0, 0, 0, 0]));
        assert_eq!(prices.len(), 4);
        for p in &prices {
            assert_eq!(*p, OptionPrice::new(1, 4).unwrap());
        }
        assert_eq!(price_sum(&prices), dec!(1));
    }

    #[test]
    fn zero_pool_prices_at_zero_when_total_positive() {
        let prices = calculate_prices(&options(&[0, 300]));
        assert!(prices[0].is_zero());
        assert_eq!(prices[1], OptionPrice::new(1, 1).unwrap());
    }

    #[test]
    fn price_sum_is_one() {
        let prices = calculate_prices(&options(&[500, 700]));
        let diff = (price_sum(&prices) - Decimal::ONE).abs();
        assert!(diff < dec!(0.000000000001), "sum off by {}", diff);
    }

    #[test]
    fn huge_pools_stay_representable() {
        let prices = calculate_prices(&options(&[u64::MAX, u64::MAX, u64::MAX]));
        assert_eq!(prices[0], OptionPrice::new(1, 3).unwrap());

        let skewed = calculate_prices(&options(&[u64::MAX, 1]));
        let diff = (price_sum(&skewed) - Decimal::ONE).abs();
        assert!(diff < dec!(0.000000000001));
    }

    #[test]
    fn zero_denominator_rejected() {
        assert!(OptionPrice::new(1, 0).is_none());
        assert!(calculate_price(0, 0, 0).is_none());
    }

    #[test]
    fn decimal_projection() {
        let half = OptionPrice::new(1, 2).unwrap();
        assert_eq!(half.to_decimal(), dec!(0.5));
        assert_eq!(OptionPrice::new(7, 2).unwrap().to_decimal(), dec!(3.5));
    }

    #[test]
    fn decimal_projection_of_wide_values() {
        let wide = OptionPrice::new(1 << 100, 1).unwrap();
        assert_eq!(wide.to_decimal(), Decimal::MAX);

        let tiny = OptionPrice::new(1, u128::MAX).unwrap();
        assert_eq!(tiny.to_decimal(), Decimal::ZERO);

        let near_one = OptionPrice::new(u128::MAX - 1, u128::MAX).unwrap();
        assert!((near_one.to_decimal() - Decimal::ONE).abs() < dec!(0.000000000001));
    }

    #[test]
    fn deserialize_goes_through_new() {
        let err = serde_json::from_str::<OptionPrice>(r#"{"numerator":1,"denominator":0}"#);
        assert!(err.is_err());

        let price: OptionPrice = serde_json::from_str(r#"{"numerator":2,"denominator":4}"#).unwrap();
        assert_eq!(price, OptionPrice::new(1, 2).unwrap());

        let json = serde_json::to_string(&OptionPrice::new(5, 12).unwrap()).unwrap();
        assert_eq!(json, r#"{"numerator":5,"denominator":12}"#);
    }
}
