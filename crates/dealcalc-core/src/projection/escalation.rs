use rust_decimal::Decimal;

use crate::types::{pct_to_rate, Money, Percent};

/// Straight annual escalation: year 1 is `base`, each later year is the
/// previous year × (1 + escalator). Index 0 holds year 1.
pub fn escalate(base: Money, escalator_pct: Percent, years: u32) -> Vec<Money> {
    let factor = Decimal::ONE + pct_to_rate(escalator_pct);
    let mut current = base;
    let mut series = Vec::with_capacity(years as usize);
    for _ in 0..years {
        series.push(current);
        current *= factor;
    }
    series
}

/// Rent per year: escalated price per square foot × total square feet.
pub fn rent_projection(
    price_per_sqft: Money,
    total_sqft: u32,
    escalator_pct: Percent,
    years: u32,
) -> Vec<Money> {
    let sqft = Decimal::from(total_sqft);
    escalate(price_per_sqft, escalator_pct, years)
        .into_iter()
        .map(|price| price * sqft)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_year_one_is_base() {
        let series = escalate(dec!(35), dec!(3), 10);
        assert_eq!(series.len(), 10);
        assert_eq!(series[0], dec!(35));
        assert_eq!(series[1], dec!(36.05));
        assert_eq!(series[2], dec!(37.1315));
    }

    #[test]
    fn test_zero_escalator_is_flat() {
        let series = escalate(dec!(12000), dec!(0), 10);
        assert!(series.iter().all(|v| *v == dec!(12000)));
    }

    #[test]
    fn test_rent_projection() {
        let rent = rent_projection(dec!(35), 1500, dec!(3), 10);
        assert_eq!(rent[0], dec!(52500));
        // 35 * 1.03^9 * 1500 ≈ 68,500.59
        assert!((rent[9] - dec!(68500.59)).abs() < dec!(0.01));
    }
}
