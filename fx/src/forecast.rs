//! Next official rate heuristic.

use ratewatch_common::Forecast;
use rust_decimal::Decimal;

use crate::config::ForecastConfig;

/// Weighted blend of the market and official rates with a fixed band.
///
/// The weights and band are heuristics, not fitted parameters. `None` when
/// the inputs are too large for the arithmetic to stay in range.
pub fn forecast(
    primary: Decimal,
    reference: Decimal,
    config: &ForecastConfig,
) -> Option<Forecast> {
    let estimate = primary
        .checked_mul(config.primary_weight)?
        .checked_add(reference.checked_mul(config.reference_weight)?)?;
    Forecast::around(estimate, config.band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_weights() {
        let f = forecast(dec!(95.0), dec!(94.0), &ForecastConfig::default()).unwrap();

        assert_eq!(f.estimate, dec!(94.6));
        assert_eq!(f.low, dec!(94.4));
        assert_eq!(f.high, dec!(94.8));
    }

    #[test]
    fn test_custom_config() {
        let config = ForecastConfig {
            primary_weight: dec!(1),
            reference_weight: dec!(0),
            band: dec!(0.5),
        };
        let f = forecast(dec!(100.25), dec!(90), &config).unwrap();

        assert_eq!(f.estimate, dec!(100.25));
        assert_eq!(f.low, dec!(99.75));
        assert_eq!(f.high, dec!(100.75));
    }

    #[test]
    fn test_out_of_range_inputs() {
        let config = ForecastConfig {
            primary_weight: dec!(1),
            reference_weight: dec!(0),
            band: dec!(1),
        };
        assert_eq!(forecast(Decimal::MAX, dec!(94), &config), None);
    }

    proptest! {
        #[test]
        fn prop_estimate_between_inputs(p in 50_000u32..150_000, r in 50_000u32..150_000) {
            let primary = Decimal::new(i64::from(p), 3);
            let reference = Decimal::new(i64::from(r), 3);
            let f = forecast(primary, reference, &ForecastConfig::default()).unwrap();

            prop_assert!(f.estimate >= primary.min(reference));
            prop_assert!(f.estimate <= primary.max(reference));
            prop_assert_eq!(f.high - f.low, dec!(0.4));
        }
    }
}
