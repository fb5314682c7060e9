//! Discount and partner profit-reduction formulas.
//!
//! Two reduction formulas are in use for what the business calls the same
//! metric: the per-method one shown while selling and the aggregate one shown
//! when managing a payment condition. They differ in threshold and slope and
//! are kept apart until product confirms a single rule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Maximum reduction of the partner's profit, in percent.
pub const PARTNER_REDUCTION_CAP: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Per-method guidance band for the sales discount. Shown next to the input,
/// never enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTier {
    pub min_percent: Decimal,
    pub max_percent: Decimal,
}

impl Default for DiscountTier {
    fn default() -> Self {
        Self { min_percent: Decimal::from(2), max_percent: Decimal::from(8) }
    }
}

impl DiscountTier {
    pub fn contains(&self, percent: Decimal) -> bool {
        percent >= self.min_percent && percent <= self.max_percent
    }
}

/// Zero when the product does not fit a `Decimal`.
pub fn discount_value(base: Decimal, percent: Decimal) -> Decimal {
    base.checked_mul(percent).map_or(Decimal::ZERO, |product| product / HUNDRED)
}

/// Inverse of [`discount_value`]; zero when there is no base to discount or
/// the ratio does not fit a `Decimal`.
pub fn discount_percent(base: Decimal, value: Decimal) -> Decimal {
    value
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Sales screen, per method: every point above 6% costs the partner 2.5
/// points, capped at 5%.
pub fn partner_reduction_per_method(applied_percent: Decimal) -> Decimal {
    let exceed = applied_percent.saturating_sub(Decimal::from(6));
    if exceed <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    exceed.saturating_mul(Decimal::new(25, 1)).min(PARTNER_REDUCTION_CAP)
}

/// Manage screen, whole condition: the overall discount above 5% scales
/// linearly to the 5% cap reached at 8%.
pub fn partner_reduction_aggregate(overall_percent: Decimal) -> Decimal {
    if overall_percent <= Decimal::from(5) {
        return Decimal::ZERO;
    }
    ((overall_percent - Decimal::from(5)) / Decimal::from(3))
        .saturating_mul(Decimal::from(5))
        .min(PARTNER_REDUCTION_CAP)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        discount_percent, discount_value, partner_reduction_aggregate,
        partner_reduction_per_method, DiscountTier,
    };
    use crate::format::{parse_percent, parse_pt_number};

    fn pct(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    #[test]
    fn discount_value_is_percent_of_base() {
        assert_eq!(discount_value(Decimal::from(25_000), pct(75, 1)), Decimal::from(1_875));
        assert_eq!(discount_value(Decimal::from(25_000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn discount_percent_inverts_value() {
        assert_eq!(discount_percent(Decimal::from(25_000), Decimal::from(1_875)), pct(75, 1));
        assert_eq!(discount_percent(Decimal::ZERO, Decimal::from(10)), Decimal::ZERO);
    }

    #[test]
    fn per_method_reduction_starts_above_six_percent() {
        assert_eq!(partner_reduction_per_method(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(partner_reduction_per_method(Decimal::from(6)), Decimal::ZERO);
        assert_eq!(partner_reduction_per_method(pct(68, 1)), Decimal::from(2));
        assert_eq!(partner_reduction_per_method(Decimal::from(8)), Decimal::from(5));
        assert_eq!(partner_reduction_per_method(Decimal::from(15)), Decimal::from(5));
    }

    #[test]
    fn per_method_reduction_is_monotonic_up_to_cap() {
        let mut previous = Decimal::ZERO;
        let mut applied = Decimal::from(6);
        while applied <= Decimal::from(12) {
            let reduction = partner_reduction_per_method(applied);
            assert!(reduction >= previous, "reduction dropped at {applied}");
            assert!(reduction <= Decimal::from(5));
            previous = reduction;
            applied += pct(1, 1);
        }
    }

    #[test]
    fn aggregate_reduction_starts_above_five_percent() {
        assert_eq!(partner_reduction_aggregate(Decimal::from(5)), Decimal::ZERO);
        assert_eq!(partner_reduction_aggregate(pct(65, 1)), pct(25, 1));
        assert_eq!(partner_reduction_aggregate(Decimal::from(8)), Decimal::from(5));
        assert_eq!(partner_reduction_aggregate(Decimal::from(20)), Decimal::from(5));
    }

    #[test]
    fn the_two_reduction_formulas_disagree_between_five_and_eight() {
        let overall = pct(65, 1);
        assert_ne!(partner_reduction_aggregate(overall), partner_reduction_per_method(overall));
    }

    #[test]
    fn oversized_inputs_degrade_instead_of_overflowing() {
        let huge = parse_pt_number("79228162514264337593543950335");
        assert_eq!(huge, Decimal::MAX);

        assert_eq!(discount_value(huge, parse_percent("7,5")), Decimal::ZERO);
        assert_eq!(discount_percent(Decimal::new(1, 28), huge), Decimal::ZERO);
        assert_eq!(partner_reduction_per_method(Decimal::MIN), Decimal::ZERO);
        assert_eq!(partner_reduction_per_method(Decimal::MAX), Decimal::from(5));
        assert_eq!(partner_reduction_aggregate(Decimal::MAX), Decimal::from(5));
    }

    #[test]
    fn default_tier_is_two_to_eight_percent() {
        let tier = DiscountTier::default();
        assert!(tier.contains(Decimal::from(2)));
        assert!(tier.contains(pct(75, 1)));
        assert!(!tier.contains(pct(85, 1)));
        assert!(!tier.contains(Decimal::ONE));
    }
}
