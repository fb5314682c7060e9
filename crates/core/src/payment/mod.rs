pub mod tabs;

use rust_decimal::Decimal;

use crate::domain::payment::PaymentTab;

pub use tabs::PaymentTabManager;

/// Amount covered by `tabs` against a fee of `target`.
///
/// A single active tab in total mode pays the whole fee, whatever the other
/// tabs hold. Otherwise the typed amounts of active tabs are summed.
pub fn paid_total(tabs: &[PaymentTab], target: Decimal) -> Decimal {
    if tabs.iter().any(PaymentTab::covers_everything) {
        return target;
    }
    saturating_sum(tabs.iter().filter(|tab| tab.active).map(PaymentTab::partial_amount))
}

/// Negative when the partial amounts exceed the fee.
pub fn remaining(tabs: &[PaymentTab], target: Decimal) -> Decimal {
    target.saturating_sub(paid_total(tabs, target))
}

/// Sum that clamps at `Decimal::MAX`/`Decimal::MIN` instead of overflowing;
/// typed amounts are unbounded.
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{paid_total, remaining, saturating_sum, PaymentTabManager};
    use crate::domain::fee::{FeeMode, FeeType};
    use crate::domain::payment::{AllocationMode, PaymentTab, TabId, TabPatch};

    fn tab(id: u32, mode: AllocationMode, amount: &str, active: bool) -> PaymentTab {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date");
        PaymentTab {
            mode,
            partial_amount_text: amount.to_string(),
            ..PaymentTab::with_defaults(TabId(id), due, active)
        }
    }

    #[test]
    fn active_total_tab_saturates_the_fee() {
        let target = Decimal::from(50_000);
        let tabs = vec![
            tab(1, AllocationMode::Partial, "10.000", true),
            tab(2, AllocationMode::Total, "", true),
            tab(3, AllocationMode::Partial, "99.999", true),
        ];

        assert_eq!(paid_total(&tabs, target), target);
        assert_eq!(remaining(&tabs, target), Decimal::ZERO);
    }

    #[test]
    fn saturation_holds_for_any_positive_target() {
        let tabs = vec![
            tab(1, AllocationMode::Total, "", true),
            tab(2, AllocationMode::Partial, "1", true),
        ];
        for target in [Decimal::new(1, 2), Decimal::from(7), Decimal::new(123_456_789, 2)] {
            assert_eq!(paid_total(&tabs, target), target);
        }
    }

    #[test]
    fn inactive_total_tab_does_not_saturate() {
        let target = Decimal::from(50_000);
        let tabs = vec![
            tab(1, AllocationMode::Partial, "20.000", true),
            tab(2, AllocationMode::Total, "", false),
        ];

        assert_eq!(paid_total(&tabs, target), Decimal::from(20_000));
        assert_eq!(remaining(&tabs, target), Decimal::from(30_000));
    }

    #[test]
    fn partial_amounts_of_active_tabs_are_summed() {
        let target = Decimal::from(50_000);
        let tabs = vec![
            tab(1, AllocationMode::Partial, "20.000,50", true),
            tab(2, AllocationMode::Partial, "9999,50", true),
            tab(3, AllocationMode::Partial, "5000", false),
            tab(4, AllocationMode::Partial, "not a number", true),
        ];

        assert_eq!(paid_total(&tabs, target), Decimal::from(30_000));
        assert_eq!(remaining(&tabs, target), Decimal::from(20_000));
    }

    #[test]
    fn overpayment_leaves_negative_remaining() {
        let tabs = vec![tab(1, AllocationMode::Partial, "60000", true)];
        assert_eq!(remaining(&tabs, Decimal::from(50_000)), Decimal::from(-10_000));
    }

    #[test]
    fn huge_partial_amounts_saturate_instead_of_overflowing() {
        let huge = "79228162514264337593543950335";
        let opened_on = NaiveDate::from_ymd_opt(2026, 1, 10).expect("valid date");
        let mut manager = PaymentTabManager::new(FeeType::Prolabore, FeeMode::Dual, opened_on);
        manager.switch_mode(AllocationMode::Partial);
        manager.enter_partial_amount(huge);
        manager.add_tab();
        manager.update_active_tab(TabPatch {
            mode: Some(AllocationMode::Partial),
            ..TabPatch::default()
        });
        manager.enter_partial_amount(huge);

        let target = Decimal::from(50_000);
        assert_eq!(manager.paid_total(target), Decimal::MAX);
        assert_eq!(manager.remaining(target), Decimal::from(50_000) - Decimal::MAX);
        assert!(manager.remaining(target) < Decimal::ZERO);
    }

    #[test]
    fn saturating_sum_clamps_both_ends() {
        assert_eq!(saturating_sum([Decimal::MAX, Decimal::ONE]), Decimal::MAX);
        assert_eq!(saturating_sum([Decimal::MIN, Decimal::NEGATIVE_ONE]), Decimal::MIN);
        assert_eq!(saturating_sum([Decimal::from(2), Decimal::from(3)]), Decimal::from(5));
    }
}
