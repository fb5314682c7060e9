pub mod discount;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::fee::{FeeTarget, FeeType};
use crate::domain::payment::PaymentMethod;

use self::discount::{
    discount_percent, discount_value, partner_reduction_aggregate, partner_reduction_per_method,
    DiscountTier,
};
use crate::payment::saturating_sum;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

/// Discount applied on one method's reference base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodQuote {
    pub method: PaymentMethod,
    pub base: Decimal,
    pub applied_percent: Decimal,
    pub discount_value: Decimal,
    pub net_amount: Decimal,
    pub tier: DiscountTier,
    pub within_tier: bool,
    pub partner_reduction_percent: Decimal,
    pub trace: Vec<DiscountTraceStep>,
}

/// All methods of a fee's payment condition taken together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionQuote {
    pub fee_type: FeeType,
    pub methods: Vec<MethodQuote>,
    pub base_total: Decimal,
    pub discount_total: Decimal,
    pub overall_percent: Decimal,
    pub partner_reduction_percent: Decimal,
}

pub trait DiscountEngine: Send + Sync {
    fn quote_method(
        &self,
        method: PaymentMethod,
        base: Decimal,
        applied_percent: Decimal,
    ) -> MethodQuote;

    fn quote_condition(
        &self,
        target: &FeeTarget,
        applied: &BTreeMap<PaymentMethod, Decimal>,
    ) -> ConditionQuote;
}

#[derive(Clone, Debug, Default)]
pub struct StandardDiscountEngine {
    tier: DiscountTier,
}

impl StandardDiscountEngine {
    pub fn new(tier: DiscountTier) -> Self {
        Self { tier }
    }
}

impl DiscountEngine for StandardDiscountEngine {
    fn quote_method(
        &self,
        method: PaymentMethod,
        base: Decimal,
        applied_percent: Decimal,
    ) -> MethodQuote {
        quote_method_with_trace(method, base, applied_percent, self.tier)
    }

    fn quote_condition(
        &self,
        target: &FeeTarget,
        applied: &BTreeMap<PaymentMethod, Decimal>,
    ) -> ConditionQuote {
        let methods: Vec<MethodQuote> = target
            .base_by_method
            .iter()
            .map(|(method, base)| {
                let percent = applied.get(method).copied().unwrap_or(Decimal::ZERO);
                self.quote_method(*method, *base, percent)
            })
            .collect();

        let base_total = saturating_sum(methods.iter().map(|quote| quote.base));
        let discount_total = saturating_sum(methods.iter().map(|quote| quote.discount_value));
        let overall_percent = discount_percent(base_total, discount_total);

        ConditionQuote {
            fee_type: target.fee_type,
            methods,
            base_total,
            discount_total,
            overall_percent,
            partner_reduction_percent: partner_reduction_aggregate(overall_percent),
        }
    }
}

pub fn quote_method_with_trace(
    method: PaymentMethod,
    base: Decimal,
    applied_percent: Decimal,
    tier: DiscountTier,
) -> MethodQuote {
    let value = discount_value(base, applied_percent);
    let net_amount = base.saturating_sub(value);
    let partner_reduction_percent = partner_reduction_per_method(applied_percent);

    MethodQuote {
        method,
        base,
        applied_percent,
        discount_value: value,
        net_amount,
        tier,
        within_tier: tier.contains(applied_percent),
        partner_reduction_percent,
        trace: vec![
            DiscountTraceStep {
                stage: "base".to_string(),
                detail: format!("{} reference allocation", method.label()),
                amount: base,
            },
            DiscountTraceStep {
                stage: "discount".to_string(),
                detail: "base * applied_percent / 100".to_string(),
                amount: value,
            },
            DiscountTraceStep {
                stage: "net".to_string(),
                detail: "base - discount".to_string(),
                amount: net_amount,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use crate::domain::fee::{FeeTarget, FeeType};
    use crate::domain::payment::PaymentMethod;
    use crate::pricing::discount::DiscountTier;
    use crate::pricing::{DiscountEngine, StandardDiscountEngine};

    fn target() -> FeeTarget {
        FeeTarget::new(FeeType::Prolabore, Decimal::from(50_000))
            .with_base(PaymentMethod::Pix, Decimal::from(25_000))
            .with_base(PaymentMethod::Credit, Decimal::from(25_000))
    }

    #[test]
    fn method_quote_reports_net_and_band() {
        let engine = StandardDiscountEngine::default();
        let quote = engine.quote_method(PaymentMethod::Pix, Decimal::from(25_000), Decimal::from(8));

        assert_eq!(quote.discount_value, Decimal::from(2_000));
        assert_eq!(quote.net_amount, Decimal::from(23_000));
        assert!(quote.within_tier);
        assert_eq!(quote.partner_reduction_percent, Decimal::from(5));
        assert_eq!(quote.trace.len(), 3);
        assert_eq!(quote.trace[2].amount, quote.net_amount);
    }

    #[test]
    fn out_of_band_percent_is_accepted_but_flagged() {
        let engine = StandardDiscountEngine::new(DiscountTier::default());
        let quote =
            engine.quote_method(PaymentMethod::Boleto, Decimal::from(1_000), Decimal::from(12));

        assert!(!quote.within_tier);
        assert_eq!(quote.discount_value, Decimal::from(120));
    }

    #[test]
    fn condition_quote_aggregates_methods() {
        let engine = StandardDiscountEngine::default();
        let applied = BTreeMap::from([
            (PaymentMethod::Pix, Decimal::from(8)),
            (PaymentMethod::Credit, Decimal::from(5)),
        ]);

        let quote = engine.quote_condition(&target(), &applied);

        assert_eq!(quote.base_total, Decimal::from(50_000));
        assert_eq!(quote.discount_total, Decimal::from(3_250));
        assert_eq!(quote.overall_percent, Decimal::new(65, 1));
        assert_eq!(quote.partner_reduction_percent, Decimal::new(25, 1));
        assert_eq!(quote.methods.len(), 2);
    }

    #[test]
    fn methods_without_applied_percent_have_no_discount() {
        let engine = StandardDiscountEngine::default();
        let quote = engine.quote_condition(&target(), &BTreeMap::new());

        assert_eq!(quote.discount_total, Decimal::ZERO);
        assert_eq!(quote.partner_reduction_percent, Decimal::ZERO);
    }
}
