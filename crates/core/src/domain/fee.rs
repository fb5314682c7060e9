use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::payment::PaymentMethod;
use crate::payment::saturating_sum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    Prolabore,
    Exito,
}

impl FeeType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Prolabore => "Prolabore",
            Self::Exito => "Êxito",
        }
    }
}

impl std::fmt::Display for FeeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the sale bills one fee type or both Prolabore and Êxito, each with
/// its own payment step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeMode {
    #[default]
    Single,
    Dual,
}

impl FeeMode {
    /// Fee types that must be fully paid before the sale can be scheduled.
    pub fn required_fee_types(self, primary: FeeType) -> Vec<FeeType> {
        match self {
            Self::Single => vec![primary],
            Self::Dual => vec![FeeType::Prolabore, FeeType::Exito],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTarget {
    pub fee_type: FeeType,
    pub total_amount: Decimal,
    /// Reference allocation per method; percent discounts are applied on these.
    pub base_by_method: BTreeMap<PaymentMethod, Decimal>,
}

impl FeeTarget {
    pub fn new(fee_type: FeeType, total_amount: Decimal) -> Self {
        Self { fee_type, total_amount, base_by_method: BTreeMap::new() }
    }

    pub fn with_base(mut self, method: PaymentMethod, amount: Decimal) -> Self {
        self.base_by_method.insert(method, amount);
        self
    }

    pub fn base_for(&self, method: PaymentMethod) -> Decimal {
        self.base_by_method.get(&method).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn allocated_base(&self) -> Decimal {
        saturating_sum(self.base_by_method.values().copied())
    }

    /// True when the per-method bases add up to the fee total.
    pub fn is_fully_allocated(&self) -> bool {
        self.allocated_base() == self.total_amount
    }
}
