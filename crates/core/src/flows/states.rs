use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::fee::{FeeMode, FeeType};
use crate::flows::engine::FlowTransitionError;

/// Wizard stage. Number 3 is unused; the contract step is numbered 7 for
/// single-fee sales and 8 for dual-fee sales.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Client,
    Product,
    Activity,
    FeeType,
    /// Sole payment step, or the Prolabore one in dual mode.
    Payment,
    /// Êxito payment step; dual mode only.
    ExitoPayment,
    Contract,
}

const SINGLE_SEQUENCE: [Step; 6] =
    [Step::Client, Step::Product, Step::Activity, Step::FeeType, Step::Payment, Step::Contract];

const DUAL_SEQUENCE: [Step; 7] = [
    Step::Client,
    Step::Product,
    Step::Activity,
    Step::FeeType,
    Step::Payment,
    Step::ExitoPayment,
    Step::Contract,
];

impl Step {
    pub fn number(self, mode: FeeMode) -> u8 {
        match self {
            Self::Client => 1,
            Self::Product => 2,
            Self::Activity => 4,
            Self::FeeType => 5,
            Self::Payment => 6,
            Self::ExitoPayment => 7,
            Self::Contract => match mode {
                FeeMode::Single => 7,
                FeeMode::Dual => 8,
            },
        }
    }

    pub fn from_number(number: u8, mode: FeeMode) -> Option<Self> {
        Self::sequence(mode).iter().copied().find(|step| step.number(mode) == number)
    }

    /// Steps visited by a sale in `mode`, in order.
    pub fn sequence(mode: FeeMode) -> &'static [Step] {
        match mode {
            FeeMode::Single => &SINGLE_SEQUENCE,
            FeeMode::Dual => &DUAL_SEQUENCE,
        }
    }

    pub fn exists_in(self, mode: FeeMode) -> bool {
        Self::sequence(mode).contains(&self)
    }

    pub fn label(self, mode: FeeMode) -> &'static str {
        match (self, mode) {
            (Self::Client, _) => "Cliente",
            (Self::Product, _) => "Produto",
            (Self::Activity, _) => "Atividade",
            (Self::FeeType, _) => "Tipo de honorário",
            (Self::Payment, FeeMode::Single) => "Forma de pagamento",
            (Self::Payment, FeeMode::Dual) => "Pagamento Prolabore",
            (Self::ExitoPayment, _) => "Pagamento Êxito",
            (Self::Contract, _) => "Contrato",
        }
    }

    pub fn is_payment(self) -> bool {
        matches!(self, Self::Payment | Self::ExitoPayment)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Where a back/next request leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTarget {
    Step(Step),
    /// Back from the first step: the host closes the wizard.
    CloseWizard,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum IgnoredReason {
    GateClosed,
    BeyondMaxAccessible { requested: u8, max_accessible: u8 },
    UnknownStep { requested: u8 },
    PaymentOutstanding { fee_type: FeeType, remaining: Decimal },
    Transition { detail: String },
}

impl From<FlowTransitionError> for IgnoredReason {
    fn from(error: FlowTransitionError) -> Self {
        Self::Transition { detail: error.to_string() }
    }
}

/// Result of a navigation request. Rejected requests leave the controller
/// untouched and come back as `Ignored`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum NavigationOutcome {
    Moved { from: Step, to: Step, direction: Direction },
    CloseRequested,
    Ignored(IgnoredReason),
}

impl NavigationOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}
