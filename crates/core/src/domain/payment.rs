use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::format::parse_pt_number;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TabId(pub u32);

/// The tab that exists from the start and can never be removed.
pub const FIRST_TAB: TabId = TabId(1);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    Credit,
    Boleto,
    Ted,
    Doc,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] =
        [Self::Pix, Self::Credit, Self::Boleto, Self::Ted, Self::Doc];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pix => "Pix",
            Self::Credit => "Cartão de crédito",
            Self::Boleto => "Boleto",
            Self::Ted => "TED",
            Self::Doc => "DOC",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pix" => Ok(Self::Pix),
            "credit" | "credito" | "cartao" => Ok(Self::Credit),
            "boleto" => Ok(Self::Boleto),
            "ted" => Ok(Self::Ted),
            "doc" => Ok(Self::Doc),
            other => Err(format!(
                "unsupported payment method `{other}` (expected pix|credit|boleto|ted|doc)"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Covers whatever is left of the fee.
    Total,
    /// Covers the typed `partial_amount_text`.
    Partial,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTab {
    pub id: TabId,
    pub method: PaymentMethod,
    pub mode: AllocationMode,
    pub partial_amount_text: String,
    pub installments: u32,
    pub first_due_date: NaiveDate,
    /// Only active tabs count toward the paid total.
    pub active: bool,
}

impl PaymentTab {
    pub fn with_defaults(id: TabId, first_due_date: NaiveDate, active: bool) -> Self {
        Self {
            id,
            method: PaymentMethod::Pix,
            mode: AllocationMode::Total,
            partial_amount_text: String::new(),
            installments: 1,
            first_due_date,
            active,
        }
    }

    pub fn partial_amount(&self) -> Decimal {
        parse_pt_number(&self.partial_amount_text)
    }

    pub fn covers_everything(&self) -> bool {
        self.active && self.mode == AllocationMode::Total
    }

    pub fn apply(&mut self, patch: TabPatch) {
        if let Some(method) = patch.method {
            self.method = method;
        }
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(text) = patch.partial_amount_text {
            self.partial_amount_text = text;
        }
        if let Some(installments) = patch.installments {
            self.installments = installments.max(1);
        }
        if let Some(first_due_date) = patch.first_due_date {
            self.first_due_date = first_due_date;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}

/// Field-wise update for the selected tab; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabPatch {
    pub method: Option<PaymentMethod>,
    pub mode: Option<AllocationMode>,
    pub partial_amount_text: Option<String>,
    pub installments: Option<u32>,
    pub first_due_date: Option<NaiveDate>,
    pub active: Option<bool>,
}

pub fn due_date_from(opened_on: NaiveDate, due_in_days: u32) -> NaiveDate {
    opened_on.checked_add_days(Days::new(u64::from(due_in_days))).unwrap_or(opened_on)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{due_date_from, AllocationMode, PaymentMethod, PaymentTab, TabId, TabPatch};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn defaults_to_single_pix_installment_paying_everything() {
        let tab = PaymentTab::with_defaults(TabId(1), day(2026, 2, 1), true);
        assert_eq!(tab.method, PaymentMethod::Pix);
        assert_eq!(tab.mode, AllocationMode::Total);
        assert_eq!(tab.installments, 1);
        assert!(tab.covers_everything());
    }

    #[test]
    fn patch_keeps_installments_positive() {
        let mut tab = PaymentTab::with_defaults(TabId(2), day(2026, 2, 1), false);
        tab.apply(TabPatch {
            method: Some(PaymentMethod::Boleto),
            installments: Some(0),
            partial_amount_text: Some("1.500,00".to_string()),
            ..TabPatch::default()
        });

        assert_eq!(tab.method, PaymentMethod::Boleto);
        assert_eq!(tab.installments, 1);
        assert_eq!(tab.partial_amount(), Decimal::from(1_500));
    }

    #[test]
    fn due_date_rolls_over_month_end() {
        assert_eq!(due_date_from(day(2026, 1, 15), 30), day(2026, 2, 14));
    }

    #[test]
    fn method_parses_common_aliases() {
        assert_eq!("PIX".parse::<PaymentMethod>(), Ok(PaymentMethod::Pix));
        assert_eq!("credito".parse::<PaymentMethod>(), Ok(PaymentMethod::Credit));
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
