use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::fee::{FeeMode, FeeType};
use crate::domain::payment::{
    due_date_from, AllocationMode, PaymentTab, TabId, TabPatch, FIRST_TAB,
};
use crate::payment::{paid_total, remaining};

pub const DEFAULT_DUE_IN_DAYS: u32 = 30;

/// Payment plan for one fee type: an ordered list of tabs plus the id of the
/// tab the user has selected.
///
/// Tabs added while the sale is single-fee start with `active = false`;
/// on dual-fee sales they start with `active = true`. Because new tabs are in
/// total mode, adding one on a dual-fee sale immediately marks the fee as
/// fully paid. This mirrors what users see today and is kept on purpose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentTabManager {
    fee_type: FeeType,
    tabs: Vec<PaymentTab>,
    active_tab_id: Option<TabId>,
    fee_mode: FeeMode,
    opened_on: NaiveDate,
    due_in_days: u32,
}

impl PaymentTabManager {
    pub fn new(fee_type: FeeType, fee_mode: FeeMode, opened_on: NaiveDate) -> Self {
        Self::with_due_in_days(fee_type, fee_mode, opened_on, DEFAULT_DUE_IN_DAYS)
    }

    pub fn with_due_in_days(
        fee_type: FeeType,
        fee_mode: FeeMode,
        opened_on: NaiveDate,
        due_in_days: u32,
    ) -> Self {
        let first_due = due_date_from(opened_on, due_in_days);
        Self {
            fee_type,
            tabs: vec![PaymentTab::with_defaults(FIRST_TAB, first_due, true)],
            active_tab_id: Some(FIRST_TAB),
            fee_mode,
            opened_on,
            due_in_days,
        }
    }

    pub fn fee_type(&self) -> FeeType {
        self.fee_type
    }

    pub fn fee_mode(&self) -> FeeMode {
        self.fee_mode
    }

    /// Follows the fee-type step; only affects tabs added afterwards.
    pub fn set_fee_mode(&mut self, fee_mode: FeeMode) {
        self.fee_mode = fee_mode;
    }

    pub fn tabs(&self) -> &[PaymentTab] {
        &self.tabs
    }

    pub fn tab(&self, id: TabId) -> Option<&PaymentTab> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.active_tab_id
    }

    pub fn active_tab(&self) -> Option<&PaymentTab> {
        self.active_tab_id.and_then(|id| self.tab(id))
    }

    pub fn add_tab(&mut self) -> TabId {
        let id = if self.tabs.len() == 1 {
            TabId(2)
        } else {
            let max = self.tabs.iter().map(|tab| tab.id.0).max().unwrap_or(0);
            TabId(max + 1)
        };
        let active = matches!(self.fee_mode, FeeMode::Dual);
        self.tabs.push(PaymentTab::with_defaults(id, self.default_due_date(), active));
        self.active_tab_id = Some(id);

        debug!(
            event_name = "payment.tab_added",
            fee_type = %self.fee_type,
            tab_id = id.0,
            active,
            "payment tab added"
        );
        id
    }

    /// Returns false, leaving the selection alone, when `id` is unknown.
    pub fn select_tab(&mut self, id: TabId) -> bool {
        if self.tab(id).is_none() {
            return false;
        }
        self.active_tab_id = Some(id);
        true
    }

    /// Removes the selected tab and returns its id. Tab 1 is never removed.
    pub fn delete_active_tab(&mut self) -> Option<TabId> {
        let removed = self.active_tab_id?;
        if removed == FIRST_TAB {
            return None;
        }
        let before = self.tabs.len();
        self.tabs.retain(|tab| tab.id != removed);
        if self.tabs.len() == before {
            return None;
        }

        let nearest_lower =
            self.tabs.iter().map(|tab| tab.id).filter(|id| *id < removed).max();
        let smallest = self.tabs.iter().map(|tab| tab.id).min();
        self.active_tab_id = match nearest_lower.or(smallest) {
            Some(id) => Some(id),
            None => {
                self.tabs.push(PaymentTab::with_defaults(FIRST_TAB, self.default_due_date(), true));
                Some(FIRST_TAB)
            }
        };

        debug!(
            event_name = "payment.tab_deleted",
            fee_type = %self.fee_type,
            tab_id = removed.0,
            selected = ?self.active_tab_id,
            "payment tab deleted"
        );
        Some(removed)
    }

    /// Resets the selected tab to its defaults without removing it. This is
    /// what the delete action does on tab 1.
    pub fn clear_active_tab(&mut self) -> bool {
        let Some(id) = self.active_tab_id else {
            return false;
        };
        let due = self.default_due_date();
        let active = id == FIRST_TAB || matches!(self.fee_mode, FeeMode::Dual);
        match self.tabs.iter_mut().find(|tab| tab.id == id) {
            Some(tab) => {
                *tab = PaymentTab::with_defaults(id, due, active);
                true
            }
            None => false,
        }
    }

    /// Merges `patch` into the selected tab; false when nothing is selected.
    pub fn update_active_tab(&mut self, patch: TabPatch) -> bool {
        let Some(id) = self.active_tab_id else {
            return false;
        };
        match self.tabs.iter_mut().find(|tab| tab.id == id) {
            Some(tab) => {
                tab.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Going partial clears the typed amount and deactivates the tab until a
    /// positive amount is entered; going total reactivates it.
    pub fn switch_mode(&mut self, mode: AllocationMode) -> bool {
        let Some(current) = self.active_tab().map(|tab| tab.mode) else {
            return false;
        };
        let patch = match (current, mode) {
            (AllocationMode::Total, AllocationMode::Partial) => TabPatch {
                mode: Some(AllocationMode::Partial),
                partial_amount_text: Some(String::new()),
                active: Some(false),
                ..TabPatch::default()
            },
            (AllocationMode::Partial, AllocationMode::Total) => TabPatch {
                mode: Some(AllocationMode::Total),
                active: Some(true),
                ..TabPatch::default()
            },
            _ => return true,
        };
        self.update_active_tab(patch)
    }

    /// The tab counts toward the paid total only while the amount is positive.
    pub fn enter_partial_amount(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let amount = crate::format::parse_pt_number(&text);
        self.update_active_tab(TabPatch {
            partial_amount_text: Some(text),
            active: Some(amount > Decimal::ZERO),
            ..TabPatch::default()
        })
    }

    pub fn paid_total(&self, target: Decimal) -> Decimal {
        paid_total(&self.tabs, target)
    }

    pub fn remaining(&self, target: Decimal) -> Decimal {
        remaining(&self.tabs, target)
    }

    fn default_due_date(&self) -> NaiveDate {
        due_date_from(self.opened_on, self.due_in_days)
    }
}
