use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Summary text a screen writes when it has nothing to report.
pub const NONE_SENTINEL: &str = "Nenhum";

/// Human readable summary per step number, in step order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStore {
    entries: BTreeMap<u8, String>,
}

impl SummaryStore {
    pub fn set(&mut self, step: u8, value: impl Into<String>) {
        self.entries.insert(step, value.into());
    }

    pub fn get(&self, step: u8) -> &str {
        self.entries.get(&step).map(String::as_str).unwrap_or("")
    }

    pub fn is_completed(&self, step: u8) -> bool {
        is_real_value(self.get(step))
    }

    /// Highest completed step number, `0` when nothing is completed yet.
    pub fn max_completed_step(&self) -> u8 {
        self.entries
            .iter()
            .filter(|(_, value)| is_real_value(value))
            .map(|(step, _)| *step)
            .max()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<u8, String> {
        self.entries.clone()
    }
}

pub(crate) fn is_real_value(value: &str) -> bool {
    !value.is_empty() && value != NONE_SENTINEL
}
