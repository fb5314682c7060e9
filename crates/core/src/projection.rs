//! Read-only "full flow" panel: every step of the sale with what was captured
//! so far, and whether it can be jumped to.

use serde::{Deserialize, Serialize};

use crate::domain::fee::FeeMode;
use crate::flows::Step;
use crate::summary::{is_real_value, SummaryStore};

/// Shown instead of a summary the user has not reached yet.
pub const HIDDEN_VALUE: &str = "-----------";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub step: Step,
    pub number: u8,
    pub label: String,
    pub display_value: String,
    pub locked: bool,
    pub current: bool,
}

pub fn project(
    current: Step,
    mode: FeeMode,
    summary: &SummaryStore,
    max_accessible_step: u8,
) -> Vec<ProjectionRow> {
    let max_completed = summary.max_completed_step();

    Step::sequence(mode)
        .iter()
        .map(|step| {
            let number = step.number(mode);
            let value = summary.get(number);
            let is_current = *step == current;
            let revealed = (number <= max_completed || is_current) && is_real_value(value);

            ProjectionRow {
                step: *step,
                number,
                label: step.label(mode).to_string(),
                display_value: if revealed { value.to_string() } else { HIDDEN_VALUE.to_string() },
                locked: number > max_accessible_step,
                current: is_current,
            }
        })
        .collect()
}
