use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::client::ClientRef;
use crate::domain::fee::{FeeMode, FeeType};
use crate::domain::payment::PaymentTab;

/// Payment plan of one fee type as it stood when the sale was scheduled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePlanSnapshot {
    pub fee_type: FeeType,
    pub target: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub tabs: Vec<PaymentTab>,
}

/// Finalized sale handed to the host when the contract step is saved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePayload {
    pub session_id: Uuid,
    pub fee_mode: FeeMode,
    pub client: ClientRef,
    pub summary: BTreeMap<u8, String>,
    pub plans: Vec<FeePlanSnapshot>,
    pub scheduled_at: DateTime<Utc>,
}

impl SchedulePayload {
    pub fn plan(&self, fee_type: FeeType) -> Option<&FeePlanSnapshot> {
        self.plans.iter().find(|plan| plan.fee_type == fee_type)
    }
}
