//! Replays a scripted sale against a fresh wizard session and reports where
//! it ended up. Scripts are TOML:
//!
//! ```toml
//! opened_on = "2026-01-10"
//! client = { id = "c-1", name = "Maria Souza" }
//!
//! [[targets]]
//! fee_type = "prolabore"
//! total = "50.000,00"
//! bases = { pix = "25000", credit = "25000" }
//!
//! [[actions]]
//! action = "can_proceed"
//! value = true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use saleflow_core::config::AppConfig;
use saleflow_core::format::{format_currency, parse_pt_number};
use saleflow_core::{
    AllocationMode, ApplicationError, ClientRef, DomainError, FeeTarget, FeeType,
    InMemoryAuditSink, PaymentMethod, SchedulePayload, SessionOptions, TabId, TabPatch,
    WizardSession,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::CommandResult;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationScript {
    pub opened_on: Option<String>,
    pub client: ScriptClient,
    #[serde(default)]
    pub targets: Vec<ScriptTarget>,
    #[serde(default)]
    pub actions: Vec<ScriptAction>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptClient {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptTarget {
    pub fee_type: FeeType,
    pub total: String,
    #[serde(default)]
    pub bases: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    CanProceed { value: bool },
    Summary { step: u8, text: String },
    AgendaType { id: String },
    Next,
    PressNext,
    Back,
    Jump { step: u8 },
    AddTab { fee_type: FeeType },
    SelectTab { fee_type: FeeType, tab: u32 },
    DeleteTab { fee_type: FeeType },
    ClearTab { fee_type: FeeType },
    UpdateTab { fee_type: FeeType, method: Option<PaymentMethod>, installments: Option<u32> },
    SwitchMode { fee_type: FeeType, mode: AllocationMode },
    PartialAmount { fee_type: FeeType, text: String },
    Save,
}

impl ScriptAction {
    fn name(&self) -> &'static str {
        match self {
            Self::CanProceed { .. } => "can_proceed",
            Self::Summary { .. } => "summary",
            Self::AgendaType { .. } => "agenda_type",
            Self::Next => "next",
            Self::PressNext => "press_next",
            Self::Back => "back",
            Self::Jump { .. } => "jump",
            Self::AddTab { .. } => "add_tab",
            Self::SelectTab { .. } => "select_tab",
            Self::DeleteTab { .. } => "delete_tab",
            Self::ClearTab { .. } => "clear_tab",
            Self::UpdateTab { .. } => "update_tab",
            Self::SwitchMode { .. } => "switch_mode",
            Self::PartialAmount { .. } => "partial_amount",
            Self::Save => "save",
        }
    }
}

#[derive(Debug, Serialize)]
struct ActionRecord {
    index: usize,
    action: &'static str,
    step: u8,
    outcome: Value,
}

pub fn run(config: &AppConfig, script_path: &Path) -> CommandResult {
    let script = match load_script(script_path) {
        Ok(script) => script,
        Err(error) => {
            return CommandResult::failure("simulate", "script_invalid", format!("{error:#}"), 2)
        }
    };

    match execute(config, &script) {
        Ok(result) => result,
        Err(error) => CommandResult::failure("simulate", "script_invalid", format!("{error:#}"), 2),
    }
}

pub fn load_script(path: &Path) -> Result<SimulationScript> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read script `{}`", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("could not parse script `{}`", path.display()))
}

/// Script problems are errors; a rejected save is a command failure that
/// still carries the report.
pub fn execute(config: &AppConfig, script: &SimulationScript) -> Result<CommandResult> {
    let opened_on = match script.opened_on.as_deref() {
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid opened_on `{text}` (expected YYYY-MM-DD)"))?,
        None => Utc::now().date_naive(),
    };

    let sink = InMemoryAuditSink::default();
    let mut session = WizardSession::new(SessionOptions::from_config(config, opened_on))
        .with_audit_sink(Arc::new(sink.clone()));
    for target in &script.targets {
        session.set_fee_target(build_target(target)?);
    }

    let client = ClientRef::new(script.client.id.clone(), script.client.name.clone());
    tracing::info!(
        event_name = "cli.simulate.started",
        session_id = %session.id(),
        actions = script.actions.len(),
        "simulation started"
    );

    let mut records = Vec::with_capacity(script.actions.len());
    let mut scheduled = None;
    for (index, action) in script.actions.iter().enumerate() {
        let outcome = match apply(&mut session, &client, action)? {
            Applied::Done(outcome) => outcome,
            Applied::Scheduled(payload) => {
                scheduled = Some(payload);
                json!({ "scheduled": true })
            }
            Applied::Rejected(error) => {
                let detail = error.to_string();
                let interface =
                    ApplicationError::from(error).into_interface(session.id().to_string());
                records.push(ActionRecord {
                    index,
                    action: action.name(),
                    step: session.current_step_number(),
                    outcome: json!({ "scheduled": false, "error": detail }),
                });
                tracing::warn!(
                    event_name = "cli.simulate.schedule_rejected",
                    session_id = %session.id(),
                    error = %detail,
                    "simulation save rejected"
                );
                return Ok(CommandResult::failure_with_report(
                    "simulate",
                    "schedule_rejected",
                    format!("{} ({detail})", interface.user_message()),
                    3,
                    Some(report(&session, &records, scheduled.as_ref(), &sink)),
                ));
            }
        };
        records.push(ActionRecord {
            index,
            action: action.name(),
            step: session.current_step_number(),
            outcome,
        });
    }

    tracing::info!(
        event_name = "cli.simulate.finished",
        session_id = %session.id(),
        step = session.current_step_number(),
        scheduled = scheduled.is_some(),
        "simulation finished"
    );

    let message = match &scheduled {
        Some(_) => "sale scheduled".to_string(),
        None => format!("stopped on step {}", session.current_step().label(session.fee_mode())),
    };
    Ok(CommandResult::success_with_report(
        "simulate",
        message,
        Some(report(&session, &records, scheduled.as_ref(), &sink)),
    ))
}

fn build_target(target: &ScriptTarget) -> Result<FeeTarget> {
    let mut fee_target = FeeTarget::new(target.fee_type, parse_pt_number(&target.total));
    for (method, amount) in &target.bases {
        let method = method.parse::<PaymentMethod>().map_err(|error| anyhow!(error))?;
        fee_target = fee_target.with_base(method, parse_pt_number(amount));
    }
    Ok(fee_target)
}

/// What one script action did to the session.
enum Applied {
    Done(Value),
    Scheduled(SchedulePayload),
    Rejected(DomainError),
}

fn apply(
    session: &mut WizardSession,
    client: &ClientRef,
    action: &ScriptAction,
) -> Result<Applied> {
    let outcome = match action {
        ScriptAction::CanProceed { value } => {
            session.on_can_proceed_change(*value);
            json!({ "can_proceed": value })
        }
        ScriptAction::Summary { step, text } => {
            session.on_update_summary(*step, text.clone());
            json!({ "summary": session.summary().get(*step) })
        }
        ScriptAction::AgendaType { id } => {
            session.on_select_agenda_type(id);
            json!({ "fee_mode": session.fee_mode() })
        }
        ScriptAction::Next => serde_json::to_value(session.next())?,
        ScriptAction::PressNext => json!({ "step": session.press_next() }),
        ScriptAction::Back => serde_json::to_value(session.back())?,
        ScriptAction::Jump { step } => serde_json::to_value(session.jump_to(*step))?,
        ScriptAction::AddTab { fee_type } => json!({ "tab": session.add_tab(*fee_type) }),
        ScriptAction::SelectTab { fee_type, tab } => {
            json!({ "changed": session.select_tab(*fee_type, TabId(*tab)) })
        }
        ScriptAction::DeleteTab { fee_type } => {
            json!({ "deleted": session.delete_active_tab(*fee_type) })
        }
        ScriptAction::ClearTab { fee_type } => {
            json!({ "changed": session.clear_active_tab(*fee_type) })
        }
        ScriptAction::UpdateTab { fee_type, method, installments } => {
            let patch = TabPatch { method: *method, installments: *installments, ..TabPatch::default() };
            json!({ "changed": session.update_active_tab(*fee_type, patch) })
        }
        ScriptAction::SwitchMode { fee_type, mode } => {
            session.switch_mode(*fee_type, *mode);
            json!({ "remaining": format_currency(session.remaining(*fee_type)) })
        }
        ScriptAction::PartialAmount { fee_type, text } => {
            session.enter_partial_amount(*fee_type, text.clone());
            json!({ "remaining": format_currency(session.remaining(*fee_type)) })
        }
        ScriptAction::Save => {
            return Ok(match session.save_contract(client.clone()) {
                Ok(payload) => Applied::Scheduled(payload),
                Err(error) => Applied::Rejected(error),
            });
        }
    };
    Ok(Applied::Done(outcome))
}

fn report(
    session: &WizardSession,
    records: &[ActionRecord],
    scheduled: Option<&SchedulePayload>,
    sink: &InMemoryAuditSink,
) -> Value {
    let plans: Vec<Value> = session
        .required_fee_types()
        .into_iter()
        .map(|fee_type| {
            json!({
                "fee_type": fee_type,
                "target": format_currency(session.target_amount(fee_type)),
                "paid": format_currency(session.paid_total(fee_type)),
                "remaining": format_currency(session.remaining(fee_type)),
                "tabs": session.plan(fee_type).tabs(),
            })
        })
        .collect();

    json!({
        "session_id": session.id(),
        "current_step": session.current_step_number(),
        "current_label": session.current_step().label(session.fee_mode()),
        "fee_mode": session.fee_mode(),
        "max_accessible_step": session.max_accessible_step(),
        "plans": plans,
        "projection": session.projection(),
        "actions": records,
        "scheduled": scheduled,
        "audit_events": sink.event_types(),
    })
}
