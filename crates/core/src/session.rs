//! One sale in progress: the step controller, the summary store and a payment
//! plan per fee type, mutated only through the operations below.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
use crate::config::AppConfig;
use crate::domain::client::ClientRef;
use crate::domain::fee::{FeeMode, FeeTarget, FeeType};
use crate::domain::payment::{AllocationMode, PaymentMethod, TabId, TabPatch};
use crate::domain::sale::{FeePlanSnapshot, SchedulePayload};
use crate::errors::DomainError;
use crate::fee_mode;
use crate::flows::{
    transition, Direction, IgnoredReason, NavigationOutcome, Step, StepController, StepTarget,
};
use crate::format::format_currency;
use crate::payment::tabs::DEFAULT_DUE_IN_DAYS;
use crate::payment::{saturating_sum, PaymentTabManager};
use crate::pricing::discount::DiscountTier;
use crate::pricing::{ConditionQuote, DiscountEngine, MethodQuote, StandardDiscountEngine};
use crate::projection::{project, ProjectionRow};
use crate::summary::SummaryStore;

const ACTOR: &str = "wizard-session";

pub type NextHandler = Box<dyn FnMut(&mut WizardSession)>;
pub type ScheduleHandler = Box<dyn FnMut(&SchedulePayload)>;

/// Fee-type choices offered on the fee-type step, keyed by the id the screen
/// reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgendaType {
    Prolabore,
    Exito,
    ProlaboreExito,
}

impl AgendaType {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim() {
            "prolabore" => Some(Self::Prolabore),
            "success" | "exito" => Some(Self::Exito),
            "prolabore_success" => Some(Self::ProlaboreExito),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Prolabore => "Prolabore",
            Self::Exito => "Êxito",
            Self::ProlaboreExito => "Prolabore + Êxito",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub opened_on: NaiveDate,
    pub due_in_days: u32,
    pub discount_tier: DiscountTier,
}

impl SessionOptions {
    pub fn new(opened_on: NaiveDate) -> Self {
        Self { opened_on, due_in_days: DEFAULT_DUE_IN_DAYS, discount_tier: DiscountTier::default() }
    }

    pub fn from_config(config: &AppConfig, opened_on: NaiveDate) -> Self {
        Self {
            opened_on,
            due_in_days: config.payment.due_in_days,
            discount_tier: config.discount.tier(),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new(Utc::now().date_naive())
    }
}

pub struct WizardSession {
    id: Uuid,
    summary: SummaryStore,
    controller: StepController,
    targets: BTreeMap<FeeType, FeeTarget>,
    prolabore_plan: PaymentTabManager,
    exito_plan: PaymentTabManager,
    discount_engine: StandardDiscountEngine,
    next_handler: Option<NextHandler>,
    schedule_handler: Option<ScheduleHandler>,
    audit: Arc<dyn AuditSink>,
}

impl WizardSession {
    pub fn new(options: SessionOptions) -> Self {
        let mode = FeeMode::Single;
        Self {
            id: Uuid::new_v4(),
            summary: SummaryStore::default(),
            controller: StepController::new(),
            targets: BTreeMap::new(),
            prolabore_plan: PaymentTabManager::with_due_in_days(
                FeeType::Prolabore,
                mode,
                options.opened_on,
                options.due_in_days,
            ),
            exito_plan: PaymentTabManager::with_due_in_days(
                FeeType::Exito,
                mode,
                options.opened_on,
                options.due_in_days,
            ),
            discount_engine: StandardDiscountEngine::new(options.discount_tier),
            next_handler: None,
            schedule_handler: None,
            audit: Arc::new(InMemoryAuditSink::default()),
        }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_step(&self) -> Step {
        self.controller.current_step()
    }

    pub fn current_step_number(&self) -> u8 {
        self.current_step().number(self.fee_mode())
    }

    pub fn direction(&self) -> Direction {
        self.controller.direction()
    }

    pub fn max_accessible_step(&self) -> u8 {
        self.controller.max_accessible_step()
    }

    pub fn can_proceed(&self) -> bool {
        self.controller.can_proceed()
    }

    pub fn summary(&self) -> &SummaryStore {
        &self.summary
    }

    fn fee_type_summary(&self) -> Option<&str> {
        let text = self.summary.get(Step::FeeType.number(FeeMode::Single));
        (!text.is_empty()).then_some(text)
    }

    pub fn fee_mode(&self) -> FeeMode {
        fee_mode::resolve(self.fee_type_summary())
    }

    pub fn primary_fee_type(&self) -> FeeType {
        fee_mode::primary_fee_type(self.fee_type_summary())
    }

    /// Fee type billed on `step`, if it is a payment step of the current mode.
    pub fn fee_type_for_step(&self, step: Step) -> Option<FeeType> {
        match (step, self.fee_mode()) {
            (Step::Payment, FeeMode::Dual) => Some(FeeType::Prolabore),
            (Step::Payment, FeeMode::Single) => Some(self.primary_fee_type()),
            (Step::ExitoPayment, FeeMode::Dual) => Some(FeeType::Exito),
            _ => None,
        }
    }

    pub fn required_fee_types(&self) -> Vec<FeeType> {
        self.fee_mode().required_fee_types(self.primary_fee_type())
    }

    // Host callbacks.

    pub fn on_update_summary(&mut self, step: u8, text: impl Into<String>) {
        let text = text.into();
        self.summary.set(step, text.clone());
        if step == Step::FeeType.number(FeeMode::Single) {
            self.sync_fee_mode();
        }
        self.emit(
            AuditEvent::new(
                self.id,
                "wizard.summary_updated",
                AuditCategory::Summary,
                ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("step", step.to_string())
            .with_metadata("value", text),
        );
    }

    /// Unknown ids are stored verbatim as the fee-type summary.
    pub fn on_select_agenda_type(&mut self, id: &str) {
        let text = AgendaType::from_id(id).map(AgendaType::label).unwrap_or(id).to_string();
        self.on_update_summary(Step::FeeType.number(FeeMode::Single), text);
    }

    pub fn on_can_proceed_change(&mut self, can_proceed: bool) {
        self.controller.set_can_proceed(can_proceed);
    }

    /// The mounted screen's commit routine, run when "Next" is pressed. It is
    /// expected to call [`WizardSession::next`] itself once its data is saved.
    pub fn register_next_handler(&mut self, handler: impl FnMut(&mut WizardSession) + 'static) {
        self.next_handler = Some(Box::new(handler));
    }

    pub fn register_schedule_handler(&mut self, handler: impl FnMut(&SchedulePayload) + 'static) {
        self.schedule_handler = Some(Box::new(handler));
    }

    /// Wizard-level "Next" button. Does nothing while the screen reports it
    /// cannot proceed; otherwise runs the registered handler, or advances
    /// directly when no handler is registered. Returns the step shown after.
    pub fn press_next(&mut self) -> Step {
        if !self.controller.can_proceed() {
            self.record(&NavigationOutcome::Ignored(IgnoredReason::GateClosed));
            return self.current_step();
        }
        match self.next_handler.take() {
            Some(mut handler) => {
                handler(self);
                if self.next_handler.is_none() {
                    self.next_handler = Some(handler);
                }
            }
            None => {
                self.next();
            }
        }
        self.current_step()
    }

    // Navigation.

    pub fn next(&mut self) -> NavigationOutcome {
        let mode = self.fee_mode();
        if self.controller.can_proceed() {
            if let Ok(StepTarget::Step(to)) =
                transition(self.current_step(), mode, Direction::Forward)
            {
                if let Some(reason) = self.payment_block(to, mode) {
                    let outcome = NavigationOutcome::Ignored(reason);
                    self.record(&outcome);
                    return outcome;
                }
            }
        }
        let outcome = self.controller.next(mode);
        self.after_navigation(outcome, mode)
    }

    pub fn back(&mut self) -> NavigationOutcome {
        let mode = self.fee_mode();
        let outcome = self.controller.back(mode);
        self.after_navigation(outcome, mode)
    }

    pub fn jump_to(&mut self, step_number: u8) -> NavigationOutcome {
        let mode = self.fee_mode();
        if step_number <= self.controller.max_accessible_step() {
            if let Some(to) = Step::from_number(step_number, mode) {
                if let Some(reason) = self.payment_block(to, mode) {
                    let outcome = NavigationOutcome::Ignored(reason);
                    self.record(&outcome);
                    return outcome;
                }
            }
        }
        let outcome = self.controller.jump_to(step_number, mode);
        self.after_navigation(outcome, mode)
    }

    /// Every payment step before `to` must be fully paid to reach it.
    fn payment_block(&self, to: Step, mode: FeeMode) -> Option<IgnoredReason> {
        Step::sequence(mode)
            .iter()
            .take_while(|step| **step != to)
            .filter_map(|step| self.fee_type_for_step(*step))
            .find_map(|fee_type| {
                let remaining = self.remaining(fee_type);
                (!remaining.is_zero())
                    .then_some(IgnoredReason::PaymentOutstanding { fee_type, remaining })
            })
    }

    fn after_navigation(&mut self, outcome: NavigationOutcome, mode: FeeMode) -> NavigationOutcome {
        if let NavigationOutcome::Moved { to, .. } = &outcome {
            self.controller.raise_max_accessible(to.number(mode));
        }
        self.record(&outcome);
        outcome
    }

    fn record(&self, outcome: &NavigationOutcome) {
        let event = match outcome {
            NavigationOutcome::Moved { from, to, direction } => AuditEvent::new(
                self.id,
                "wizard.step_moved",
                AuditCategory::Navigation,
                ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("from", format!("{from:?}"))
            .with_metadata("to", format!("{to:?}"))
            .with_metadata("direction", format!("{direction:?}")),
            NavigationOutcome::CloseRequested => AuditEvent::new(
                self.id,
                "wizard.close_requested",
                AuditCategory::Navigation,
                ACTOR,
                AuditOutcome::Success,
            ),
            NavigationOutcome::Ignored(reason) => {
                debug!(
                    event_name = "wizard.step_ignored",
                    session_id = %self.id,
                    reason = ?reason,
                    "navigation ignored by session"
                );
                AuditEvent::new(
                    self.id,
                    "wizard.step_ignored",
                    AuditCategory::Navigation,
                    ACTOR,
                    AuditOutcome::Ignored,
                )
                .with_metadata("reason", format!("{reason:?}"))
            }
        };
        self.emit(event);
    }

    // Payment plans.

    pub fn set_fee_target(&mut self, target: FeeTarget) {
        self.targets.insert(target.fee_type, target);
    }

    pub fn fee_target(&self, fee_type: FeeType) -> Option<&FeeTarget> {
        self.targets.get(&fee_type)
    }

    pub fn target_amount(&self, fee_type: FeeType) -> Decimal {
        self.fee_target(fee_type).map(|target| target.total_amount).unwrap_or(Decimal::ZERO)
    }

    pub fn plan(&self, fee_type: FeeType) -> &PaymentTabManager {
        match fee_type {
            FeeType::Prolabore => &self.prolabore_plan,
            FeeType::Exito => &self.exito_plan,
        }
    }

    fn plan_mut(&mut self, fee_type: FeeType) -> &mut PaymentTabManager {
        match fee_type {
            FeeType::Prolabore => &mut self.prolabore_plan,
            FeeType::Exito => &mut self.exito_plan,
        }
    }

    pub fn add_tab(&mut self, fee_type: FeeType) -> TabId {
        let id = self.plan_mut(fee_type).add_tab();
        self.emit_payment("payment.tab_added", fee_type, id);
        id
    }

    pub fn select_tab(&mut self, fee_type: FeeType, id: TabId) -> bool {
        self.plan_mut(fee_type).select_tab(id)
    }

    pub fn delete_active_tab(&mut self, fee_type: FeeType) -> Option<TabId> {
        let removed = self.plan_mut(fee_type).delete_active_tab();
        if let Some(id) = removed {
            self.emit_payment("payment.tab_deleted", fee_type, id);
        }
        removed
    }

    pub fn clear_active_tab(&mut self, fee_type: FeeType) -> bool {
        self.plan_mut(fee_type).clear_active_tab()
    }

    pub fn update_active_tab(&mut self, fee_type: FeeType, patch: TabPatch) -> bool {
        self.plan_mut(fee_type).update_active_tab(patch)
    }

    pub fn switch_mode(&mut self, fee_type: FeeType, mode: AllocationMode) -> bool {
        self.plan_mut(fee_type).switch_mode(mode)
    }

    pub fn enter_partial_amount(&mut self, fee_type: FeeType, text: impl Into<String>) -> bool {
        self.plan_mut(fee_type).enter_partial_amount(text)
    }

    pub fn paid_total(&self, fee_type: FeeType) -> Decimal {
        self.plan(fee_type).paid_total(self.target_amount(fee_type))
    }

    pub fn remaining(&self, fee_type: FeeType) -> Decimal {
        self.plan(fee_type).remaining(self.target_amount(fee_type))
    }

    pub fn is_settled(&self, fee_type: FeeType) -> bool {
        self.remaining(fee_type).is_zero()
    }

    pub fn payments_settled(&self) -> bool {
        self.required_fee_types().into_iter().all(|fee_type| self.is_settled(fee_type))
    }

    pub fn quote_method(
        &self,
        method: PaymentMethod,
        base: Decimal,
        applied_percent: Decimal,
    ) -> MethodQuote {
        self.discount_engine.quote_method(method, base, applied_percent)
    }

    pub fn quote_condition(
        &self,
        fee_type: FeeType,
        applied: &BTreeMap<PaymentMethod, Decimal>,
    ) -> Option<ConditionQuote> {
        self.fee_target(fee_type).map(|target| self.discount_engine.quote_condition(target, applied))
    }

    fn sync_fee_mode(&mut self) {
        let mode = self.fee_mode();
        self.prolabore_plan.set_fee_mode(mode);
        self.exito_plan.set_fee_mode(mode);
        if let Some(outcome) = self.controller.realign(mode) {
            self.record(&outcome);
        }
    }

    fn emit_payment(&self, event_type: &str, fee_type: FeeType, id: TabId) {
        self.emit(
            AuditEvent::new(self.id, event_type, AuditCategory::Payment, ACTOR, AuditOutcome::Success)
                .with_metadata("fee_type", fee_type.label())
                .with_metadata("tab_id", id.to_string()),
        );
    }

    fn emit(&self, event: AuditEvent) {
        self.audit.emit(event);
    }

    // Projection and commit.

    pub fn projection(&self) -> Vec<ProjectionRow> {
        project(
            self.current_step(),
            self.fee_mode(),
            &self.summary,
            self.controller.max_accessible_step(),
        )
    }

    /// Contract "save": the one commit point of the wizard. Hands the
    /// finalized sale to the schedule handler and returns it.
    pub fn save_contract(&mut self, client: ClientRef) -> Result<SchedulePayload, DomainError> {
        let step = self.current_step();
        if step != Step::Contract {
            self.emit_schedule_rejected("not_on_contract_step");
            return Err(DomainError::InvalidSchedule { step });
        }
        for fee_type in self.required_fee_types() {
            if self.fee_target(fee_type).is_none() {
                self.emit_schedule_rejected("missing_fee_target");
                return Err(DomainError::MissingFeeTarget { fee_type });
            }
            let remaining = self.remaining(fee_type);
            if !remaining.is_zero() {
                self.emit_schedule_rejected("payment_outstanding");
                return Err(DomainError::UnsettledPayment { fee_type, remaining });
            }
        }

        let payload = SchedulePayload {
            session_id: self.id,
            fee_mode: self.fee_mode(),
            client,
            summary: self.summary.snapshot(),
            plans: self
                .required_fee_types()
                .into_iter()
                .map(|fee_type| FeePlanSnapshot {
                    fee_type,
                    target: self.target_amount(fee_type),
                    paid: self.paid_total(fee_type),
                    remaining: self.remaining(fee_type),
                    tabs: self.plan(fee_type).tabs().to_vec(),
                })
                .collect(),
            scheduled_at: Utc::now(),
        };

        if let Some(handler) = self.schedule_handler.as_mut() {
            handler(&payload);
        }

        let total = saturating_sum(payload.plans.iter().map(|plan| plan.target));
        info!(
            event_name = "sale.scheduled",
            session_id = %self.id,
            fee_mode = ?payload.fee_mode,
            client_id = %payload.client.id.0,
            total = %format_currency(total),
            "sale scheduled"
        );
        self.emit(
            AuditEvent::new(
                self.id,
                "sale.scheduled",
                AuditCategory::Schedule,
                ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("fee_mode", format!("{:?}", payload.fee_mode))
            .with_metadata("client_id", payload.client.id.0.clone())
            .with_metadata("total", format_currency(total)),
        );

        Ok(payload)
    }

    fn emit_schedule_rejected(&self, reason: &str) {
        self.emit(
            AuditEvent::new(
                self.id,
                "sale.schedule_rejected",
                AuditCategory::Schedule,
                ACTOR,
                AuditOutcome::Rejected,
            )
            .with_metadata("reason", reason),
        );
    }
}
