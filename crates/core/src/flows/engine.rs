use thiserror::Error;
use tracing::debug;

use crate::domain::fee::FeeMode;
use crate::flows::states::{Direction, IgnoredReason, NavigationOutcome, Step, StepTarget};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("step {step:?} is not part of a {mode:?} sale")]
    StepNotInMode { step: Step, mode: FeeMode },
    #[error("no step follows {step:?}; the contract save finishes the wizard")]
    NoForwardStep { step: Step },
}

/// Pure transition table: `(step, mode, direction) -> target`.
pub fn transition(
    current: Step,
    mode: FeeMode,
    direction: Direction,
) -> Result<StepTarget, FlowTransitionError> {
    use Direction::{Backward, Forward};
    use FeeMode::{Dual, Single};
    use Step::{Activity, Client, Contract, ExitoPayment, FeeType, Payment, Product};

    let to = match (current, direction, mode) {
        (ExitoPayment, _, Single) => {
            return Err(FlowTransitionError::StepNotInMode { step: current, mode });
        }

        (Client, Forward, _) => Product,
        (Product, Forward, _) => Activity,
        (Activity, Forward, _) => FeeType,
        (FeeType, Forward, _) => Payment,
        (Payment, Forward, Single) => Contract,
        (Payment, Forward, Dual) => ExitoPayment,
        (ExitoPayment, Forward, Dual) => Contract,
        (Contract, Forward, _) => {
            return Err(FlowTransitionError::NoForwardStep { step: current });
        }

        (Client, Backward, _) => return Ok(StepTarget::CloseWizard),
        (Product, Backward, _) => Client,
        (Activity, Backward, _) => Product,
        (FeeType, Backward, _) => Activity,
        (Payment, Backward, _) => FeeType,
        (ExitoPayment, Backward, Dual) => Payment,
        (Contract, Backward, Single) => Payment,
        (Contract, Backward, Dual) => ExitoPayment,
    };

    Ok(StepTarget::Step(to))
}

/// Owns the current step and decides whether a navigation request may
/// commit. Screen validity is reported by the host through `set_can_proceed`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepController {
    current: Step,
    direction: Direction,
    max_accessible_step: u8,
    can_proceed: bool,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            current: Step::Client,
            direction: Direction::Forward,
            max_accessible_step: 1,
            can_proceed: false,
        }
    }
}

impl StepController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> Step {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn max_accessible_step(&self) -> u8 {
        self.max_accessible_step
    }

    pub fn can_proceed(&self) -> bool {
        self.can_proceed
    }

    pub fn set_can_proceed(&mut self, can_proceed: bool) {
        self.can_proceed = can_proceed;
    }

    /// Never lowers the bound.
    pub fn raise_max_accessible(&mut self, step_number: u8) {
        self.max_accessible_step = self.max_accessible_step.max(step_number);
    }

    pub fn next(&mut self, mode: FeeMode) -> NavigationOutcome {
        if !self.can_proceed {
            return self.ignore(IgnoredReason::GateClosed);
        }
        match transition(self.current, mode, Direction::Forward) {
            Ok(StepTarget::Step(to)) => self.commit(to, Direction::Forward),
            Ok(StepTarget::CloseWizard) => NavigationOutcome::CloseRequested,
            Err(error) => self.ignore(error.into()),
        }
    }

    pub fn back(&mut self, mode: FeeMode) -> NavigationOutcome {
        match transition(self.current, mode, Direction::Backward) {
            Ok(StepTarget::Step(to)) => self.commit(to, Direction::Backward),
            Ok(StepTarget::CloseWizard) => {
                debug!(
                    event_name = "wizard.close_requested",
                    step = ?self.current,
                    "back pressed on first step"
                );
                NavigationOutcome::CloseRequested
            }
            Err(error) => self.ignore(error.into()),
        }
    }

    /// Jump from the full-flow panel; allowed only up to the highest step
    /// reached so far.
    pub fn jump_to(&mut self, step_number: u8, mode: FeeMode) -> NavigationOutcome {
        if step_number > self.max_accessible_step {
            return self.ignore(IgnoredReason::BeyondMaxAccessible {
                requested: step_number,
                max_accessible: self.max_accessible_step,
            });
        }
        let Some(to) = Step::from_number(step_number, mode) else {
            return self.ignore(IgnoredReason::UnknownStep { requested: step_number });
        };
        let direction = if step_number >= self.current.number(mode) {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.commit(to, direction)
    }

    /// Leaves a step that `mode` no longer has. Only the Êxito payment step
    /// can vanish (Dual to Single), and it falls back to the payment step.
    pub fn realign(&mut self, mode: FeeMode) -> Option<NavigationOutcome> {
        if self.current.exists_in(mode) {
            return None;
        }
        Some(self.commit(Step::Payment, Direction::Backward))
    }

    fn commit(&mut self, to: Step, direction: Direction) -> NavigationOutcome {
        let from = self.current;
        self.current = to;
        self.direction = direction;
        debug!(
            event_name = "wizard.step_moved",
            from = ?from,
            to = ?to,
            direction = ?direction,
            "wizard step changed"
        );
        NavigationOutcome::Moved { from, to, direction }
    }

    fn ignore(&self, reason: IgnoredReason) -> NavigationOutcome {
        debug!(
            event_name = "wizard.navigation_ignored",
            step = ?self.current,
            reason = ?reason,
            "navigation request ignored"
        );
        NavigationOutcome::Ignored(reason)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::fee::FeeMode;
    use crate::flows::engine::{transition, FlowTransitionError, StepController};
    use crate::flows::states::{Direction, IgnoredReason, NavigationOutcome, Step, StepTarget};

    fn forward(step: Step, mode: FeeMode) -> Result<StepTarget, FlowTransitionError> {
        transition(step, mode, Direction::Forward)
    }

    fn backward(step: Step, mode: FeeMode) -> Result<StepTarget, FlowTransitionError> {
        transition(step, mode, Direction::Backward)
    }

    #[test]
    fn forward_table_single_mode() {
        let mode = FeeMode::Single;
        assert_eq!(forward(Step::Client, mode), Ok(StepTarget::Step(Step::Product)));
        assert_eq!(forward(Step::Product, mode), Ok(StepTarget::Step(Step::Activity)));
        assert_eq!(forward(Step::Activity, mode), Ok(StepTarget::Step(Step::FeeType)));
        assert_eq!(forward(Step::FeeType, mode), Ok(StepTarget::Step(Step::Payment)));
        assert_eq!(forward(Step::Payment, mode), Ok(StepTarget::Step(Step::Contract)));
        assert_eq!(
            forward(Step::ExitoPayment, mode),
            Err(FlowTransitionError::StepNotInMode { step: Step::ExitoPayment, mode })
        );
        assert_eq!(
            forward(Step::Contract, mode),
            Err(FlowTransitionError::NoForwardStep { step: Step::Contract })
        );
    }

    #[test]
    fn forward_table_dual_mode() {
        let mode = FeeMode::Dual;
        assert_eq!(forward(Step::Client, mode), Ok(StepTarget::Step(Step::Product)));
        assert_eq!(forward(Step::Product, mode), Ok(StepTarget::Step(Step::Activity)));
        assert_eq!(forward(Step::Activity, mode), Ok(StepTarget::Step(Step::FeeType)));
        assert_eq!(forward(Step::FeeType, mode), Ok(StepTarget::Step(Step::Payment)));
        assert_eq!(forward(Step::Payment, mode), Ok(StepTarget::Step(Step::ExitoPayment)));
        assert_eq!(forward(Step::ExitoPayment, mode), Ok(StepTarget::Step(Step::Contract)));
        assert!(forward(Step::Contract, mode).is_err());
    }

    #[test]
    fn backward_table_single_mode() {
        let mode = FeeMode::Single;
        assert_eq!(backward(Step::Client, mode), Ok(StepTarget::CloseWizard));
        assert_eq!(backward(Step::Product, mode), Ok(StepTarget::Step(Step::Client)));
        assert_eq!(backward(Step::Activity, mode), Ok(StepTarget::Step(Step::Product)));
        assert_eq!(backward(Step::FeeType, mode), Ok(StepTarget::Step(Step::Activity)));
        assert_eq!(backward(Step::Payment, mode), Ok(StepTarget::Step(Step::FeeType)));
        assert_eq!(backward(Step::Contract, mode), Ok(StepTarget::Step(Step::Payment)));
        assert!(backward(Step::ExitoPayment, mode).is_err());
    }

    #[test]
    fn backward_table_dual_mode() {
        let mode = FeeMode::Dual;
        assert_eq!(backward(Step::Client, mode), Ok(StepTarget::CloseWizard));
        assert_eq!(backward(Step::Payment, mode), Ok(StepTarget::Step(Step::FeeType)));
        assert_eq!(backward(Step::ExitoPayment, mode), Ok(StepTarget::Step(Step::Payment)));
        assert_eq!(backward(Step::Contract, mode), Ok(StepTarget::Step(Step::ExitoPayment)));
    }

    #[test]
    fn backward_mirrors_forward_for_every_mode() {
        for mode in [FeeMode::Single, FeeMode::Dual] {
            for step in Step::sequence(mode) {
                if let Ok(StepTarget::Step(next)) = forward(*step, mode) {
                    assert_eq!(backward(next, mode), Ok(StepTarget::Step(*step)), "{mode:?}");
                }
            }
        }
    }

    #[test]
    fn initial_state_is_first_step() {
        let controller = StepController::new();
        assert_eq!(controller.current_step(), Step::Client);
        assert_eq!(controller.max_accessible_step(), 1);
        assert_eq!(controller.direction(), Direction::Forward);
    }

    #[test]
    fn next_with_closed_gate_is_a_no_op() {
        let mut controller = StepController::new();
        let before = controller.clone();

        let outcome = controller.next(FeeMode::Single);

        assert_eq!(outcome, NavigationOutcome::Ignored(IgnoredReason::GateClosed));
        assert_eq!(controller, before);
    }

    #[test]
    fn next_from_payment_branches_on_mode() {
        let mut single = StepController::new();
        single.set_can_proceed(true);
        for _ in 0..4 {
            assert!(single.next(FeeMode::Single).moved());
        }
        assert_eq!(single.current_step(), Step::Payment);
        single.next(FeeMode::Single);
        assert_eq!(single.current_step(), Step::Contract);
        single.back(FeeMode::Single);
        assert_eq!(single.current_step(), Step::Payment);

        let mut dual = StepController::new();
        dual.set_can_proceed(true);
        for _ in 0..5 {
            dual.next(FeeMode::Dual);
        }
        assert_eq!(dual.current_step(), Step::ExitoPayment);
        dual.next(FeeMode::Dual);
        assert_eq!(dual.current_step(), Step::Contract);
        dual.back(FeeMode::Dual);
        assert_eq!(dual.current_step(), Step::ExitoPayment);
        assert_eq!(dual.direction(), Direction::Backward);
    }

    #[test]
    fn back_from_first_step_requests_close_without_moving() {
        let mut controller = StepController::new();
        assert_eq!(controller.back(FeeMode::Dual), NavigationOutcome::CloseRequested);
        assert_eq!(controller.current_step(), Step::Client);
    }

    #[test]
    fn next_from_contract_is_ignored() {
        let mut controller = StepController::new();
        controller.set_can_proceed(true);
        for _ in 0..5 {
            controller.next(FeeMode::Single);
        }
        assert_eq!(controller.current_step(), Step::Contract);

        let outcome = controller.next(FeeMode::Single);
        assert!(matches!(outcome, NavigationOutcome::Ignored(IgnoredReason::Transition { .. })));
        assert_eq!(controller.current_step(), Step::Contract);
    }

    #[test]
    fn jump_is_bounded_by_max_accessible() {
        let mut controller = StepController::new();
        let outcome = controller.jump_to(4, FeeMode::Single);
        assert_eq!(
            outcome,
            NavigationOutcome::Ignored(IgnoredReason::BeyondMaxAccessible {
                requested: 4,
                max_accessible: 1
            })
        );
        assert_eq!(controller.current_step(), Step::Client);

        controller.raise_max_accessible(5);
        let outcome = controller.jump_to(4, FeeMode::Single);
        assert_eq!(
            outcome,
            NavigationOutcome::Moved {
                from: Step::Client,
                to: Step::Activity,
                direction: Direction::Forward
            }
        );
        controller.jump_to(2, FeeMode::Single);
        assert_eq!(controller.direction(), Direction::Backward);
    }

    #[test]
    fn jump_to_unused_step_is_ignored() {
        let mut controller = StepController::new();
        controller.raise_max_accessible(5);
        assert_eq!(
            controller.jump_to(3, FeeMode::Dual),
            NavigationOutcome::Ignored(IgnoredReason::UnknownStep { requested: 3 })
        );
    }

    #[test]
    fn max_accessible_never_decreases() {
        let mut controller = StepController::new();
        controller.raise_max_accessible(6);
        controller.raise_max_accessible(2);
        assert_eq!(controller.max_accessible_step(), 6);
    }

    #[test]
    fn realign_leaves_exito_step_when_sale_turns_single() {
        let mut controller = StepController::new();
        controller.set_can_proceed(true);
        for _ in 0..5 {
            controller.next(FeeMode::Dual);
        }
        assert_eq!(controller.current_step(), Step::ExitoPayment);

        assert_eq!(controller.realign(FeeMode::Dual), None);
        assert_eq!(
            controller.realign(FeeMode::Single),
            Some(NavigationOutcome::Moved {
                from: Step::ExitoPayment,
                to: Step::Payment,
                direction: Direction::Backward,
            })
        );
        assert_eq!(controller.current_step(), Step::Payment);
        assert!(controller.back(FeeMode::Single).moved());
        assert_eq!(controller.current_step(), Step::FeeType);
    }
}
