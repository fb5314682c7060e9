pub mod engine;
pub mod states;

pub use engine::{transition, FlowTransitionError, StepController};
pub use states::{Direction, IgnoredReason, NavigationOutcome, Step, StepTarget};
