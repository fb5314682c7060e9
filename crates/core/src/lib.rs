pub mod audit;
pub mod config;
pub mod debounce;
pub mod domain;
pub mod errors;
pub mod fee_mode;
pub mod flows;
pub mod format;
pub mod payment;
pub mod pricing;
pub mod projection;
pub mod session;
pub mod summary;

pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink};
pub use debounce::SettleDebounce;
pub use domain::client::{ClientId, ClientRef};
pub use domain::fee::{FeeMode, FeeTarget, FeeType};
pub use domain::payment::{AllocationMode, PaymentMethod, PaymentTab, TabId, TabPatch};
pub use domain::sale::{FeePlanSnapshot, SchedulePayload};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{Direction, IgnoredReason, NavigationOutcome, Step, StepController};
pub use payment::PaymentTabManager;
pub use pricing::{ConditionQuote, DiscountEngine, MethodQuote, StandardDiscountEngine};
pub use projection::ProjectionRow;
pub use session::{AgendaType, SessionOptions, WizardSession};
pub use summary::SummaryStore;
